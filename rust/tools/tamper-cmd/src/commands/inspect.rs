//! Inspect command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::fs;
use tamper::{DecodedColumn, Document, ExistenceBlock, PackLayout};

use crate::{commands::pack::GUID_FIELD, utils};

#[derive(Serialize)]
struct InspectSummary {
    version: String,
    row_count: usize,
    existence: ExistenceInfo,
    attributes: Vec<AttributeInfo>,
}

#[derive(Serialize)]
struct ExistenceInfo {
    bitmap_blocks: usize,
    skip_blocks: usize,
    run_blocks: usize,
    pack_size: String,
}

#[derive(Serialize)]
struct AttributeInfo {
    name: String,
    encoding: &'static str,
    item_window_width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    possibility_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_choices: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    precision: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delta: Option<i64>,
    /// Rows holding a value for the attribute.
    present_count: usize,
    pack_size: String,
}

pub fn run(document_path: String, rows: bool) -> Result<()> {
    utils::validate_file_exists(&document_path)
        .with_context(|| format!("Invalid document file: {document_path}"))?;
    let document = load_document(&document_path)?;

    let output = if rows {
        serde_json::to_string_pretty(&decode_rows(&document)?)
    } else {
        serde_json::to_string_pretty(&summarize(&document)?)
    }
    .context("Failed to serialize output")?;
    println!("{output}");
    Ok(())
}

fn load_document(path: &str) -> Result<Document> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    Document::from_json(&json).with_context(|| format!("Failed to parse document {path}"))
}

fn summarize(document: &Document) -> Result<InspectSummary> {
    let blocks = document
        .existence
        .blocks()
        .context("Failed to decode existence pack")?;
    let row_count = document.decode_guids()?.len();
    let mut existence = ExistenceInfo {
        bitmap_blocks: 0,
        skip_blocks: 0,
        run_blocks: 0,
        pack_size: utils::format_size(ExistenceBlock::write_all(&blocks)?.len() as u64),
    };
    for block in &blocks {
        match block {
            ExistenceBlock::Bitmap(_) => existence.bitmap_blocks += 1,
            ExistenceBlock::Skip(_) => existence.skip_blocks += 1,
            ExistenceBlock::Run(_) => existence.run_blocks += 1,
        }
    }

    let attributes = document
        .attributes
        .iter()
        .map(|attribute| {
            let column = attribute
                .decode(row_count)
                .with_context(|| format!("Failed to decode attribute '{}'", attribute.attr_name))?;
            let present_count = match &column {
                DecodedColumn::Tags(values) => values.iter().filter(|v| !v.is_empty()).count(),
                DecodedColumn::Numeric(values) => values.iter().filter(|v| v.is_some()).count(),
            };
            let (possibility_count, max_choices, precision, delta) = match &attribute.layout {
                PackLayout::Bitmap(layout) | PackLayout::Integer(layout) => (
                    Some(layout.possibilities.len()),
                    Some(layout.max_choices),
                    None,
                    None,
                ),
                PackLayout::Numeric(layout) => {
                    (None, None, Some(layout.precision), Some(layout.delta))
                }
            };
            Ok(AttributeInfo {
                name: attribute.attr_name.clone(),
                encoding: attribute.encoding().as_str(),
                item_window_width: attribute.layout.item_window_width(),
                possibility_count,
                max_choices,
                precision,
                delta,
                present_count,
                pack_size: utils::format_size(attribute.pack_bytes()?.len() as u64),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(InspectSummary {
        version: document.version.clone(),
        row_count,
        existence,
        attributes,
    })
}

/// Rebuilds the row objects. Attributes a row lacks are omitted.
fn decode_rows(document: &Document) -> Result<Vec<Map<String, JsonValue>>> {
    let guids = document.decode_guids()?;
    let mut rows = guids
        .iter()
        .map(|&guid| {
            let mut row = Map::new();
            row.insert(GUID_FIELD.to_string(), guid.into());
            row
        })
        .collect::<Vec<_>>();

    for attribute in &document.attributes {
        let name = &attribute.attr_name;
        match attribute.decode(guids.len())? {
            DecodedColumn::Tags(values) => {
                for (row, choices) in rows.iter_mut().zip(values) {
                    if !choices.is_empty() {
                        row.insert(name.clone(), choices.into());
                    }
                }
            }
            DecodedColumn::Numeric(values) => {
                for (row, value) in rows.iter_mut().zip(values) {
                    if let Some(value) = value {
                        row.insert(name.clone(), value.into());
                    }
                }
            }
        }
    }
    Ok(rows)
}
