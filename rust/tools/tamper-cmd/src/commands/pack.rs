//! Pack command implementation

use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Map, Value as JsonValue};
use std::fs::{self, File};
use std::io::BufReader;
use tamper::{Document, PackOptions, Packer, Row, Value};

use crate::utils;

/// Row key holding the guid; every other key is an attribute.
pub const GUID_FIELD: &str = "guid";

pub fn run(
    input: String,
    options_path: Option<String>,
    precision: Vec<(String, u32)>,
    parallel: bool,
    output: Option<String>,
    pretty: bool,
) -> Result<()> {
    utils::validate_file_exists(&input).with_context(|| format!("Invalid input file: {input}"))?;

    let mut options = match options_path {
        Some(path) => load_options(&path)?,
        None => PackOptions::new(),
    };
    for (name, digits) in precision {
        options = options.with_precision(name, digits);
    }
    if parallel {
        options = options.with_parallel(true);
    }

    let document = pack_file(&input, options)?;
    let json = if pretty {
        document.to_json_pretty()?
    } else {
        document.to_json()?
    };

    match output {
        Some(output_file) => {
            fs::write(&output_file, &json)
                .with_context(|| format!("Failed to write document to file: {output_file}"))?;
            println!(
                "Document written to: {} ({})",
                output_file,
                utils::format_size(json.len() as u64)
            );
        }
        None => {
            println!("{json}");
        }
    }
    Ok(())
}

pub fn load_options(path: &str) -> Result<PackOptions> {
    utils::validate_file_exists(path).with_context(|| format!("Invalid options file: {path}"))?;
    let file = File::open(path).with_context(|| format!("Failed to open {path}"))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse pack options from {path}"))
}

pub fn pack_file(path: &str, options: PackOptions) -> Result<Document> {
    let rows = read_rows(path)?;
    log::debug!("read {} rows from {}", rows.len(), path);
    Packer::new(options)
        .pack(&rows)
        .with_context(|| format!("Failed to pack rows from {path}"))
}

/// Reads a JSON array of row objects.
pub fn read_rows(path: &str) -> Result<Vec<Row>> {
    let file = File::open(path).with_context(|| format!("Failed to open {path}"))?;
    let objects: Vec<Map<String, JsonValue>> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse rows from {path}"))?;
    objects
        .into_iter()
        .enumerate()
        .map(|(idx, object)| {
            row_from_json(object).with_context(|| format!("Invalid row {idx} in {path}"))
        })
        .collect()
}

/// Converts a JSON object to a row. `null` attributes are treated as absent.
pub fn row_from_json(object: Map<String, JsonValue>) -> Result<Row> {
    let guid = object
        .get(GUID_FIELD)
        .and_then(JsonValue::as_u64)
        .ok_or_else(|| anyhow!("missing or non-integer \"{GUID_FIELD}\""))?;

    let mut row = Row::new(guid);
    for (name, value) in object {
        if name == GUID_FIELD {
            continue;
        }
        if let Some(value) = value_from_json(&name, value)? {
            row.set(name, value);
        }
    }
    Ok(row)
}

fn value_from_json(name: &str, value: JsonValue) -> Result<Option<Value>> {
    let value = match value {
        JsonValue::Null => return Ok(None),
        JsonValue::String(s) => Value::Str(s),
        JsonValue::Number(n) => match n.as_i64() {
            Some(v) => Value::Int(v),
            None => Value::Float(
                n.as_f64()
                    .ok_or_else(|| anyhow!("attribute '{name}': unsupported number {n}"))?,
            ),
        },
        JsonValue::Array(items) => Value::List(
            items
                .into_iter()
                .map(|item| match item {
                    JsonValue::String(s) => Ok(s),
                    other => bail!("attribute '{name}': list items must be strings, got {other}"),
                })
                .collect::<Result<_>>()?,
        ),
        other => bail!("attribute '{name}': unsupported value {other}"),
    };
    Ok(Some(value))
}
