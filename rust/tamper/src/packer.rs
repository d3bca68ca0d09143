//! Dataset packing: attribute inference, encoding selection and document assembly.

use rayon::prelude::*;
use tamper_common::Result;
use tamper_encodings::{
    AttributeEncoding, AttributePack, BitmapPack, EncodedAttribute, IntegerPack, NumericPack,
    NumericPackOptions, Value, pack_existence,
};

use crate::{
    document::{Document, ExistencePack},
    inference::{AttributeDescriptor, AttributeKind, scan_rows},
    options::PackOptions,
    row::Row,
    selection::choose_tags_encoding,
};

/// Packs rows into a [`Document`].
///
/// Rows must be sorted by strictly ascending guid. Every attribute gets a pack;
/// rows that lack an attribute encode as "no value" in that pack.
#[derive(Debug, Clone, Default)]
pub struct Packer {
    options: PackOptions,
}

impl Packer {
    pub fn new(options: PackOptions) -> Packer {
        Packer { options }
    }

    /// Packs `rows`.
    ///
    /// # Errors
    ///
    /// Fails before any encoding work when an attribute cannot be configured, and
    /// with `InvalidArgument` when guids are not strictly ascending. No partial
    /// document is produced.
    pub fn pack(&self, rows: &[Row]) -> Result<Document> {
        let scan = scan_rows(rows, &self.options);
        log::debug!(
            "packing {} rows, {} attributes",
            scan.row_count(),
            scan.descriptors.len()
        );

        let packs = scan
            .descriptors
            .into_iter()
            .map(create_pack)
            .collect::<Result<Vec<_>>>()?;

        let existence = ExistencePack::from_blocks(&pack_existence(&scan.guids)?)?;

        let attributes = if self.options.parallel {
            packs
                .par_iter()
                .zip(scan.columns.par_iter())
                .map(|(pack, column)| encode_column(pack.as_ref(), column))
                .collect::<Result<Vec<_>>>()?
        } else {
            packs
                .iter()
                .zip(scan.columns.iter())
                .map(|(pack, column)| encode_column(pack.as_ref(), column))
                .collect::<Result<Vec<_>>>()?
        };

        Ok(Document::new(existence, attributes))
    }
}

/// Packs `rows` with the given options.
pub fn pack(rows: &[Row], options: &PackOptions) -> Result<Document> {
    Packer::new(options.clone()).pack(rows)
}

/// Creates the pack for one attribute.
pub fn create_pack(descriptor: AttributeDescriptor) -> Result<Box<dyn AttributePack>> {
    let AttributeDescriptor { name, kind } = descriptor;
    let pack: Box<dyn AttributePack> = match kind {
        AttributeKind::Tags {
            possibilities,
            max_choices,
        } => match choose_tags_encoding(possibilities.len(), max_choices) {
            AttributeEncoding::Integer => {
                Box::new(IntegerPack::new(name, possibilities, max_choices))
            }
            _ => Box::new(BitmapPack::new(name, possibilities, max_choices)),
        },
        AttributeKind::Numeric {
            precision,
            min,
            max,
        } => {
            let options = NumericPackOptions {
                precision: Some(precision),
                min: Some(min),
                max: Some(max),
            };
            Box::new(NumericPack::new(name, &options)?)
        }
    };
    log::debug!(
        "attribute '{}': {} encoding",
        pack.attr_name(),
        pack.encoding().as_str()
    );
    Ok(pack)
}

fn encode_column(pack: &dyn AttributePack, column: &[Option<&Value>]) -> Result<EncodedAttribute> {
    let encoded = pack.encode(column)?;
    log::trace!(
        "attribute '{}': {} pack chars",
        encoded.attr_name,
        encoded.pack.len()
    );
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use tamper_encodings::{AttributeEncoding, DecodedColumn, Number, Possibilities};

    use super::{Packer, create_pack, pack};
    use crate::{
        inference::{AttributeDescriptor, AttributeKind},
        options::PackOptions,
        row::Row,
    };

    fn tags(name: &str, values: &[&str], max_choices: usize) -> AttributeDescriptor {
        AttributeDescriptor {
            name: name.to_string(),
            kind: AttributeKind::Tags {
                possibilities: values.iter().collect::<Possibilities>(),
                max_choices,
            },
        }
    }

    #[test]
    fn test_create_pack_selects_encoding() {
        let many = (0..100).map(|i| format!("v{i}")).collect::<Vec<_>>();
        let many = many.iter().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(
            create_pack(tags("a", &many, 1)).unwrap().encoding(),
            AttributeEncoding::Integer
        );
        assert_eq!(
            create_pack(tags("b", &["x", "y", "z"], 3))
                .unwrap()
                .encoding(),
            AttributeEncoding::Bitmap
        );

        let numeric = AttributeDescriptor {
            name: "n".to_string(),
            kind: AttributeKind::Numeric {
                precision: 0,
                min: Number::Int(0),
                max: Number::Int(10),
            },
        };
        assert_eq!(
            create_pack(numeric).unwrap().encoding(),
            AttributeEncoding::Numeric
        );
    }

    #[test]
    fn test_create_pack_rejects_overflowing_range() {
        let numeric = AttributeDescriptor {
            name: "n".to_string(),
            kind: AttributeKind::Numeric {
                precision: 40,
                min: Number::Float(0.0),
                max: Number::Float(1.0),
            },
        };
        assert!(create_pack(numeric).err().unwrap().is_config());
    }

    #[test]
    fn test_pack_high_precision() {
        let rows = vec![Row::new(0).with("f", 0.0001), Row::new(1).with("f", 0.0005)];
        let document = pack(&rows, &PackOptions::new().with_precision("f", 16)).unwrap();
        assert_eq!(
            document.decode_attribute("f", 2).unwrap(),
            DecodedColumn::Numeric(vec![Some(0.0001), Some(0.0005)])
        );

        let rows = vec![Row::new(0).with("f", 1.5), Row::new(1).with("f", 20.0)];
        let err = pack(&rows, &PackOptions::new().with_precision("f", 18)).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_pack_rejects_unsorted_guids() {
        let rows = vec![Row::new(5).with("a", "x"), Row::new(3).with("a", "y")];
        assert!(Packer::default().pack(&rows).is_err());
    }

    #[test]
    fn test_missing_attribute_decodes_as_empty() {
        let rows = vec![
            Row::new(0).with("c", "x").with("n", 3),
            Row::new(1),
            Row::new(2).with("c", "y").with("n", 5),
        ];
        let document = pack(&rows, &PackOptions::new()).unwrap();
        assert_eq!(
            document.decode_attribute("c", 3).unwrap(),
            DecodedColumn::Tags(vec![
                vec!["x".to_string()],
                vec![],
                vec!["y".to_string()]
            ])
        );
        assert_eq!(
            document.decode_attribute("n", 3).unwrap(),
            DecodedColumn::Numeric(vec![Some(3.0), None, Some(5.0)])
        );
    }
}
