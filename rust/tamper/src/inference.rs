//! Single-pass attribute discovery.
//!
//! [`scan_rows`] walks the rows once and, for every attribute name it meets,
//! accumulates the statistics needed to configure a pack (possibility set and
//! `max_choices` for categorical attributes, range for numeric ones) together
//! with the attribute's column of per-row values. Attribute kind is fixed by the
//! first value seen; descriptors are only materialized after the scan so that no
//! partially observed statistics leak out.

use std::fmt;

use ahash::AHashMap;
use tamper_encodings::{Number, Possibilities, Value};

use crate::{options::PackOptions, row::Row};

/// Everything needed to build the pack of one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDescriptor {
    pub name: String,
    pub kind: AttributeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeKind {
    /// Categorical attribute: string or list-of-strings values.
    Tags {
        possibilities: Possibilities,
        max_choices: usize,
    },
    /// Numeric attribute: the observed range and the digits to keep.
    Numeric {
        precision: u32,
        min: Number,
        max: Number,
    },
}

/// One-line summary with counts only, for logging.
impl fmt::Display for AttributeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AttributeKind::Tags {
                possibilities,
                max_choices,
            } => write!(
                f,
                "'{}': tags, {} possibilities, max_choices {}",
                self.name,
                possibilities.len(),
                max_choices
            ),
            AttributeKind::Numeric {
                precision,
                min,
                max,
            } => write!(
                f,
                "'{}': numeric, precision {}, range {}..={}",
                self.name, precision, min, max
            ),
        }
    }
}

/// Result of [`scan_rows`].
#[derive(Debug)]
pub struct Scan<'a> {
    /// Row guids, in input order.
    pub guids: Vec<u64>,
    /// Attributes in order of first appearance.
    pub descriptors: Vec<AttributeDescriptor>,
    /// One column per descriptor, each with one entry per row.
    pub columns: Vec<Vec<Option<&'a Value>>>,
}

impl Scan<'_> {
    pub fn row_count(&self) -> usize {
        self.guids.len()
    }
}

/// Scans `rows` once, discovering attributes and their statistics.
pub fn scan_rows<'a>(rows: &'a [Row], options: &PackOptions) -> Scan<'a> {
    let mut builders: Vec<DescriptorBuilder<'a>> = Vec::new();
    let mut index: AHashMap<&'a str, usize> = AHashMap::new();
    let mut guids = Vec::with_capacity(rows.len());

    for (row_idx, row) in rows.iter().enumerate() {
        guids.push(row.guid());
        for (name, value) in row.fields() {
            let pos = *index.entry(name).or_insert_with(|| {
                builders.push(DescriptorBuilder::new(name, value, options));
                builders.len() - 1
            });
            builders[pos].observe(row_idx, value);
        }
    }

    let mut descriptors = Vec::with_capacity(builders.len());
    let mut columns = Vec::with_capacity(builders.len());
    for builder in builders {
        let (descriptor, column) = builder.finish(rows.len());
        log::trace!("discovered attribute {descriptor}");
        descriptors.push(descriptor);
        columns.push(column);
    }
    Scan {
        guids,
        descriptors,
        columns,
    }
}

struct DescriptorBuilder<'a> {
    name: &'a str,
    kind: AttributeKind,
    values: Vec<Option<&'a Value>>,
}

impl<'a> DescriptorBuilder<'a> {
    fn new(name: &'a str, first: &Value, options: &PackOptions) -> DescriptorBuilder<'a> {
        let kind = match first {
            Value::Str(_) | Value::List(_) => AttributeKind::Tags {
                possibilities: Possibilities::new(),
                max_choices: 0,
            },
            Value::Int(v) => AttributeKind::Numeric {
                precision: 0,
                min: Number::Int(*v),
                max: Number::Int(*v),
            },
            Value::Float(v) => AttributeKind::Numeric {
                precision: options.precision_for(name),
                min: Number::Float(*v),
                max: Number::Float(*v),
            },
        };
        DescriptorBuilder {
            name,
            kind,
            values: Vec::new(),
        }
    }

    fn observe(&mut self, row_idx: usize, value: &'a Value) {
        self.values.resize(row_idx, None);
        self.values.push(Some(value));

        match (&mut self.kind, value) {
            (
                AttributeKind::Tags {
                    possibilities,
                    max_choices,
                },
                Value::Str(_) | Value::List(_),
            ) => {
                let choices = value.choices();
                for choice in choices {
                    possibilities.insert(choice);
                }
                // A bare string always takes a slot, even after empty lists.
                let slots = match value {
                    Value::Str(_) => 1,
                    _ => choices.len(),
                };
                *max_choices = (*max_choices).max(slots);
            }
            (AttributeKind::Numeric { min, max, .. }, Value::Int(_) | Value::Float(_)) => {
                let number = match *value {
                    Value::Int(v) => Number::Int(v),
                    Value::Float(v) => Number::Float(v),
                    _ => return,
                };
                if number.as_f64() < min.as_f64() {
                    *min = number;
                }
                if number.as_f64() > max.as_f64() {
                    *max = number;
                }
            }
            _ => {
                log::warn!(
                    "attribute '{}': value {value:?} does not match the attribute kind, \
                     it is excluded from the statistics",
                    self.name
                );
            }
        }
    }

    fn finish(mut self, row_count: usize) -> (AttributeDescriptor, Vec<Option<&'a Value>>) {
        self.values.resize(row_count, None);
        let descriptor = AttributeDescriptor {
            name: self.name.to_string(),
            kind: self.kind,
        };
        (descriptor, self.values)
    }
}

#[cfg(test)]
mod tests {
    use tamper_encodings::{Number, Possibilities, Value};

    use super::{AttributeDescriptor, AttributeKind, scan_rows};
    use crate::{options::PackOptions, row::Row};

    #[test]
    fn test_discovery_order_and_columns() {
        let rows = vec![
            Row::new(1).with("b", "x"),
            Row::new(2).with("a", 3).with("b", "y"),
            Row::new(4).with("c", 1.5),
        ];
        let scan = scan_rows(&rows, &PackOptions::new());
        assert_eq!(scan.guids, [1, 2, 4]);
        assert_eq!(scan.row_count(), 3);
        assert_eq!(
            scan.descriptors
                .iter()
                .map(|d| d.name.as_str())
                .collect::<Vec<_>>(),
            ["b", "a", "c"]
        );
        assert!(scan.columns.iter().all(|column| column.len() == 3));
        assert_eq!(scan.columns[1], [None, Some(&Value::Int(3)), None]);
        assert_eq!(scan.columns[2], [None, None, Some(&Value::Float(1.5))]);
    }

    #[test]
    fn test_tags_statistics() {
        let rows = vec![
            Row::new(0).with("tags", Vec::<String>::new()),
            Row::new(1).with("tags", "a"),
            Row::new(2).with("tags", vec!["b", "a"]),
            Row::new(3).with("tags", vec!["c"]),
        ];
        let scan = scan_rows(&rows, &PackOptions::new());
        assert_eq!(
            scan.descriptors[0].kind,
            AttributeKind::Tags {
                possibilities: ["a", "b", "c"].into_iter().collect::<Possibilities>(),
                max_choices: 2,
            }
        );
    }

    #[test]
    fn test_string_after_empty_list_takes_a_slot() {
        let rows = vec![
            Row::new(0).with("tags", Vec::<String>::new()),
            Row::new(1).with("tags", "a"),
        ];
        let scan = scan_rows(&rows, &PackOptions::new());
        let AttributeKind::Tags { max_choices, .. } = &scan.descriptors[0].kind else {
            panic!("expected tags");
        };
        assert_eq!(*max_choices, 1);
    }

    #[test]
    fn test_numeric_statistics() {
        let rows = vec![
            Row::new(1).with("int", 4).with("float", 1.3),
            Row::new(2).with("int", -2).with("float", 0.5),
            Row::new(3).with("int", 8).with("float", 2.8),
        ];
        let options = PackOptions::new()
            .with_precision("float", 1)
            .with_precision("int", 5);
        let scan = scan_rows(&rows, &options);
        assert_eq!(
            scan.descriptors[0].kind,
            AttributeKind::Numeric {
                precision: 0,
                min: Number::Int(-2),
                max: Number::Int(8),
            }
        );
        assert_eq!(
            scan.descriptors[1].kind,
            AttributeKind::Numeric {
                precision: 1,
                min: Number::Float(0.5),
                max: Number::Float(2.8),
            }
        );
    }

    #[test]
    fn test_mismatched_value_is_kept_in_column() {
        let rows = vec![Row::new(1).with("n", 3), Row::new(2).with("n", "oops")];
        let scan = scan_rows(&rows, &PackOptions::new());
        assert_eq!(
            scan.descriptors[0].kind,
            AttributeKind::Numeric {
                precision: 0,
                min: Number::Int(3),
                max: Number::Int(3),
            }
        );
        assert_eq!(scan.columns[0][1], Some(&Value::from("oops")));
    }

    #[test]
    fn test_empty_input() {
        let scan = scan_rows(&[], &PackOptions::new());
        assert!(scan.guids.is_empty());
        assert!(scan.descriptors.is_empty());
    }

    #[test]
    fn test_descriptor_summary() {
        let tags = AttributeDescriptor {
            name: "color".to_string(),
            kind: AttributeKind::Tags {
                possibilities: (0..500).map(|i| format!("c{i}")).collect(),
                max_choices: 2,
            },
        };
        assert_eq!(
            tags.to_string(),
            "'color': tags, 500 possibilities, max_choices 2"
        );

        let numeric = AttributeDescriptor {
            name: "price".to_string(),
            kind: AttributeKind::Numeric {
                precision: 2,
                min: Number::Int(1),
                max: Number::Float(9.5),
            },
        };
        assert_eq!(numeric.to_string(), "'price': numeric, precision 2, range 1..=9.5");
    }
}
