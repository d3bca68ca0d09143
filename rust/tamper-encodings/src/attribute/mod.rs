//! Attribute packs.
//!
//! Every pack turns one attribute column (one optional [`Value`] per row) into an
//! [`EncodedAttribute`]: the layout metadata a decoder needs, plus the
//! base64-wrapped binary payload (5-byte [`PackHeader`](crate::header::PackHeader)
//! followed by fixed-width per-row windows).

use serde::{Deserialize, Serialize};
use tamper_common::Result;

use crate::{text::decode_text, value::Value};

pub mod bitmap;
pub mod integer;
pub mod numeric;

/// Encoding applied to an attribute column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeEncoding {
    /// One bit per possibility per row.
    Bitmap,
    /// `max_choices` index slots per row.
    Integer,
    /// One scaled integer per row.
    Numeric,
}

impl AttributeEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeEncoding::Bitmap => "bitmap",
            AttributeEncoding::Integer => "integer",
            AttributeEncoding::Numeric => "numeric",
        }
    }
}

/// Common contract of the attribute packs.
pub trait AttributePack: Send + Sync {
    fn attr_name(&self) -> &str;

    fn encoding(&self) -> AttributeEncoding;

    /// Encodes `column`, which holds the attribute's value for every row (`None`
    /// where the row lacks the attribute).
    fn encode(&self, column: &[Option<&Value>]) -> Result<EncodedAttribute>;
}

/// Output of an attribute pack, as it appears in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedAttribute {
    pub attr_name: String,
    #[serde(flatten)]
    pub layout: PackLayout,
    /// Base64 text of the header-framed payload.
    pub pack: String,
}

/// Encoding-specific metadata, tagged by the `encoding` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "encoding", rename_all = "lowercase")]
pub enum PackLayout {
    Bitmap(TagsLayout),
    Integer(TagsLayout),
    Numeric(NumericLayout),
}

impl PackLayout {
    pub fn encoding(&self) -> AttributeEncoding {
        match self {
            PackLayout::Bitmap(_) => AttributeEncoding::Bitmap,
            PackLayout::Integer(_) => AttributeEncoding::Integer,
            PackLayout::Numeric(_) => AttributeEncoding::Numeric,
        }
    }

    /// Bits used by each row.
    pub fn item_window_width(&self) -> u32 {
        match self {
            PackLayout::Bitmap(layout) | PackLayout::Integer(layout) => layout.item_window_width,
            PackLayout::Numeric(layout) => layout.item_window_width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagsLayout {
    pub possibilities: Vec<String>,
    pub max_choices: usize,
    /// Bits per row.
    pub item_window_width: u32,
    /// Bits per possibility (bitmap) or per slot (integer).
    pub bit_window_width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericLayout {
    pub item_window_width: u32,
    pub precision: u32,
    pub delta: i64,
    pub min: crate::value::Number,
    pub max: crate::value::Number,
}

/// Per-row values recovered from a pack.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedColumn {
    /// The choices of each row, in possibility order (bitmap) or slot order (integer).
    Tags(Vec<Vec<String>>),
    /// The value of each row, `None` where the row lacked the attribute.
    Numeric(Vec<Option<f64>>),
}

impl DecodedColumn {
    pub fn len(&self) -> usize {
        match self {
            DecodedColumn::Tags(rows) => rows.len(),
            DecodedColumn::Numeric(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EncodedAttribute {
    pub fn encoding(&self) -> AttributeEncoding {
        self.layout.encoding()
    }

    /// Raw header-framed payload.
    pub fn pack_bytes(&self) -> Result<Vec<u8>> {
        decode_text(&self.pack)
    }

    /// Decodes the values of `row_count` rows.
    pub fn decode(&self, row_count: usize) -> Result<DecodedColumn> {
        let bytes = self.pack_bytes()?;
        match &self.layout {
            PackLayout::Bitmap(layout) => {
                bitmap::decode(layout, &bytes, row_count).map(DecodedColumn::Tags)
            }
            PackLayout::Integer(layout) => {
                integer::decode(layout, &bytes, row_count).map(DecodedColumn::Tags)
            }
            PackLayout::Numeric(layout) => {
                numeric::decode(layout, &bytes, row_count).map(DecodedColumn::Numeric)
            }
        }
    }
}

/// Number of bits needed to store every code in `0..=max_code`, i.e.
/// `ceil(log2(max_code + 1))` computed without floating point.
#[inline]
pub fn bits_for(max_code: u64) -> u32 {
    u64::BITS - max_code.leading_zeros()
}

/// Checks that a decoded payload has exactly `row_count` windows of `width` bits.
fn verify_window_count(
    attr: &str,
    bit_count: usize,
    width: u32,
    row_count: usize,
) -> Result<()> {
    let expected = width as usize * row_count;
    if bit_count != expected {
        return Err(tamper_common::error::Error::invalid_format(
            attr,
            format!("payload holds {bit_count} bits, {row_count} rows of {width} bits expected"),
        ));
    }
    Ok(())
}
