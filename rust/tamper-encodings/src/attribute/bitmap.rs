//! Bitmap pack for tags data: each row gets one bit per possibility.

use tamper_bits::BitVec;
use tamper_common::Result;

use super::{
    AttributeEncoding, AttributePack, EncodedAttribute, PackLayout, TagsLayout,
    verify_window_count,
};
use crate::{
    header::{read_bit_block, write_bit_block},
    possibilities::Possibilities,
    text::encode_text,
    value::Value,
};

/// Encodes tags data as a bitmap.
///
/// The row window is `possibilities.len()` bits wide; bit `i` is set when the row
/// contains `possibilities[i]`. Values outside the possibility set leave no trace.
pub struct BitmapPack {
    attr_name: String,
    possibilities: Possibilities,
    max_choices: usize,
}

impl BitmapPack {
    pub fn new(
        attr_name: impl Into<String>,
        possibilities: Possibilities,
        max_choices: usize,
    ) -> BitmapPack {
        BitmapPack {
            attr_name: attr_name.into(),
            possibilities,
            max_choices,
        }
    }

    pub fn window_width(&self) -> u32 {
        self.possibilities.len() as u32
    }
}

impl AttributePack for BitmapPack {
    fn attr_name(&self) -> &str {
        &self.attr_name
    }

    fn encoding(&self) -> AttributeEncoding {
        AttributeEncoding::Bitmap
    }

    fn encode(&self, column: &[Option<&Value>]) -> Result<EncodedAttribute> {
        let width = self.possibilities.len();
        let mut bits = BitVec::with_capacity(width * column.len());
        let mut window = vec![false; width];
        for value in column {
            window.fill(false);
            for choice in value.map(Value::choices).unwrap_or_default() {
                if let Some(pos) = self.possibilities.position(choice) {
                    window[pos] = true;
                }
            }
            bits.extend_bits(window.iter().copied());
        }

        let mut payload = Vec::new();
        write_bit_block(&bits, &mut payload)?;
        log::trace!(
            "bitmap pack '{}': {} rows x {} bits",
            self.attr_name,
            column.len(),
            width
        );

        Ok(EncodedAttribute {
            attr_name: self.attr_name.clone(),
            layout: PackLayout::Bitmap(TagsLayout {
                possibilities: self.possibilities.values().to_vec(),
                max_choices: self.max_choices,
                item_window_width: self.window_width(),
                bit_window_width: self.window_width(),
            }),
            pack: encode_text(&payload),
        })
    }
}

/// Decodes a bitmap payload into the choices of each row.
pub fn decode(layout: &TagsLayout, bytes: &[u8], row_count: usize) -> Result<Vec<Vec<String>>> {
    let (bits, _) = read_bit_block(bytes)?;
    let width = layout.possibilities.len();
    verify_window_count("bitmap", bits.len(), width as u32, row_count)?;

    let mut rows = Vec::with_capacity(row_count);
    let mut bit_iter = bits.iter();
    for _ in 0..row_count {
        let row = layout
            .possibilities
            .iter()
            .zip(bit_iter.by_ref().take(width))
            .filter(|(_, present)| *present)
            .map(|(value, _)| value.clone())
            .collect();
        rows.push(row);
    }
    Ok(rows)
}
