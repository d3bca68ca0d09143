//! Integer pack for tags data: each row gets `max_choices` index slots.

use tamper_bits::BitVec;
use tamper_common::{Result, error::Error};

use super::{
    AttributeEncoding, AttributePack, EncodedAttribute, PackLayout, TagsLayout, bits_for,
    verify_window_count,
};
use crate::{
    header::{read_bit_block, write_bit_block},
    possibilities::Possibilities,
    text::encode_text,
    value::Value,
};

/// Encodes tags data as possibility indices.
///
/// Each slot holds `position + 1` of the row's n-th choice, or 0 when the row has
/// fewer choices or the choice is not a known possibility. Slots are
/// `ceil(log2(possibilities + 1))` bits wide.
pub struct IntegerPack {
    attr_name: String,
    possibilities: Possibilities,
    max_choices: usize,
}

impl IntegerPack {
    pub fn new(
        attr_name: impl Into<String>,
        possibilities: Possibilities,
        max_choices: usize,
    ) -> IntegerPack {
        IntegerPack {
            attr_name: attr_name.into(),
            possibilities,
            max_choices,
        }
    }

    /// Width of one slot.
    pub fn bit_window_width(&self) -> u32 {
        bits_for(self.possibilities.len() as u64)
    }

    /// Width of one row.
    pub fn item_window_width(&self) -> u32 {
        self.bit_window_width() * self.max_choices as u32
    }
}

impl AttributePack for IntegerPack {
    fn attr_name(&self) -> &str {
        &self.attr_name
    }

    fn encoding(&self) -> AttributeEncoding {
        AttributeEncoding::Integer
    }

    fn encode(&self, column: &[Option<&Value>]) -> Result<EncodedAttribute> {
        let slot_width = self.bit_window_width();
        let mut bits = BitVec::with_capacity(self.item_window_width() as usize * column.len());
        for value in column {
            let choices = value.map(Value::choices).unwrap_or_default();
            for slot in 0..self.max_choices {
                let code = choices
                    .get(slot)
                    .and_then(|choice| self.possibilities.position(choice))
                    .map_or(0, |pos| pos as u64 + 1);
                bits.push_bits(code, slot_width);
            }
        }

        let mut payload = Vec::new();
        write_bit_block(&bits, &mut payload)?;
        log::trace!(
            "integer pack '{}': {} rows x {} slots x {} bits",
            self.attr_name,
            column.len(),
            self.max_choices,
            slot_width
        );

        Ok(EncodedAttribute {
            attr_name: self.attr_name.clone(),
            layout: PackLayout::Integer(TagsLayout {
                possibilities: self.possibilities.values().to_vec(),
                max_choices: self.max_choices,
                item_window_width: self.item_window_width(),
                bit_window_width: slot_width,
            }),
            pack: encode_text(&payload),
        })
    }
}

/// Decodes an integer payload into the choices of each row, in slot order.
pub fn decode(layout: &TagsLayout, bytes: &[u8], row_count: usize) -> Result<Vec<Vec<String>>> {
    let (bits, _) = read_bit_block(bytes)?;
    let slot_width = bits_for(layout.possibilities.len() as u64);
    let item_width = slot_width * layout.max_choices as u32;
    verify_window_count("integer", bits.len(), item_width, row_count)?;

    let mut rows = Vec::with_capacity(row_count);
    let mut pos = 0;
    for _ in 0..row_count {
        let mut row = Vec::new();
        for _ in 0..layout.max_choices {
            let code = bits.read_bits(pos, slot_width)? as usize;
            pos += slot_width as usize;
            if code == 0 {
                continue;
            }
            let value = layout.possibilities.get(code - 1).ok_or_else(|| {
                Error::invalid_format(
                    "integer",
                    format!(
                        "code {code} exceeds {} possibilities",
                        layout.possibilities.len()
                    ),
                )
            })?;
            row.push(value.clone());
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::{IntegerPack, decode};
    use crate::{
        attribute::{AttributePack, DecodedColumn, PackLayout, TagsLayout},
        header::write_bit_block,
        possibilities::Possibilities,
        value::Value,
    };
    use tamper_bits::BitVec;

    #[test]
    fn test_single_choice_codes() {
        let possibilities: Possibilities = ["a", "b"].into_iter().collect();
        let rows = [Value::from("a"), Value::from("b"), Value::from("x")];
        let column = rows.iter().map(Some).collect::<Vec<_>>();
        let pack = IntegerPack::new("t", possibilities, 1);
        assert_eq!(pack.bit_window_width(), 2);

        let encoded = pack.encode(&column).unwrap();
        // 01 10 00
        assert_eq!(
            encoded.pack_bytes().unwrap(),
            vec![0, 0, 0, 0, 6, 0b0110_0000]
        );
        assert_eq!(
            encoded.decode(3).unwrap(),
            DecodedColumn::Tags(vec![vec!["a".to_string()], vec!["b".to_string()], vec![]])
        );
    }

    #[test]
    fn test_multi_choice_slots() {
        let possibilities: Possibilities = ["a", "b", "c", "d"].into_iter().collect();
        let rows = [
            Some(Value::from(vec!["d", "a"])),
            None,
            Some(Value::from(vec!["q", "b"])),
            Some(Value::from("c")),
        ];
        let column = rows.iter().map(Option::as_ref).collect::<Vec<_>>();
        let encoded = IntegerPack::new("t", possibilities, 2)
            .encode(&column)
            .unwrap();

        let PackLayout::Integer(layout) = &encoded.layout else {
            panic!("unexpected layout {:?}", encoded.layout);
        };
        assert_eq!(layout.bit_window_width, 3);
        assert_eq!(layout.item_window_width, 6);

        // 100 001 | 000 000 | 000 010 | 011 000
        let bytes = encoded.pack_bytes().unwrap();
        assert_eq!(
            bytes,
            vec![0, 0, 0, 3, 0, 0b1000_0100, 0b0000_0000, 0b1001_1000]
        );
        let decoded = decode(layout, &bytes, 4).unwrap();
        assert_eq!(
            decoded,
            vec![vec!["d", "a"], vec![], vec!["b"], vec!["c"]]
        );
    }

    #[test]
    fn test_decode_rejects_unknown_code() {
        let layout = TagsLayout {
            possibilities: vec!["a".to_string()],
            max_choices: 1,
            item_window_width: 1,
            bit_window_width: 1,
        };
        let mut bits = BitVec::new();
        bits.push_bits(1, 1);
        let mut bytes = Vec::new();
        write_bit_block(&bits, &mut bytes).unwrap();
        assert_eq!(decode(&layout, &bytes, 1).unwrap(), vec![vec!["a"]]);

        let layout = TagsLayout {
            possibilities: vec!["a".to_string(), "b".to_string()],
            max_choices: 1,
            item_window_width: 2,
            bit_window_width: 2,
        };
        let mut bits = BitVec::new();
        bits.push_bits(3, 2);
        let mut bytes = Vec::new();
        write_bit_block(&bits, &mut bytes).unwrap();
        assert!(decode(&layout, &bytes, 1).is_err());
    }
}
