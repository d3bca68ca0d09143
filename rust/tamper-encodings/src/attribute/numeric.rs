//! Numeric pack: values are scaled to integers and stored as offsets from `min`.

use serde::{Deserialize, Serialize};
use tamper_bits::BitVec;
use tamper_common::{Result, error::Error};

use super::{
    AttributeEncoding, AttributePack, EncodedAttribute, NumericLayout, PackLayout, bits_for,
    verify_window_count,
};
use crate::{
    header::{read_bit_block, write_bit_block},
    text::encode_text,
    value::{Number, Value},
};

/// Per-attribute configuration of the numeric pack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericPackOptions {
    /// Decimal digits kept after the point, 0 by default.
    pub precision: Option<u32>,
    /// Lower bound of the data, 0 by default.
    pub min: Option<Number>,
    /// Upper bound of the data. Required.
    pub max: Option<Number>,
}

/// Encodes numeric data as fixed-width scaled integers.
///
/// With `multiplier = 10^precision` and `delta = round(min * multiplier)`, a value
/// `v` is stored as `round(v * multiplier) - delta + 1`; code 0 marks a row without
/// the attribute. The window is wide enough for every code up to
/// `round(max * multiplier) - delta + 1`. Codes outside that range are truncated to
/// the window width, so `min` and `max` must cover the data.
#[derive(Debug, Clone)]
pub struct NumericPack {
    attr_name: String,
    precision: u32,
    min: Number,
    max: Number,
    multiplier: f64,
    delta: i64,
    width: u32,
}

impl NumericPack {
    /// Creates a numeric pack, validating `options`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `max` is missing, `max` is below `min`,
    /// or the scaled range does not fit in 64 bits.
    pub fn new(attr_name: impl Into<String>, options: &NumericPackOptions) -> Result<NumericPack> {
        let attr_name = attr_name.into();
        let Some(max) = options.max else {
            return Err(Error::config(attr_name, "'max' option is required"));
        };
        let precision = options.precision.unwrap_or(0);
        let min = options.min.unwrap_or_default();

        let multiplier = multiplier(precision);
        let range = checked_scale(min.as_f64(), multiplier)
            .zip(checked_scale(max.as_f64(), multiplier))
            .and_then(|(low, high)| Some((low, high.checked_sub(low)?.checked_add(1)?)));
        let Some((delta, range)) = range else {
            return Err(Error::config(
                attr_name,
                format!("value range at precision {precision} overflows 64 bits"),
            ));
        };
        if range < 1 {
            return Err(Error::config(
                attr_name,
                format!("max ({max}) is below min ({min})"),
            ));
        }

        Ok(NumericPack {
            attr_name,
            precision,
            min,
            max,
            multiplier,
            delta,
            width: bits_for(range as u64),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn delta(&self) -> i64 {
        self.delta
    }

    /// Code stored for `value`, before truncation to the window width.
    pub fn code(&self, value: Option<f64>) -> u64 {
        match value {
            Some(v) => scale(v, self.multiplier)
                .wrapping_sub(self.delta)
                .wrapping_add(1) as u64,
            None => 0,
        }
    }
}

impl AttributePack for NumericPack {
    fn attr_name(&self) -> &str {
        &self.attr_name
    }

    fn encoding(&self) -> AttributeEncoding {
        AttributeEncoding::Numeric
    }

    fn encode(&self, column: &[Option<&Value>]) -> Result<EncodedAttribute> {
        let mut bits = BitVec::with_capacity(self.width as usize * column.len());
        for value in column {
            bits.push_bits(self.code(value.and_then(Value::as_f64)), self.width);
        }

        let mut payload = Vec::new();
        write_bit_block(&bits, &mut payload)?;
        log::trace!(
            "numeric pack '{}': {} rows x {} bits (precision {}, delta {})",
            self.attr_name,
            column.len(),
            self.width,
            self.precision,
            self.delta
        );

        Ok(EncodedAttribute {
            attr_name: self.attr_name.clone(),
            layout: PackLayout::Numeric(NumericLayout {
                item_window_width: self.width,
                precision: self.precision,
                delta: self.delta,
                min: self.min,
                max: self.max,
            }),
            pack: encode_text(&payload),
        })
    }
}

/// Decodes a numeric payload, reversing the scaling. Code 0 decodes to `None`.
pub fn decode(layout: &NumericLayout, bytes: &[u8], row_count: usize) -> Result<Vec<Option<f64>>> {
    let (bits, _) = read_bit_block(bytes)?;
    verify_window_count("numeric", bits.len(), layout.item_window_width, row_count)?;
    if layout.item_window_width > 64 {
        return Err(Error::invalid_format(
            "numeric",
            format!("window width {} exceeds 64", layout.item_window_width),
        ));
    }

    let multiplier = multiplier(layout.precision);
    let width = layout.item_window_width;
    (0..row_count)
        .map(|row| {
            let code = bits.read_bits(row * width as usize, width)?;
            Ok((code != 0).then(|| {
                (code as i64).wrapping_sub(1).wrapping_add(layout.delta) as f64 / multiplier
            }))
        })
        .collect()
}

/// `10^precision`. Precisions beyond `f64` range give infinity.
fn multiplier(precision: u32) -> f64 {
    10f64.powi(i32::try_from(precision).unwrap_or(i32::MAX))
}

#[inline]
fn scale(value: f64, multiplier: f64) -> i64 {
    (value * multiplier).round() as i64
}

/// Like `scale`, but `None` when the scaled value is not representable as `i64`.
fn checked_scale(value: f64, multiplier: f64) -> Option<i64> {
    let scaled = (value * multiplier).round();
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    (scaled.is_finite() && scaled >= i64::MIN as f64 && scaled < i64::MAX as f64)
        .then_some(scaled as i64)
}
