//! Printable-text wrapping of packed bytes.
//!
//! Only the binary layout is part of the format contract; the text layer is
//! standard base64 with padding.

use base64::{Engine, engine::general_purpose::STANDARD};
use tamper_common::Result;

pub fn encode_text(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_text(text: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(text)?)
}
