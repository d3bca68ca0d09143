//! The packed document and its JSON form.

use serde::{Deserialize, Serialize};
use tamper_common::{Result, error::Error, verify_data};
use tamper_encodings::{
    DecodedColumn, EncodedAttribute, ExistenceBlock,
    existence::decode_existence_bytes,
    text::{decode_text, encode_text},
};

/// Format tag written to every document.
pub const FORMAT_VERSION: &str = "2.1";

/// Encoding name of the existence pack.
pub const EXISTENCE_ENCODING: &str = "existence";

/// A packed dataset: the guid set plus one encoded pack per attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: String,
    pub existence: ExistencePack,
    /// In order of first appearance in the input rows.
    #[serde(default)]
    pub attributes: Vec<EncodedAttribute>,
}

/// The encoded guid set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistencePack {
    pub encoding: String,
    /// Base64 text of the control-tagged block stream.
    pub pack: String,
}

impl ExistencePack {
    pub fn from_blocks(blocks: &[ExistenceBlock]) -> Result<ExistencePack> {
        let bytes = ExistenceBlock::write_all(blocks)?;
        Ok(ExistencePack {
            encoding: EXISTENCE_ENCODING.to_string(),
            pack: encode_text(&bytes),
        })
    }

    pub fn blocks(&self) -> Result<Vec<ExistenceBlock>> {
        ExistenceBlock::read_all(&decode_text(&self.pack)?)
    }

    pub fn decode_guids(&self) -> Result<Vec<u64>> {
        decode_existence_bytes(&decode_text(&self.pack)?)
    }
}

impl Document {
    pub fn new(existence: ExistencePack, attributes: Vec<EncodedAttribute>) -> Document {
        Document {
            version: FORMAT_VERSION.to_string(),
            existence,
            attributes,
        }
    }

    /// Parses a document, rejecting unknown format versions.
    pub fn from_json(json: &str) -> Result<Document> {
        let document: Document = serde_json::from_str(json)?;
        verify_data!(version, document.version == FORMAT_VERSION);
        verify_data!(
            existence_encoding,
            document.existence.encoding == EXISTENCE_ENCODING
        );
        Ok(document)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn attribute(&self, attr_name: &str) -> Option<&EncodedAttribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.attr_name == attr_name)
    }

    /// The guids present in the dataset, ascending.
    pub fn decode_guids(&self) -> Result<Vec<u64>> {
        self.existence.decode_guids()
    }

    /// Decodes the values of attribute `attr_name` for the first `row_count` rows.
    ///
    /// The row count of a document is the number of guids it holds.
    pub fn decode_attribute(&self, attr_name: &str, row_count: usize) -> Result<DecodedColumn> {
        let attribute = self
            .attribute(attr_name)
            .ok_or_else(|| Error::invalid_arg("attr_name", format!("no attribute '{attr_name}'")))?;
        attribute.decode(row_count)
    }
}
