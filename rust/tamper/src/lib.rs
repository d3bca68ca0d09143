//! Tamper: columnar packing of small tabular datasets.
//!
//! Rows are keyed by a strictly ascending `guid` and carry named categorical or
//! numeric attributes. [`pack`] scans the rows once, picks an encoding per
//! attribute and produces a [`Document`] whose binary payloads a remote decoder
//! can read back with little parsing.
//!
//! ```
//! use tamper::{Row, pack, PackOptions};
//!
//! let rows = vec![
//!     Row::new(1).with("int", 1).with("float", 0.5).with("category", "first"),
//!     Row::new(2).with("int", 4).with("float", 1.3).with("category", "second"),
//!     Row::new(5).with("int", 8).with("float", 2.8).with("category", "first"),
//! ];
//! let document = pack(&rows, &PackOptions::new().with_precision("float", 1)).unwrap();
//! assert_eq!(document.version, "2.1");
//! assert_eq!(document.decode_guids().unwrap(), vec![1, 2, 5]);
//! assert_eq!(document.attributes.len(), 3);
//! ```

pub mod document;
pub mod inference;
pub mod options;
pub mod packer;
pub mod row;
pub mod selection;

pub use document::{Document, ExistencePack, FORMAT_VERSION};
pub use options::PackOptions;
pub use packer::{Packer, pack};
pub use row::Row;
pub use tamper_encodings::{
    AttributeEncoding, DecodedColumn, EncodedAttribute, ExistenceBlock, Number, PackLayout, Value,
    pack_existence,
};
