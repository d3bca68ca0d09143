//! Tamper packs: the categorical and numeric attribute encodings, the existence
//! (guid set) encoding and the binary framing they share.

pub mod attribute;
pub mod existence;
pub mod header;
pub mod possibilities;
pub mod text;
pub mod value;

pub use attribute::{
    AttributeEncoding, AttributePack, DecodedColumn, EncodedAttribute, PackLayout,
    bitmap::BitmapPack, integer::IntegerPack, numeric::NumericPack, numeric::NumericPackOptions,
};
pub use existence::{ExistenceBlock, ExistenceBuilder, pack_existence};
pub use possibilities::Possibilities;
pub use value::{Number, Value};
