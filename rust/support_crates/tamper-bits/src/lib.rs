//! Growable MSB-first bit container shared by all Tamper packs.

pub mod bit_vec;

pub use bit_vec::{BitVec, Bits};
