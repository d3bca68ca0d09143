//! Command implementations for tamper-cmd

pub mod existence;
pub mod inspect;
pub mod pack;
