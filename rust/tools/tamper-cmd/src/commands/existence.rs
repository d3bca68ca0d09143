//! Existence command implementation

use anyhow::{Context, Result};
use tamper::{ExistenceBlock, ExistencePack, pack_existence};

pub fn run(guids: Vec<u64>) -> Result<()> {
    let blocks = pack_existence(&guids).context("Failed to encode guids")?;
    for block in &blocks {
        println!("{}", describe(block));
    }
    let pack = ExistencePack::from_blocks(&blocks)?;
    println!("pack: {}", pack.pack);
    Ok(())
}

/// One-line rendering of a block.
pub fn describe(block: &ExistenceBlock) -> String {
    match block {
        ExistenceBlock::Bitmap(bits) => format!("bitmap {bits}"),
        ExistenceBlock::Skip(len) => format!("skip {len}"),
        ExistenceBlock::Run(len) => format!("run {len}"),
    }
}
