//! Existence pack: encoding of the ascending guid set.
//!
//! The guid set is described by a sequence of blocks, each consuming a stretch of
//! guid space starting where the previous block ended (the first block starts at
//! guid 0):
//!
//! - [`ExistenceBlock::Bitmap`]: one bit per guid, set when the guid is present.
//! - [`ExistenceBlock::Skip`]: a stretch of absent guids.
//! - [`ExistenceBlock::Run`]: a stretch of present guids.
//!
//! A gap of [`THRESHOLD`] or more absent guids becomes a skip block and a run of
//! more than [`THRESHOLD`] present guids becomes a run block; anything shorter
//! stays in the bitmap, where it costs less than a 5-byte block. Skips and runs
//! longer than `u32::MAX` are split into consecutive blocks of the same kind.
//!
//! Serialized form, blocks concatenated:
//!
//! | block  | control | body                                          |
//! |--------|---------|-----------------------------------------------|
//! | Bitmap | `0`     | 5-byte pack header, then MSB-first bitmap bytes |
//! | Skip   | `1`     | big-endian `u32` length                        |
//! | Run    | `2`     | big-endian `u32` length                        |

use byteorder::{BigEndian, ByteOrder};
use tamper_bits::BitVec;
use tamper_common::{Result, error::Error};

use crate::header::{read_bit_block, write_bit_block};

/// Longest gap or run kept inside a bitmap block.
pub const THRESHOLD: u64 = 40;

const BITMAP_CONTROL: u8 = 0;
const SKIP_CONTROL: u8 = 1;
const RUN_CONTROL: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistenceBlock {
    Bitmap(BitVec),
    Skip(u32),
    Run(u32),
}

impl ExistenceBlock {
    /// Number of guids (present or not) covered by this block.
    pub fn span(&self) -> u64 {
        match self {
            ExistenceBlock::Bitmap(bits) => bits.len() as u64,
            ExistenceBlock::Skip(len) | ExistenceBlock::Run(len) => *len as u64,
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            ExistenceBlock::Bitmap(bits) => {
                out.push(BITMAP_CONTROL);
                write_bit_block(bits, out)?;
            }
            ExistenceBlock::Skip(len) => {
                out.push(SKIP_CONTROL);
                write_u32(*len, out);
            }
            ExistenceBlock::Run(len) => {
                out.push(RUN_CONTROL);
                write_u32(*len, out);
            }
        }
        Ok(())
    }

    /// Serializes a block sequence.
    pub fn write_all(blocks: &[ExistenceBlock]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for block in blocks {
            block.write(&mut out)?;
        }
        Ok(out)
    }

    /// Parses a serialized block sequence.
    pub fn read_all(mut bytes: &[u8]) -> Result<Vec<ExistenceBlock>> {
        let mut blocks = Vec::new();
        while let Some((&control, rest)) = bytes.split_first() {
            let (block, rest) = match control {
                BITMAP_CONTROL => {
                    let (bits, rest) = read_bit_block(rest)?;
                    (ExistenceBlock::Bitmap(bits), rest)
                }
                SKIP_CONTROL => {
                    let (len, rest) = read_u32(rest)?;
                    (ExistenceBlock::Skip(len), rest)
                }
                RUN_CONTROL => {
                    let (len, rest) = read_u32(rest)?;
                    (ExistenceBlock::Run(len), rest)
                }
                other => {
                    return Err(Error::invalid_format(
                        "existence",
                        format!("unknown control code {other}"),
                    ));
                }
            };
            blocks.push(block);
            bytes = rest;
        }
        Ok(blocks)
    }
}

/// Builds the block sequence for an ascending guid sequence, one guid at a time.
///
/// Guids accumulate in the current chunk as bits. A trailing run of present guids
/// is tracked separately so it can be split off as a [`ExistenceBlock::Run`] once
/// it exceeds [`THRESHOLD`].
#[derive(Debug, Default)]
pub struct ExistenceBuilder {
    blocks: Vec<ExistenceBlock>,
    chunk: BitVec,
    run: u64,
    last: Option<u64>,
}

impl ExistenceBuilder {
    pub fn new() -> ExistenceBuilder {
        ExistenceBuilder::default()
    }

    /// Adds the next guid.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `guid` is not greater than the previous guid.
    pub fn push(&mut self, guid: u64) -> Result<()> {
        let diff = match self.last {
            None => guid.checked_add(1),
            Some(last) if guid > last => Some(guid - last),
            Some(last) => {
                return Err(Error::invalid_arg(
                    "guid",
                    format!("guids must be strictly ascending: {guid} follows {last}"),
                ));
            }
        }
        .ok_or_else(|| Error::invalid_arg("guid", format!("guid {guid} is out of range")))?;

        if diff == 1 {
            self.chunk.push(true);
            self.run += 1;
        } else if diff > THRESHOLD {
            self.flush();
            push_split(&mut self.blocks, diff - 1, ExistenceBlock::Skip);
            self.chunk.push(true);
            self.run = 1;
        } else {
            if self.run > THRESHOLD {
                self.flush();
            }
            self.chunk.resize(self.chunk.len() + (diff - 1) as usize);
            self.chunk.push(true);
            self.run = 1;
        }
        self.last = Some(guid);
        Ok(())
    }

    /// Flushes the pending chunk and returns the block sequence.
    pub fn finish(mut self) -> Vec<ExistenceBlock> {
        self.flush();
        self.blocks
    }

    /// Emits the current chunk: the bits before a trailing run longer than
    /// [`THRESHOLD`] become a bitmap and the run becomes a run block; otherwise
    /// the whole chunk becomes a bitmap. Leaves the chunk empty.
    fn flush(&mut self) {
        let mut chunk = std::mem::take(&mut self.chunk);
        let run = std::mem::take(&mut self.run);
        if run > THRESHOLD {
            chunk.resize(chunk.len() - run as usize);
            if !chunk.is_empty() {
                self.blocks.push(ExistenceBlock::Bitmap(chunk));
            }
            push_split(&mut self.blocks, run, ExistenceBlock::Run);
        } else if !chunk.is_empty() {
            self.blocks.push(ExistenceBlock::Bitmap(chunk));
        }
    }
}

/// Encodes a strictly ascending guid sequence into existence blocks.
///
/// # Errors
///
/// Returns `InvalidArgument` if the guids are not strictly ascending.
pub fn pack_existence(guids: &[u64]) -> Result<Vec<ExistenceBlock>> {
    let mut builder = ExistenceBuilder::new();
    for &guid in guids {
        builder.push(guid)?;
    }
    let blocks = builder.finish();
    log::debug!(
        "existence: {} guids -> {} blocks",
        guids.len(),
        blocks.len()
    );
    Ok(blocks)
}

/// Expands a block sequence back into the ascending guid sequence.
pub fn decode_blocks(blocks: &[ExistenceBlock]) -> Vec<u64> {
    let mut guids = Vec::new();
    let mut cursor = 0u64;
    for block in blocks {
        match block {
            ExistenceBlock::Bitmap(bits) => {
                for bit in bits {
                    if bit {
                        guids.push(cursor);
                    }
                    cursor += 1;
                }
            }
            ExistenceBlock::Skip(len) => cursor += *len as u64,
            ExistenceBlock::Run(len) => {
                let end = cursor + *len as u64;
                guids.extend(cursor..end);
                cursor = end;
            }
        }
    }
    guids
}

/// Parses and expands a serialized block sequence.
pub fn decode_existence_bytes(bytes: &[u8]) -> Result<Vec<u64>> {
    Ok(decode_blocks(&ExistenceBlock::read_all(bytes)?))
}

/// Pushes `len` as blocks built by `block`, none longer than `u32::MAX`.
fn push_split(blocks: &mut Vec<ExistenceBlock>, mut len: u64, block: fn(u32) -> ExistenceBlock) {
    while len > 0 {
        let part = len.min(u32::MAX as u64);
        blocks.push(block(part as u32));
        len -= part;
    }
}

fn write_u32(value: u32, out: &mut Vec<u8>) {
    let mut buf = [0u8; 4];
    BigEndian::write_u32(&mut buf, value);
    out.extend_from_slice(&buf);
}

fn read_u32(bytes: &[u8]) -> Result<(u32, &[u8])> {
    if bytes.len() < 4 {
        return Err(Error::invalid_format(
            "existence",
            format!("block length truncated: {} bytes left", bytes.len()),
        ));
    }
    Ok((BigEndian::read_u32(&bytes[..4]), &bytes[4..]))
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use tamper_bits::BitVec;

    use super::{
        ExistenceBlock, ExistenceBuilder, decode_blocks, decode_existence_bytes, pack_existence,
    };

    fn bitmap(s: &str) -> ExistenceBlock {
        ExistenceBlock::Bitmap(s.chars().map(|c| c == '1').collect::<BitVec>())
    }

    fn round_trip(guids: &[u64]) -> Vec<ExistenceBlock> {
        let blocks = pack_existence(guids).unwrap();
        assert_eq!(decode_blocks(&blocks), guids);
        let bytes = ExistenceBlock::write_all(&blocks).unwrap();
        assert_eq!(ExistenceBlock::read_all(&bytes).unwrap(), blocks);
        assert_eq!(decode_existence_bytes(&bytes).unwrap(), guids);
        blocks
    }

    #[test]
    fn test_empty() {
        assert!(round_trip(&[]).is_empty());
        assert!(ExistenceBlock::write_all(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_single_zero() {
        assert_eq!(round_trip(&[0]), vec![bitmap("1")]);
    }

    #[test]
    fn test_leading_gap() {
        assert_eq!(round_trip(&[3, 4]), vec![bitmap("00011")]);
        assert_eq!(
            round_trip(&[41]),
            vec![ExistenceBlock::Skip(41), bitmap("1")]
        );
        assert_eq!(
            round_trip(&[40]),
            vec![ExistenceBlock::Skip(40), bitmap("1")]
        );
        assert_eq!(round_trip(&[39]), vec![bitmap(&format!("{}1", "0".repeat(39)))]);
    }

    #[test]
    fn test_run_threshold() {
        let run_41 = (0..41).collect_vec();
        assert_eq!(round_trip(&run_41), vec![ExistenceBlock::Run(41)]);

        let run_40 = (0..40).collect_vec();
        assert_eq!(round_trip(&run_40), vec![bitmap(&"1".repeat(40))]);
    }

    #[test]
    fn test_gap_threshold() {
        // 0 then 41: 40 guids missing, diff = 41
        assert_eq!(
            round_trip(&[0, 41]),
            vec![bitmap("1"), ExistenceBlock::Skip(40), bitmap("1")]
        );
        // 0 then 40: 39 guids missing, kept as zero bits
        assert_eq!(
            round_trip(&[0, 40]),
            vec![bitmap(&format!("1{}1", "0".repeat(39)))]
        );
    }

    #[test]
    fn test_run_then_small_gap() {
        // 0, then a run of 45 present guids starting at 3, then a small gap.
        let mut guids = vec![0, 3];
        guids.extend(4..48);
        guids.push(50);
        let blocks = round_trip(&guids);
        assert_eq!(
            blocks,
            vec![bitmap("100"), ExistenceBlock::Run(45), bitmap("001")]
        );
    }

    #[test]
    fn test_run_then_large_gap() {
        let mut guids = (10..70).collect_vec();
        guids.push(500);
        let blocks = round_trip(&guids);
        assert_eq!(
            blocks,
            vec![
                bitmap(&"0".repeat(10)),
                ExistenceBlock::Run(60),
                ExistenceBlock::Skip(430),
                bitmap("1"),
            ]
        );
    }

    #[test]
    fn test_trailing_run() {
        let mut guids = vec![1];
        guids.extend(5..100);
        let blocks = round_trip(&guids);
        assert_eq!(
            blocks,
            vec![bitmap("01000"), ExistenceBlock::Run(95)]
        );
    }

    #[test]
    fn test_long_skip_is_split() {
        let far = 1u64 << 33;
        let blocks = round_trip(&[0, far]);
        let max = ExistenceBlock::Skip(u32::MAX);
        assert_eq!(
            blocks,
            vec![
                bitmap("1"),
                max.clone(),
                max,
                ExistenceBlock::Skip(1),
                bitmap("1"),
            ]
        );
        let span: u64 = blocks.iter().map(ExistenceBlock::span).sum();
        assert_eq!(span, far + 1);
    }

    #[test]
    fn test_serialized_layout() {
        let blocks = vec![bitmap("101"), ExistenceBlock::Skip(258), ExistenceBlock::Run(41)];
        let bytes = ExistenceBlock::write_all(&blocks).unwrap();
        assert_eq!(
            bytes,
            vec![
                0, 0, 0, 0, 0, 3, 0b1010_0000, //
                1, 0, 0, 1, 2, //
                2, 0, 0, 0, 41,
            ]
        );
    }

    #[test]
    fn test_read_rejects_malformed() {
        assert!(ExistenceBlock::read_all(&[7]).is_err());
        assert!(ExistenceBlock::read_all(&[1, 0, 0]).is_err());
        assert!(ExistenceBlock::read_all(&[0, 0, 0, 0, 1, 0]).is_err());
    }

    #[test]
    fn test_rejects_non_ascending() {
        let mut builder = ExistenceBuilder::new();
        builder.push(5).unwrap();
        assert!(builder.push(5).is_err());
        assert!(builder.push(2).is_err());
        assert!(pack_existence(&[u64::MAX]).is_err());
    }

    #[test]
    fn test_random_round_trip() {
        for _ in 0..200 {
            let len = fastrand::usize(0..500);
            let mut guid = 0u64;
            let mut guids = Vec::with_capacity(len);
            for _ in 0..len {
                // Mix of dense stretches, short gaps and long gaps.
                guid += match fastrand::u8(0..10) {
                    0..=5 => 1,
                    6..=8 => fastrand::u64(2..=45),
                    _ => fastrand::u64(1..2000),
                };
                guids.push(guid);
            }
            if fastrand::bool() && !guids.is_empty() {
                guids[0] = 0;
                guids.dedup();
            }
            let blocks = round_trip(&guids);
            for pair in blocks.windows(2) {
                if let [ExistenceBlock::Run(_), ExistenceBlock::Run(_)] = pair {
                    panic!("adjacent run blocks: {blocks:?}");
                }
            }
            for block in &blocks {
                match block {
                    ExistenceBlock::Run(len) => assert!(*len > 40),
                    ExistenceBlock::Skip(len) => assert!(*len >= 40),
                    ExistenceBlock::Bitmap(bits) => assert!(!bits.is_empty()),
                }
            }
        }
    }
}
