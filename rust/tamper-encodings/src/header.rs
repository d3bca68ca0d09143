//! Length header framing every packed bit payload.
//!
//! Layout (5 bytes, followed by the payload):
//!
//! | offset | size | field                                   |
//! |--------|------|-----------------------------------------|
//! | 0      | 4    | full payload bytes, big-endian `u32`    |
//! | 4      | 1    | bits in the trailing partial byte (0-7) |

use byteorder::{BigEndian, ByteOrder};
use tamper_bits::BitVec;
use tamper_common::{Result, error::Error, verify_data};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackHeader {
    pub full_bytes: u32,
    pub remainder_bits: u8,
}

impl PackHeader {
    pub const SIZE: usize = 5;

    /// Header describing a payload of `bit_count` bits.
    pub fn for_bit_count(bit_count: usize) -> Result<PackHeader> {
        let full_bytes = u32::try_from(bit_count / 8).map_err(|_| {
            Error::invalid_arg("bit_count", format!("{bit_count} bits exceed the header range"))
        })?;
        Ok(PackHeader {
            full_bytes,
            remainder_bits: (bit_count % 8) as u8,
        })
    }

    /// Number of payload bits described by this header.
    pub fn bit_count(&self) -> usize {
        self.full_bytes as usize * 8 + self.remainder_bits as usize
    }

    /// Number of payload bytes following the header.
    pub fn byte_len(&self) -> usize {
        self.full_bytes as usize + usize::from(self.remainder_bits != 0)
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        let mut buf = [0u8; 4];
        BigEndian::write_u32(&mut buf, self.full_bytes);
        out.extend_from_slice(&buf);
        out.push(self.remainder_bits);
    }

    /// Parses a header from the start of `bytes`, returning it along with the
    /// bytes that follow it.
    pub fn read(bytes: &[u8]) -> Result<(PackHeader, &[u8])> {
        verify_data!(pack_header, bytes.len() >= PackHeader::SIZE);
        let header = PackHeader {
            full_bytes: BigEndian::read_u32(&bytes[..4]),
            remainder_bits: bytes[4],
        };
        verify_data!(remainder_bits, header.remainder_bits < 8);
        Ok((header, &bytes[PackHeader::SIZE..]))
    }
}

/// Appends `bits` to `out` as a header followed by the MSB-first payload bytes.
pub fn write_bit_block(bits: &BitVec, out: &mut Vec<u8>) -> Result<()> {
    PackHeader::for_bit_count(bits.len())?.write(out);
    out.extend_from_slice(&bits.to_bytes());
    Ok(())
}

/// Reads a header-framed bit payload from the start of `bytes`.
///
/// Returns the payload bits and the bytes that follow the payload.
pub fn read_bit_block(bytes: &[u8]) -> Result<(BitVec, &[u8])> {
    let (header, rest) = PackHeader::read(bytes)?;
    let byte_len = header.byte_len();
    if rest.len() < byte_len {
        return Err(Error::invalid_format(
            "pack",
            format!(
                "payload truncated: header announces {byte_len} bytes, {} available",
                rest.len()
            ),
        ));
    }
    let bits = BitVec::from_msb_bytes(&rest[..byte_len], header.bit_count())?;
    Ok((bits, &rest[byte_len..]))
}
