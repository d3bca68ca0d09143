//! A growable sequence of bits.

use std::fmt;

use tamper_common::{Result, error::Error, verify_arg};

const WORD_BITS: usize = 64;

/// A growable bit sequence with `[u64]` storage and MSB-first layout.
///
/// `BitVec` is the building block of every pack: values are appended with
/// [`BitVec::push`] and [`BitVec::push_bits`], and the final payload is produced
/// by [`BitVec::to_bytes`].
///
/// # Storage Format
///
/// Bits are stored in big-endian order within an array of `u64` words:
/// - Bit 0 corresponds to the most significant bit (MSB) of the first word
/// - Bit 63 corresponds to the least significant bit (LSB) of the first word
/// - Bit 64 corresponds to the MSB of the second word, and so on
///
/// With this layout, `to_bytes` is a plain big-endian dump of the words, so bit 0
/// always lands in the MSB of byte 0 regardless of the word size.
///
/// The number of words allocated is `len.div_ceil(64)`. Any bits beyond the logical
/// length in the final word are guaranteed to be 0, which is what makes the trailing
/// partial byte of [`BitVec::to_bytes`] zero-padded.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct BitVec {
    words: Vec<u64>,
    len: usize,
}

impl BitVec {
    /// Creates an empty bit vector.
    pub fn new() -> BitVec {
        BitVec::default()
    }

    /// Creates an empty bit vector with room for `bits` bits.
    pub fn with_capacity(bits: usize) -> BitVec {
        BitVec {
            words: Vec::with_capacity(bits.div_ceil(WORD_BITS)),
            len: 0,
        }
    }

    /// Creates a bit vector of `len` zero bits.
    pub fn with_len(len: usize) -> BitVec {
        BitVec {
            words: vec![0; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    /// Creates a bit vector of `len` bits from MSB-first packed bytes.
    ///
    /// This is the inverse of [`BitVec::to_bytes`]. Bits of `bytes` beyond `len`
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `bytes` holds fewer than `len` bits.
    pub fn from_msb_bytes(bytes: &[u8], len: usize) -> Result<BitVec> {
        if len > bytes.len() * 8 {
            return Err(Error::invalid_arg(
                "len",
                format!("{len} bits requested from {} bytes", bytes.len()),
            ));
        }
        let mut bits = BitVec::with_len(len);
        let used = &bytes[..len.div_ceil(8)];
        for (word, chunk) in bits.words.iter_mut().zip(used.chunks(8)) {
            let mut buf = [0u8; 8];
            buf[..chunk.len()].copy_from_slice(chunk);
            *word = u64::from_be_bytes(buf);
        }
        bits.mask_tail();
        Ok(bits)
    }

    /// Returns the number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends one bit.
    #[inline]
    pub fn push(&mut self, bit: bool) {
        if self.len % WORD_BITS == 0 {
            self.words.push(0);
        }
        if bit {
            let (word, mask) = Self::position(self.len);
            self.words[word] |= mask;
        }
        self.len += 1;
    }

    /// Appends the low `width` bits of `value`, most significant bit first.
    ///
    /// Bits of `value` above `width` are dropped without notice: callers are
    /// responsible for sizing `width` to the real value range.
    ///
    /// # Panics
    ///
    /// Panics if `width > 64`.
    pub fn push_bits(&mut self, value: u64, width: u32) {
        assert!(width <= 64, "bit width {width} exceeds 64");
        if width == 0 {
            return;
        }
        let width = width as usize;
        let value = value & Self::low_mask(width);

        let offset = self.len % WORD_BITS;
        let word = self.len / WORD_BITS;
        let new_len = self.len + width;
        self.words.resize(new_len.div_ceil(WORD_BITS), 0);

        let free = WORD_BITS - offset;
        if width <= free {
            self.words[word] |= value << (free - width);
        } else {
            let spill = width - free;
            self.words[word] |= value >> spill;
            self.words[word + 1] |= value << (WORD_BITS - spill);
        }
        self.len = new_len;
    }

    /// Appends a byte, MSB first.
    #[inline]
    pub fn push_u8(&mut self, byte: u8) {
        self.push_bits(byte as u64, 8);
    }

    /// Appends a 32-bit integer in big-endian bit order.
    #[inline]
    pub fn push_u32(&mut self, value: u32) {
        self.push_bits(value as u64, 32);
    }

    /// Appends a byte slice, each byte MSB first.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push_u8(byte);
        }
    }

    /// Appends bits from an iterator.
    pub fn extend_bits(&mut self, bits: impl IntoIterator<Item = bool>) {
        for bit in bits {
            self.push(bit);
        }
    }

    /// Returns the bit at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len`.
    #[inline]
    pub fn get(&self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        let (word, mask) = Self::position(index);
        Ok(self.words[word] & mask != 0)
    }

    /// Sets the bit at `index` to `bit`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len`.
    #[inline]
    pub fn set(&mut self, index: usize, bit: bool) -> Result<()> {
        self.check_index(index)?;
        let (word, mask) = Self::position(index);
        if bit {
            self.words[word] |= mask;
        } else {
            self.words[word] &= !mask;
        }
        Ok(())
    }

    /// Resets the bit at `index` to 0.
    pub fn clear_bit(&mut self, index: usize) -> Result<()> {
        self.set(index, false)
    }

    /// Resets all bits to 0, keeping the length.
    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    /// Removes the last bit and returns it.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if the vector is empty.
    pub fn pop(&mut self) -> Result<bool> {
        if self.len == 0 {
            return Err(Error::index_out_of_bounds(0, 0));
        }
        let index = self.len - 1;
        let (word, mask) = Self::position(index);
        let bit = self.words[word] & mask != 0;
        self.words[word] &= !mask;
        self.len = index;
        self.words.truncate(self.len.div_ceil(WORD_BITS));
        Ok(bit)
    }

    /// Changes the length to `len`, appending zero bits or dropping trailing bits.
    pub fn resize(&mut self, len: usize) {
        self.words.resize(len.div_ceil(WORD_BITS), 0);
        self.len = len;
        self.mask_tail();
    }

    /// Reads `width` bits starting at `start` as an unsigned integer, MSB first.
    ///
    /// This is the read-side counterpart of [`BitVec::push_bits`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `width > 64`, and `IndexOutOfBounds` if the
    /// range `start..start + width` is not fully inside the vector.
    pub fn read_bits(&self, start: usize, width: u32) -> Result<u64> {
        verify_arg!(width, width <= 64);
        let width = width as usize;
        let end = start.saturating_add(width);
        if end > self.len {
            return Err(Error::index_out_of_bounds(end - 1, self.len));
        }
        if width == 0 {
            return Ok(0);
        }

        let offset = start % WORD_BITS;
        let word = start / WORD_BITS;
        let avail = WORD_BITS - offset;
        if width <= avail {
            Ok((self.words[word] << offset) >> (WORD_BITS - width))
        } else {
            let spill = width - avail;
            let high = self.words[word] & Self::low_mask(avail);
            let low = self.words[word + 1] >> (WORD_BITS - spill);
            Ok((high << spill) | low)
        }
    }

    /// Returns the number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Materializes the bits as bytes, MSB first.
    ///
    /// The result has exactly `len.div_ceil(8)` bytes; the unused low bits of the
    /// final byte are zero.
    pub fn to_bytes(&self) -> Vec<u8> {
        let byte_len = self.len.div_ceil(8);
        let mut bytes = Vec::with_capacity(self.words.len() * 8);
        for word in &self.words {
            bytes.extend_from_slice(&word.to_be_bytes());
        }
        bytes.truncate(byte_len);
        bytes
    }

    /// Returns an iterator over the bits in order.
    pub fn iter(&self) -> Bits<'_> {
        Bits {
            bits: self,
            pos: 0,
        }
    }

    #[inline]
    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.len {
            Ok(())
        } else {
            Err(Error::index_out_of_bounds(index, self.len))
        }
    }

    #[inline]
    fn position(index: usize) -> (usize, u64) {
        let word = index / WORD_BITS;
        let mask = 1u64 << (WORD_BITS - 1 - index % WORD_BITS);
        (word, mask)
    }

    #[inline]
    fn low_mask(width: usize) -> u64 {
        if width >= WORD_BITS {
            u64::MAX
        } else {
            (1u64 << width) - 1
        }
    }

    /// Zeroes the bits of the last word that lie beyond `len`.
    fn mask_tail(&mut self) {
        let used = self.len % WORD_BITS;
        if used != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= !(u64::MAX >> used);
            }
        }
    }
}

impl Extend<bool> for BitVec {
    fn extend<I: IntoIterator<Item = bool>>(&mut self, iter: I) {
        self.extend_bits(iter);
    }
}

impl FromIterator<bool> for BitVec {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut bits = BitVec::new();
        bits.extend_bits(iter);
        bits
    }
}

impl<'a> IntoIterator for &'a BitVec {
    type Item = bool;
    type IntoIter = Bits<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the bits of a [`BitVec`].
pub struct Bits<'a> {
    bits: &'a BitVec,
    pos: usize,
}

impl Iterator for Bits<'_> {
    type Item = bool;

    #[inline]
    fn next(&mut self) -> Option<bool> {
        if self.pos >= self.bits.len {
            return None;
        }
        let (word, mask) = BitVec::position(self.pos);
        self.pos += 1;
        Some(self.bits.words[word] & mask != 0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bits.len - self.pos;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Bits<'_> {}

/// Renders the bits as a string of `0` and `1` characters.
impl fmt::Display for BitVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitVec({}, \"{self}\")", self.len)
    }
}
