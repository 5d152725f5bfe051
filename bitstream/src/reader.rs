//! Bit-level reader with bounded operations.

use crate::error::{BitError, BitResult};
use crate::half::f16_to_f32;

/// A bit-level reader for decoding packed binary data.
///
/// All read operations are bounds-checked and return errors on failure.
/// The reader never panics on malformed input.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new `BitReader` from a byte slice.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Returns the number of bits remaining to read.
    #[must_use]
    pub const fn bits_remaining(&self) -> usize {
        self.data
            .len()
            .saturating_mul(8)
            .saturating_sub(self.bit_pos)
    }

    /// Returns the number of whole bytes remaining to read.
    #[must_use]
    pub const fn bytes_remaining(&self) -> usize {
        self.bits_remaining() / 8
    }

    /// Returns `true` if there are no more bits to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits_remaining() == 0
    }

    /// Returns the current bit position.
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.bit_pos
    }

    /// Reads a single bit as a boolean.
    pub fn read_bit(&mut self) -> BitResult<bool> {
        self.ensure_bits(1)?;
        let byte = self.data[self.bit_pos / 8];
        let bit = (byte >> (7 - self.bit_pos % 8)) & 1;
        self.bit_pos += 1;
        Ok(bit == 1)
    }

    /// Reads up to 64 bits as an unsigned integer.
    pub fn read_bits(&mut self, bits: u8) -> BitResult<u64> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount { bits, max_bits: 64 });
        }
        self.ensure_bits(usize::from(bits))?;
        let mut value = 0u64;
        for _ in 0..bits {
            value = (value << 1) | u64::from(self.read_bit()?);
        }
        Ok(value)
    }

    /// Skips to the next byte boundary.
    pub fn align_to_byte(&mut self) -> BitResult<()> {
        let rem = self.bit_pos % 8;
        if rem == 0 {
            return Ok(());
        }
        let skip = 8 - rem;
        self.ensure_bits(skip)?;
        self.bit_pos += skip;
        Ok(())
    }

    /// Reads a byte-aligned `u8`.
    pub fn read_u8_aligned(&mut self) -> BitResult<u8> {
        let [value] = self.read_aligned_bytes::<1>()?;
        Ok(value)
    }

    /// Reads a byte-aligned `u16` (little-endian).
    pub fn read_u16_aligned(&mut self) -> BitResult<u16> {
        self.read_aligned_bytes().map(u16::from_le_bytes)
    }

    /// Reads a byte-aligned `u32` (little-endian).
    pub fn read_u32_aligned(&mut self) -> BitResult<u32> {
        self.read_aligned_bytes().map(u32::from_le_bytes)
    }

    /// Reads a byte-aligned `i32` (little-endian).
    pub fn read_i32_aligned(&mut self) -> BitResult<i32> {
        self.read_aligned_bytes().map(i32::from_le_bytes)
    }

    /// Reads a byte-aligned `f32` (little-endian).
    pub fn read_f32_aligned(&mut self) -> BitResult<f32> {
        self.read_u32_aligned().map(f32::from_bits)
    }

    /// Reads a byte-aligned half float and widens it to `f32`.
    pub fn read_f16_aligned(&mut self) -> BitResult<f32> {
        self.read_u16_aligned().map(f16_to_f32)
    }

    fn ensure_aligned(&self) -> BitResult<()> {
        if self.bit_pos % 8 != 0 {
            return Err(BitError::MisalignedAccess {
                bit_position: self.bit_pos,
            });
        }
        Ok(())
    }

    fn ensure_bits(&self, bits: usize) -> BitResult<()> {
        let available = self.bits_remaining();
        if bits > available {
            return Err(BitError::UnexpectedEof {
                requested: bits,
                available,
            });
        }
        Ok(())
    }

    fn read_aligned_bytes<const N: usize>(&mut self) -> BitResult<[u8; N]> {
        self.ensure_aligned()?;
        self.ensure_bits(N * 8)?;
        let idx = self.bit_pos / 8;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[idx..idx + N]);
        self.bit_pos += N * 8;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reader() {
        let reader = BitReader::new(&[]);
        assert!(reader.is_empty());
        assert_eq!(reader.bits_remaining(), 0);
        assert_eq!(reader.bit_position(), 0);
    }

    #[test]
    fn read_from_empty_fails() {
        let mut reader = BitReader::new(&[]);
        assert!(matches!(
            reader.read_bit(),
            Err(BitError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn read_bits_across_bytes() {
        let mut reader = BitReader::new(&[0b1111_0000, 0b0000_1111]);
        assert_eq!(reader.read_bits(12).unwrap(), 0b1111_0000_0000);
        assert_eq!(reader.bits_remaining(), 4);
    }

    #[test]
    fn read_bits_too_many_does_not_advance() {
        let mut reader = BitReader::new(&[0xFF]);
        let err = reader.read_bits(9).unwrap_err();
        assert_eq!(
            err,
            BitError::UnexpectedEof {
                requested: 9,
                available: 8
            }
        );
        assert_eq!(reader.bit_position(), 0);
    }

    #[test]
    fn read_aligned_values() {
        let mut reader = BitReader::new(&[0x78, 0x56, 0x34, 0x12, 0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(reader.read_u32_aligned().unwrap(), 0x1234_5678);
        assert_eq!(reader.read_i32_aligned().unwrap(), -2);
        assert!(reader.is_empty());
    }

    #[test]
    fn read_floats() {
        let mut reader = BitReader::new(&[0x00, 0x00, 0x80, 0x3F, 0x00, 0xC0]);
        assert_eq!(reader.read_f32_aligned().unwrap(), 1.0);
        assert_eq!(reader.read_f16_aligned().unwrap(), -2.0);
    }

    #[test]
    fn truncated_aligned_read_fails() {
        let mut reader = BitReader::new(&[0x01, 0x02, 0x03]);
        assert!(matches!(
            reader.read_f32_aligned(),
            Err(BitError::UnexpectedEof {
                requested: 32,
                available: 24
            })
        ));
        assert_eq!(reader.bytes_remaining(), 3);
    }

    #[test]
    fn read_misaligned_fails() {
        let mut reader = BitReader::new(&[0xFF, 0xFF]);
        reader.read_bits(1).unwrap();
        let err = reader.read_u8_aligned().unwrap_err();
        assert!(matches!(err, BitError::MisalignedAccess { .. }));
        reader.align_to_byte().unwrap();
        assert_eq!(reader.read_u8_aligned().unwrap(), 0xFF);
    }
}
