//! Bounds-checked access to the immutable source buffer.
//!
//! [`ByteBuffer`] wraps a reference-counted [`Bytes`] so that every decode
//! function can share one read-only copy of the input. All multi-byte reads
//! take an explicit [`Endianness`]; the host byte order is never consulted.
//!
//! Offsets and lengths arrive as signed integers because they are parsed from
//! template arguments. Any negative value, or any range that ends past the
//! buffer, is rejected with [`Error::OutOfRange`] instead of being clamped.

use crate::error::{Error, Result};
use bytes::{Buf, Bytes};
use std::path::Path;
use tracing::trace;

/// Byte order used to interpret a multi-byte field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// Least-significant byte first
    Little,
    /// Most-significant byte first
    Big,
}

/// Immutable byte buffer shared by all decode calls of one run
#[derive(Debug, Clone, Default)]
pub struct ByteBuffer {
    data: Bytes,
}

impl ByteBuffer {
    /// Creates a buffer from owned or static bytes
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Reads a whole file into a buffer
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
        trace!("Loaded {} bytes from {}", data.len(), path.display());
        Ok(Self::new(data))
    }

    /// Number of bytes in the buffer
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the whole buffer as a slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns `length` bytes starting at `offset`.
    ///
    /// A zero-length range is valid anywhere in `0..=len`.
    pub fn read_range(&self, offset: i64, length: i64) -> Result<&[u8]> {
        let out_of_range = || Error::out_of_range(offset, length, self.data.len());

        let start = usize::try_from(offset).map_err(|_| out_of_range())?;
        let count = usize::try_from(length).map_err(|_| out_of_range())?;
        let end = start.checked_add(count).ok_or_else(out_of_range)?;

        self.data.get(start..end).ok_or_else(out_of_range)
    }

    /// Returns the raw bytes of a fixed-width field, in storage order
    pub fn read_fixed(&self, offset: i64, width: usize) -> Result<&[u8]> {
        debug_assert!(matches!(width, 1 | 2 | 4 | 8));
        self.read_range(offset, width as i64)
    }

    /// Reads a two's-complement 16-bit integer
    pub fn read_i16(&self, offset: i64, endianness: Endianness) -> Result<i16> {
        let mut raw = self.read_fixed(offset, 2)?;
        Ok(match endianness {
            Endianness::Little => raw.get_i16_le(),
            Endianness::Big => raw.get_i16(),
        })
    }

    /// Reads a two's-complement 32-bit integer
    pub fn read_i32(&self, offset: i64, endianness: Endianness) -> Result<i32> {
        let mut raw = self.read_fixed(offset, 4)?;
        Ok(match endianness {
            Endianness::Little => raw.get_i32_le(),
            Endianness::Big => raw.get_i32(),
        })
    }

    /// Reads a two's-complement 64-bit integer
    pub fn read_i64(&self, offset: i64, endianness: Endianness) -> Result<i64> {
        let mut raw = self.read_fixed(offset, 8)?;
        Ok(match endianness {
            Endianness::Little => raw.get_i64_le(),
            Endianness::Big => raw.get_i64(),
        })
    }

    /// Reads an unsigned 32-bit integer widened to 64 bits
    pub fn read_u32_widened(&self, offset: i64, endianness: Endianness) -> Result<u64> {
        let mut raw = self.read_fixed(offset, 4)?;
        let value = match endianness {
            Endianness::Little => raw.get_u32_le(),
            Endianness::Big => raw.get_u32(),
        };
        Ok(u64::from(value))
    }

    /// Reads an IEEE-754 single precision float
    pub fn read_f32(&self, offset: i64, endianness: Endianness) -> Result<f32> {
        let mut raw = self.read_fixed(offset, 4)?;
        Ok(match endianness {
            Endianness::Little => raw.get_f32_le(),
            Endianness::Big => raw.get_f32(),
        })
    }

    /// Reads an IEEE-754 double precision float
    pub fn read_f64(&self, offset: i64, endianness: Endianness) -> Result<f64> {
        let mut raw = self.read_fixed(offset, 8)?;
        Ok(match endianness {
            Endianness::Little => raw.get_f64_le(),
            Endianness::Big => raw.get_f64(),
        })
    }

    /// Reads one unsigned byte
    pub fn read_u8(&self, offset: i64) -> Result<u8> {
        let raw = self.read_fixed(offset, 1)?;
        Ok(raw[0])
    }

    /// Reads one byte as a boolean (non-zero is true)
    pub fn read_bool(&self, offset: i64) -> Result<bool> {
        Ok(self.read_u8(offset)? != 0)
    }

    /// Tests bit `bit` (0 = least significant) of the byte at `offset`.
    ///
    /// Positions outside `0..=7` address bits a byte does not have and read
    /// as unset. The offset is still bounds checked.
    pub fn read_bit(&self, offset: i64, bit: i64) -> Result<bool> {
        let byte = self.read_u8(offset)?;
        match u32::try_from(bit) {
            Ok(shift @ 0..=7) => Ok((byte >> shift) & 1 == 1),
            _ => {
                trace!("Bit position {} outside byte at offset {}", bit, offset);
                Ok(false)
            }
        }
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&'static [u8]> for ByteBuffer {
    fn from(data: &'static [u8]) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn buffer(bytes: &[u8]) -> ByteBuffer {
        ByteBuffer::new(bytes.to_vec())
    }

    #[test]
    fn test_read_range_bounds() {
        let buf = buffer(&[1, 2, 3, 4]);
        assert_eq!(buf.read_range(0, 4).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(buf.read_range(4, 0).unwrap(), &[] as &[u8]);
        assert!(matches!(
            buf.read_range(1, 4),
            Err(Error::OutOfRange {
                offset: 1,
                length: 4,
                available: 4
            })
        ));
        assert!(buf.read_range(5, 0).is_err());
        assert!(buf.read_range(-1, 1).is_err());
        assert!(buf.read_range(0, -1).is_err());
        assert!(buf.read_range(i64::MAX, i64::MAX).is_err());
    }

    #[test]
    fn test_read_i32_both_orders() {
        let buf = buffer(&[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(buf.read_i32(0, Endianness::Little).unwrap(), 0x0403_0201);
        assert_eq!(buf.read_i32(0, Endianness::Big).unwrap(), 0x0102_0304);
    }

    #[test]
    fn test_read_i32_at_every_offset() {
        let value: i32 = -123_456_789;
        for offset in 0..4usize {
            let mut le = vec![0xAA; 8];
            le[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
            let mut be = vec![0xAA; 8];
            be[offset..offset + 4].copy_from_slice(&value.to_be_bytes());

            let offset = offset as i64;
            assert_eq!(buffer(&le).read_i32(offset, Endianness::Little).unwrap(), value);
            assert_eq!(buffer(&be).read_i32(offset, Endianness::Big).unwrap(), value);
        }
    }

    #[test]
    fn test_signed_widths() {
        let buf = buffer(&[0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(buf.read_i16(0, Endianness::Little).unwrap(), -2);
        assert_eq!(buf.read_i16(0, Endianness::Big).unwrap(), -257);
        assert_eq!(buf.read_i64(0, Endianness::Little).unwrap(), -2);
    }

    #[test]
    fn test_unsigned_widening() {
        let buf = buffer(&[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(
            buf.read_u32_widened(0, Endianness::Little).unwrap(),
            4_294_967_295
        );
    }

    #[test]
    fn test_floats() {
        let mut data = 1.5f32.to_le_bytes().to_vec();
        data.extend_from_slice(&(-0.25f64).to_be_bytes());
        let buf = buffer(&data);
        assert_eq!(buf.read_f32(0, Endianness::Little).unwrap(), 1.5);
        assert_eq!(buf.read_f64(4, Endianness::Big).unwrap(), -0.25);
    }

    #[test]
    fn test_byte_and_bool() {
        let buf = buffer(&[0xFF, 0x00, 0x02]);
        assert_eq!(buf.read_u8(0).unwrap(), 255);
        assert!(buf.read_bool(0).unwrap());
        assert!(!buf.read_bool(1).unwrap());
        assert!(buf.read_bool(2).unwrap());
        assert!(buf.read_u8(3).is_err());
    }

    #[test]
    fn test_read_bit() {
        let buf = buffer(&[0x01, 0x02, 0x80]);
        assert!(buf.read_bit(0, 0).unwrap());
        assert!(!buf.read_bit(1, 0).unwrap());
        assert!(buf.read_bit(1, 1).unwrap());
        assert!(buf.read_bit(2, 7).unwrap());
    }

    #[test]
    fn test_read_bit_outside_byte() {
        let buf = buffer(&[0xFF]);
        assert!(!buf.read_bit(0, 8).unwrap());
        assert!(!buf.read_bit(0, -1).unwrap());
        assert!(!buf.read_bit(0, 64).unwrap());
        assert!(matches!(buf.read_bit(1, 0), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("input.bin");
        std::fs::write(&path, [0x0C, 0x00, 0xFF]).unwrap();

        let buf = ByteBuffer::from_file(&path).unwrap();
        assert_eq!(buf.len(), 3);
        assert!(matches!(
            ByteBuffer::from_file(dir.path().join("missing.bin")),
            Err(Error::FileRead { .. })
        ));
    }
}
