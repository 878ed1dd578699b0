//! A little-ceremony byte cursor over an in-memory slice.
//!
//! Grounded on the teacher's `sections::PsdCursor` (a thin wrapper around
//! `std::io::Cursor<&[u8]>`), extended with the full set of big-endian reads,
//! the Pascal/Unicode string codecs, and bit-flag unpacking from
//! `pytoshop/util.py`.

use std::io::{Cursor, Read, Seek, SeekFrom};

use crate::error::PsdError;
use crate::io::unpack_bitflags;

/// Reads a PSD/PSB document's bytes front-to-back, erroring out (rather than
/// panicking or silently truncating) the moment a read runs past the end of
/// the slice.
pub struct PsdCursor<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> PsdCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        PsdCursor {
            cursor: Cursor::new(bytes),
        }
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn get_ref(&self) -> &'a [u8] {
        *self.cursor.get_ref()
    }

    pub fn remaining(&self) -> u64 {
        self.get_ref().len() as u64 - self.position()
    }

    pub fn seek_from_start(&mut self, pos: u64) -> Result<(), PsdError> {
        self.cursor.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    pub fn seek_relative(&mut self, delta: i64) -> Result<(), PsdError> {
        self.cursor.seek(SeekFrom::Current(delta))?;
        Ok(())
    }

    /// Reads exactly `n` bytes, erroring if fewer remain.
    pub fn read(&mut self, n: u32) -> Result<&'a [u8], PsdError> {
        let n = n as u64;
        let available = self.remaining();
        if available < n {
            return Err(PsdError::UnexpectedEof {
                needed: n,
                available,
                offset: self.position(),
            });
        }
        let start = self.position() as usize;
        let end = start + n as usize;
        self.cursor.seek(SeekFrom::Current(n as i64))?;
        Ok(&self.get_ref()[start..end])
    }

    /// Peeks at the next 4 bytes without advancing the cursor.
    pub fn peek_4(&mut self) -> Result<&'a [u8], PsdError> {
        let start = self.position();
        let bytes = self.read(4)?;
        self.seek_from_start(start)?;
        Ok(bytes)
    }

    pub fn read_1(&mut self) -> Result<&'a [u8], PsdError> {
        self.read(1)
    }

    pub fn read_2(&mut self) -> Result<&'a [u8], PsdError> {
        self.read(2)
    }

    pub fn read_4(&mut self) -> Result<&'a [u8], PsdError> {
        self.read(4)
    }

    pub fn read_6(&mut self) -> Result<&'a [u8], PsdError> {
        self.read(6)
    }

    pub fn read_8(&mut self) -> Result<&'a [u8], PsdError> {
        self.read(8)
    }

    pub fn read_u8(&mut self) -> Result<u8, PsdError> {
        Ok(self.read_1()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, PsdError> {
        Ok(self.read_1()?[0] as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, PsdError> {
        let bytes = self.read_2()?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_i16(&mut self) -> Result<i16, PsdError> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32, PsdError> {
        let bytes = self.read_4()?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, PsdError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64, PsdError> {
        let bytes = self.read_8()?;
        Ok(u64::from_be_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    pub fn read_i64(&mut self) -> Result<i64, PsdError> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_f64(&mut self) -> Result<f64, PsdError> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// A length field whose width depends on the document version and
    /// whether this call site is one of the "large layer info" fields.
    pub fn read_length(&mut self, version_is_large: bool) -> Result<u64, PsdError> {
        if version_is_large {
            self.read_u64()
        } else {
            Ok(self.read_u32()? as u64)
        }
    }

    /// Pascal string: u8 length prefix, raw bytes (lossily decoded as UTF-8),
    /// then zero padding so the prefix byte plus the string round up to a
    /// multiple of `padding`.
    pub fn read_pascal_string(&mut self, padding: u32) -> Result<String, PsdError> {
        let len = self.read_u8()? as u32;
        let bytes = self.read(len)?;
        let s = String::from_utf8_lossy(bytes).to_string();
        let consumed = 1 + len;
        let padded = crate::io::pad(consumed as usize, padding as usize) as u32;
        self.read(padded - consumed)?;
        Ok(s)
    }

    /// Adobe's Unicode string: u32 char count, then that many UTF-16BE code
    /// units, NUL-terminated (the NUL is included in the count and stripped
    /// on decode).
    pub fn read_unicode_string(&mut self) -> Result<String, PsdError> {
        let count = self.read_u32()?;
        let mut units = Vec::with_capacity(count as usize);
        for _ in 0..count {
            units.push(self.read_u16()?);
        }
        if units.last() == Some(&0) {
            units.pop();
        }
        Ok(String::from_utf16_lossy(&units))
    }

    pub fn read_bitflags(&mut self, n: usize) -> Result<Vec<bool>, PsdError> {
        Ok(unpack_bitflags(self.read_u8()?, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_integers() {
        let bytes = [0x00, 0x01, 0x00, 0x00, 0x00, 0x02];
        let mut cursor = PsdCursor::new(&bytes);
        assert_eq!(cursor.read_u16().unwrap(), 1);
        assert_eq!(cursor.read_u32().unwrap(), 2);
    }

    #[test]
    fn read_past_end_is_an_error() {
        let bytes = [0x00];
        let mut cursor = PsdCursor::new(&bytes);
        assert!(cursor.read_u32().is_err());
    }

    #[test]
    fn pascal_string_round_trip() {
        let bytes = [3, b'c', b'a', b't', 0]; // len=3, "cat", pad to mult of 4 -> 1 zero byte
        let mut cursor = PsdCursor::new(&bytes);
        assert_eq!(cursor.read_pascal_string(4).unwrap(), "cat");
        assert_eq!(cursor.position(), 5);
    }

    #[test]
    fn unicode_string_strips_trailing_nul() {
        // count = 2, "h" (0x0068), NUL (0x0000)
        let bytes = [0, 0, 0, 2, 0, 0x68, 0, 0];
        let mut cursor = PsdCursor::new(&bytes);
        assert_eq!(cursor.read_unicode_string().unwrap(), "h");
    }

    #[test]
    fn peek_does_not_advance() {
        let bytes = [1, 2, 3, 4, 5];
        let mut cursor = PsdCursor::new(&bytes);
        assert_eq!(cursor.peek_4().unwrap(), &[1, 2, 3, 4]);
        assert_eq!(cursor.position(), 0);
    }
}
