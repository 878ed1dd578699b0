//! The write-side counterpart to `PsdCursor`.
//!
//! The teacher codebase this crate grew from has no write path at all to
//! ground this on; the wire-level rules (Pascal/Unicode string encoding,
//! bit-flag packing, reserve-then-patch length prefixes) are grounded on
//! `pytoshop/util.py`'s `write_value`/`write_pascal_string`/
//! `write_unicode_string`/`pack_bitflags`.

use std::io::{Seek, SeekFrom, Write};

use crate::error::PsdError;
use crate::io::pack_bitflags;

/// Wraps any `Write + Seek` sink with the big-endian writes and length-patch
/// helper this format needs everywhere.
pub struct PsdWriter<'w, W: Write + Seek> {
    sink: &'w mut W,
}

impl<'w, W: Write + Seek> PsdWriter<'w, W> {
    pub fn new(sink: &'w mut W) -> Self {
        PsdWriter { sink }
    }

    pub fn position(&mut self) -> Result<u64, PsdError> {
        Ok(self.sink.stream_position()?)
    }

    pub fn seek_from_start(&mut self, pos: u64) -> Result<(), PsdError> {
        self.sink.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Advances the sink by `n` bytes without writing anything, for
    /// reserving a block of slots (e.g. a layer record's per-channel length
    /// table) to be patched in a later pass.
    pub fn skip(&mut self, n: u64) -> Result<(), PsdError> {
        self.sink.seek(SeekFrom::Current(n as i64))?;
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), PsdError> {
        self.sink.write_all(bytes)?;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), PsdError> {
        self.write_bytes(&[value])
    }

    pub fn write_i8(&mut self, value: i8) -> Result<(), PsdError> {
        self.write_u8(value as u8)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), PsdError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_i16(&mut self, value: i16) -> Result<(), PsdError> {
        self.write_u16(value as u16)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), PsdError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), PsdError> {
        self.write_u32(value as u32)
    }

    pub fn write_u64(&mut self, value: u64) -> Result<(), PsdError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_i64(&mut self, value: i64) -> Result<(), PsdError> {
        self.write_u64(value as u64)
    }

    pub fn write_f64(&mut self, value: f64) -> Result<(), PsdError> {
        self.write_u64(value.to_bits())
    }

    /// A length field whose width depends on the document version and
    /// whether this call site is one of the "large layer info" fields.
    pub fn write_length(&mut self, version_is_large: bool, value: u64) -> Result<(), PsdError> {
        if version_is_large {
            self.write_u64(value)
        } else {
            self.write_u32(value as u32)
        }
    }

    pub fn write_pascal_string(&mut self, s: &str, padding: u32) -> Result<(), PsdError> {
        let bytes = s.as_bytes();
        let len = bytes.len().min(u8::MAX as usize);
        self.write_u8(len as u8)?;
        self.write_bytes(&bytes[..len])?;
        let consumed = 1 + len;
        let padded = crate::io::pad(consumed, padding as usize);
        self.write_bytes(&vec![0u8; padded - consumed])?;
        Ok(())
    }

    pub fn write_unicode_string(&mut self, s: &str) -> Result<(), PsdError> {
        let units: Vec<u16> = s.encode_utf16().collect();
        self.write_u32(units.len() as u32 + 1)?;
        for unit in units {
            self.write_u16(unit)?;
        }
        self.write_u16(0)?;
        Ok(())
    }

    pub fn write_bitflags(&mut self, values: &[bool]) -> Result<(), PsdError> {
        self.write_u8(pack_bitflags(values))
    }

    /// Reserves a u32 length slot, runs `body` to write the payload, then
    /// seeks back and patches the slot with the number of bytes `body` wrote.
    /// Leaves the cursor at the end of the payload on return, matching §5's
    /// "writers never leave the sink mid-patch" contract.
    pub fn write_with_patched_u32_length(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<(), PsdError>,
    ) -> Result<(), PsdError> {
        let length_pos = self.position()?;
        self.write_u32(0)?;
        let payload_start = self.position()?;
        body(self)?;
        let payload_end = self.position()?;
        self.sink.seek(SeekFrom::Start(length_pos))?;
        self.write_u32((payload_end - payload_start) as u32)?;
        self.sink.seek(SeekFrom::Start(payload_end))?;
        Ok(())
    }

    /// Same as `write_with_patched_u32_length` but with a version-dependent
    /// length width, for the two sections (layer-info, layer-and-mask-info)
    /// whose length is u64 in PSB.
    pub fn write_with_patched_length(
        &mut self,
        version_is_large: bool,
        body: impl FnOnce(&mut Self) -> Result<(), PsdError>,
    ) -> Result<(), PsdError> {
        let length_pos = self.position()?;
        self.write_length(version_is_large, 0)?;
        let payload_start = self.position()?;
        body(self)?;
        let payload_end = self.position()?;
        self.sink.seek(SeekFrom::Start(length_pos))?;
        self.write_length(version_is_large, payload_end - payload_start)?;
        self.sink.seek(SeekFrom::Start(payload_end))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn patches_length_after_writing_payload() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            w.write_with_patched_u32_length(|w| w.write_bytes(&[1, 2, 3]))
                .unwrap();
        }
        let bytes = buf.into_inner();
        assert_eq!(&bytes[0..4], &[0, 0, 0, 3]);
        assert_eq!(&bytes[4..7], &[1, 2, 3]);
    }

    #[test]
    fn pascal_string_pads_to_multiple() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            w.write_pascal_string("cat", 4).unwrap();
        }
        assert_eq!(buf.into_inner(), vec![3, b'c', b'a', b't', 0]);
    }

    #[test]
    fn unicode_string_appends_nul() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            w.write_unicode_string("h").unwrap();
        }
        assert_eq!(buf.into_inner(), vec![0, 0, 0, 2, 0, 0x68, 0, 0]);
    }
}
