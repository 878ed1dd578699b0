//! Color mode data: palette bytes for indexed/duotone documents, opaque for
//! every other `ColorMode`. Grounded on `pytoshop/color_mode.py`'s
//! `ColorModeData`, which never interprets the bytes either.

use std::io::{Seek, Write};

use crate::error::PsdError;
use crate::io::cursor::PsdCursor;
use crate::io::writer::PsdWriter;

/// | Length | Description |
/// |---|---|
/// | 4 | Length of the following data |
/// | var | The data itself: 768-byte RGB palette for `Indexed`, duotone spec
///       for `Duotone`, empty otherwise |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorModeData {
    pub data: Vec<u8>,
}

impl ColorModeData {
    pub fn read(cursor: &mut PsdCursor) -> Result<ColorModeData, PsdError> {
        let len = cursor.read_u32()?;
        let data = cursor.read(len)?.to_vec();
        Ok(ColorModeData { data })
    }

    pub fn write<W: Write + Seek>(&self, writer: &mut PsdWriter<W>) -> Result<(), PsdError> {
        writer.write_u32(self.data.len() as u32)?;
        writer.write_bytes(&self.data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_opaque_bytes() {
        let section = ColorModeData {
            data: vec![1, 2, 3, 4],
        };
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            section.write(&mut w).unwrap();
        }
        let bytes = buf.into_inner();
        let mut cursor = PsdCursor::new(&bytes);
        assert_eq!(ColorModeData::read(&mut cursor).unwrap(), section);
    }

    #[test]
    fn empty_is_valid() {
        let section = ColorModeData::default();
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            section.write(&mut w).unwrap();
        }
        assert_eq!(buf.into_inner(), vec![0, 0, 0, 0]);
    }
}
