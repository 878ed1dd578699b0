//! Global layer mask info: a document-wide overlay shown for any layer mask
//! currently being edited. Grounded on `pytoshop/layers.py`'s
//! `GlobalLayerMaskInfo`.

use std::io::{Seek, Write};

use crate::enums::LayerMaskKind;
use crate::error::PsdError;
use crate::io::cursor::PsdCursor;
use crate::io::writer::PsdWriter;

use super::LayerMaskError;

/// | Length | Description |
/// |---|---|
/// | 4 | Length of the following data; 0 if every field below is default |
/// | 10 | Overlay color space, undocumented |
/// | 2 | Opacity, 0-100 |
/// | 1 | Kind, see `LayerMaskKind` |
/// | 3 | Filler |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalLayerMaskInfo {
    pub overlay_color_space: [u8; 10],
    pub opacity: u16,
    pub kind: LayerMaskKind,
}

impl Default for GlobalLayerMaskInfo {
    fn default() -> Self {
        GlobalLayerMaskInfo {
            overlay_color_space: [0; 10],
            opacity: 100,
            kind: LayerMaskKind::UseValuePerLayer,
        }
    }
}

impl GlobalLayerMaskInfo {
    /// True when every field is at Photoshop's "nothing to say here" default,
    /// the condition `write` uses to pick the zero-length encoding.
    pub fn is_default(&self) -> bool {
        self.overlay_color_space == [0; 10]
            && self.opacity == 100
            && self.kind == LayerMaskKind::UseValuePerLayer
    }

    pub fn read(cursor: &mut PsdCursor) -> Result<GlobalLayerMaskInfo, PsdError> {
        let length = cursor.read_u32()?;
        let end = cursor.position() + length as u64;
        if length == 0 {
            return Ok(GlobalLayerMaskInfo::default());
        }

        let overlay_color_space: [u8; 10] = cursor.read(10)?.try_into().unwrap();
        let opacity = cursor.read_u16()?;
        let kind = LayerMaskKind::from_u8(cursor.read_u8()?).map_err(LayerMaskError::Enum)?;

        cursor.seek_from_start(end)?;

        Ok(GlobalLayerMaskInfo {
            overlay_color_space,
            opacity,
            kind,
        })
    }

    /// Writes only a zero-length marker when every field is at its default,
    /// matching Photoshop's own "nothing to say here" encoding.
    pub fn write<W: Write + Seek>(&self, writer: &mut PsdWriter<W>) -> Result<(), PsdError> {
        if self.is_default() {
            writer.write_u32(0)?;
            return Ok(());
        }

        writer.write_u32(16)?;
        writer.write_bytes(&self.overlay_color_space)?;
        writer.write_u16(self.opacity)?;
        writer.write_u8(self.kind.as_u8())?;
        writer.write_bytes(&[0; 3])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_as_zero_length() {
        let info = GlobalLayerMaskInfo::default();
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            info.write(&mut w).unwrap();
        }
        let bytes = buf.into_inner();
        assert_eq!(bytes, vec![0, 0, 0, 0]);
        let mut cursor = PsdCursor::new(&bytes);
        assert_eq!(GlobalLayerMaskInfo::read(&mut cursor).unwrap(), info);
    }

    #[test]
    fn non_default_round_trips_full_body() {
        let info = GlobalLayerMaskInfo {
            overlay_color_space: [1; 10],
            opacity: 50,
            kind: LayerMaskKind::ColorProtected,
        };
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            info.write(&mut w).unwrap();
        }
        let bytes = buf.into_inner();
        let mut cursor = PsdCursor::new(&bytes);
        assert_eq!(GlobalLayerMaskInfo::read(&mut cursor).unwrap(), info);
    }
}
