//! Layer blending ranges: per-channel "this shows through" black/white
//! splits. Grounded on `pytoshop/blending_range.py`'s `BlendingRanges`.

use std::io::{Seek, Write};

use crate::error::PsdError;
use crate::io::cursor::PsdCursor;
use crate::io::writer::PsdWriter;

/// A single black/white split, each endpoint a `(low, high)` byte pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlendingRange {
    pub black: (u8, u8),
    pub white: (u8, u8),
}

impl BlendingRange {
    fn read(cursor: &mut PsdCursor) -> Result<BlendingRange, PsdError> {
        Ok(BlendingRange {
            black: (cursor.read_u8()?, cursor.read_u8()?),
            white: (cursor.read_u8()?, cursor.read_u8()?),
        })
    }

    fn write<W: Write + Seek>(&self, writer: &mut PsdWriter<W>) -> Result<(), PsdError> {
        writer.write_u8(self.black.0)?;
        writer.write_u8(self.black.1)?;
        writer.write_u8(self.white.0)?;
        writer.write_u8(self.white.1)?;
        Ok(())
    }
}

/// A source/destination pair, the unit every blending-range entry is stored
/// as (one for the composite image, one per channel).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlendingRangePair {
    pub source: BlendingRange,
    pub dest: BlendingRange,
}

impl BlendingRangePair {
    fn read(cursor: &mut PsdCursor) -> Result<BlendingRangePair, PsdError> {
        Ok(BlendingRangePair {
            source: BlendingRange::read(cursor)?,
            dest: BlendingRange::read(cursor)?,
        })
    }

    fn write<W: Write + Seek>(&self, writer: &mut PsdWriter<W>) -> Result<(), PsdError> {
        self.source.write(writer)?;
        self.dest.write(writer)?;
        Ok(())
    }
}

/// | Length | Description |
/// |---|---|
/// | 4 | Length of the following data |
/// | 8 | Composite gray blend source/dest range |
/// | 8 × N | One source/dest range per channel |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlendingRanges {
    pub composite: BlendingRangePair,
    pub channels: Vec<BlendingRangePair>,
}

impl BlendingRanges {
    /// Full on-wire size including the 4-byte length prefix.
    pub fn total_length(&self) -> u64 {
        4 + 8 * (1 + self.channels.len() as u64)
    }

    pub fn read(cursor: &mut PsdCursor) -> Result<BlendingRanges, PsdError> {
        let len = cursor.read_u32()? as u64;
        let end = cursor.position() + len;
        let composite = BlendingRangePair::read(cursor)?;
        let mut channels = Vec::new();
        while cursor.position() < end {
            channels.push(BlendingRangePair::read(cursor)?);
        }
        Ok(BlendingRanges { composite, channels })
    }

    pub fn write<W: Write + Seek>(&self, writer: &mut PsdWriter<W>) -> Result<(), PsdError> {
        writer.write_with_patched_u32_length(|writer| {
            self.composite.write(writer)?;
            for pair in &self.channels {
                pair.write(writer)?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_composite_and_channels() {
        let ranges = BlendingRanges {
            composite: BlendingRangePair {
                source: BlendingRange {
                    black: (0, 0),
                    white: (255, 255),
                },
                dest: BlendingRange {
                    black: (0, 0),
                    white: (255, 255),
                },
            },
            channels: vec![BlendingRangePair::default(); 3],
        };
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            ranges.write(&mut w).unwrap();
        }
        let bytes = buf.into_inner();
        let mut cursor = PsdCursor::new(&bytes);
        assert_eq!(BlendingRanges::read(&mut cursor).unwrap(), ranges);
    }
}
