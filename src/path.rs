//! Vector mask paths: the Bezier knot records stored inside a `vmsk` tagged
//! block. Grounded on `pytoshop/path.py`'s `PathRecord` subclasses and
//! `PathResource`.

use std::io::{Seek, Write};

use thiserror::Error;

use crate::enums::{EnumError, PathRecordType};
use crate::error::PsdError;
use crate::io::cursor::PsdCursor;
use crate::io::writer::PsdWriter;

/// Every path record is fixed at 26 bytes: a 2-byte type plus 24 bytes of
/// type-specific payload.
const RECORD_LENGTH: u64 = 26;

fn read_point(raw: i32, extent: u32) -> f64 {
    (raw as f64 / (1u64 << 24) as f64) * extent as f64
}

fn write_point(value: f64, extent: u32) -> i32 {
    ((value / extent as f64) * (1u64 << 24) as f64).round() as i32
}

/// The six control points defining one knot of a Bezier path segment, in
/// pixels. `(y1, x1)` is the knot's anchor; `(y0, x0)` and `(y2, x2)` are the
/// control points trailing into and leaving it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierKnot {
    pub y0: f64,
    pub x0: f64,
    pub y1: f64,
    pub x1: f64,
    pub y2: f64,
    pub x2: f64,
}

impl BezierKnot {
    /// A knot with no distinct control points: all three points coincide.
    pub fn smooth(y: f64, x: f64) -> BezierKnot {
        BezierKnot {
            y0: y,
            x0: x,
            y1: y,
            x1: x,
            y2: y,
            x2: x,
        }
    }

    fn read(cursor: &mut PsdCursor, height: u32, width: u32) -> Result<BezierKnot, PsdError> {
        let y0 = read_point(cursor.read_i32()?, height);
        let x0 = read_point(cursor.read_i32()?, width);
        let y1 = read_point(cursor.read_i32()?, height);
        let x1 = read_point(cursor.read_i32()?, width);
        let y2 = read_point(cursor.read_i32()?, height);
        let x2 = read_point(cursor.read_i32()?, width);
        Ok(BezierKnot {
            y0,
            x0,
            y1,
            x1,
            y2,
            x2,
        })
    }

    fn write<W: Write + Seek>(
        &self,
        writer: &mut PsdWriter<W>,
        height: u32,
        width: u32,
    ) -> Result<(), PsdError> {
        writer.write_i32(write_point(self.y0, height))?;
        writer.write_i32(write_point(self.x0, width))?;
        writer.write_i32(write_point(self.y1, height))?;
        writer.write_i32(write_point(self.x1, width))?;
        writer.write_i32(write_point(self.y2, height))?;
        writer.write_i32(write_point(self.x2, width))?;
        Ok(())
    }
}

/// One entry of a vector mask's path, dispatched on a 2-byte type code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathRecord {
    PathFillRule,
    InitialFillRule { all_pixels: bool },
    ClosedSubpathLength { num_knots: u16 },
    OpenSubpathLength { num_knots: u16 },
    ClosedSubpathBezierKnotLinked(BezierKnot),
    ClosedSubpathBezierKnotUnlinked(BezierKnot),
    OpenSubpathBezierKnotLinked(BezierKnot),
    OpenSubpathBezierKnotUnlinked(BezierKnot),
    Clipboard {
        top: f64,
        left: f64,
        bottom: f64,
        right: f64,
        resolution: i32,
    },
}

impl PathRecord {
    pub fn record_type(&self) -> PathRecordType {
        use PathRecord::*;
        match self {
            PathFillRule => PathRecordType::PathFillRule,
            InitialFillRule { .. } => PathRecordType::InitialFillRule,
            ClosedSubpathLength { .. } => PathRecordType::ClosedSubpathLength,
            OpenSubpathLength { .. } => PathRecordType::OpenSubpathLength,
            ClosedSubpathBezierKnotLinked(_) => PathRecordType::ClosedSubpathBezierLinked,
            ClosedSubpathBezierKnotUnlinked(_) => PathRecordType::ClosedSubpathBezierUnlinked,
            OpenSubpathBezierKnotLinked(_) => PathRecordType::OpenSubpathBezierLinked,
            OpenSubpathBezierKnotUnlinked(_) => PathRecordType::OpenSubpathBezierUnlinked,
            Clipboard { .. } => PathRecordType::Clipboard,
        }
    }

    fn read(cursor: &mut PsdCursor, height: u32, width: u32) -> Result<PathRecord, PsdError> {
        let record_type =
            PathRecordType::from_u16(cursor.read_u16()?).map_err(PathRecordError::Enum)?;
        use PathRecordType::*;
        Ok(match record_type {
            PathFillRule => {
                let padding = cursor.read(24)?;
                if padding.iter().any(|&b| b != 0) {
                    return Err(PathRecordError::InvalidPadding { record_type }.into());
                }
                PathRecord::PathFillRule
            }
            InitialFillRule => {
                let all_pixels = cursor.read_u16()? != 0;
                let padding = cursor.read(22)?;
                if padding.iter().any(|&b| b != 0) {
                    return Err(PathRecordError::InvalidPadding { record_type }.into());
                }
                PathRecord::InitialFillRule { all_pixels }
            }
            ClosedSubpathLength => {
                let num_knots = cursor.read_u16()?;
                cursor.read(22)?;
                PathRecord::ClosedSubpathLength { num_knots }
            }
            OpenSubpathLength => {
                let num_knots = cursor.read_u16()?;
                cursor.read(22)?;
                PathRecord::OpenSubpathLength { num_knots }
            }
            ClosedSubpathBezierLinked => {
                PathRecord::ClosedSubpathBezierKnotLinked(BezierKnot::read(cursor, height, width)?)
            }
            ClosedSubpathBezierUnlinked => PathRecord::ClosedSubpathBezierKnotUnlinked(
                BezierKnot::read(cursor, height, width)?,
            ),
            OpenSubpathBezierLinked => {
                PathRecord::OpenSubpathBezierKnotLinked(BezierKnot::read(cursor, height, width)?)
            }
            OpenSubpathBezierUnlinked => {
                PathRecord::OpenSubpathBezierKnotUnlinked(BezierKnot::read(cursor, height, width)?)
            }
            Clipboard => {
                let top = read_point(cursor.read_i32()?, height);
                let left = read_point(cursor.read_i32()?, width);
                let bottom = read_point(cursor.read_i32()?, height);
                let right = read_point(cursor.read_i32()?, width);
                let resolution = cursor.read_i32()?;
                cursor.read_i32()?;
                PathRecord::Clipboard {
                    top,
                    left,
                    bottom,
                    right,
                    resolution,
                }
            }
        })
    }

    fn write<W: Write + Seek>(
        &self,
        writer: &mut PsdWriter<W>,
        height: u32,
        width: u32,
    ) -> Result<(), PsdError> {
        writer.write_u16(self.record_type().as_u16())?;
        match self {
            PathRecord::PathFillRule => writer.write_bytes(&[0; 24])?,
            PathRecord::InitialFillRule { all_pixels } => {
                writer.write_u16(if *all_pixels { 1 } else { 0 })?;
                writer.write_bytes(&[0; 22])?;
            }
            PathRecord::ClosedSubpathLength { num_knots } | PathRecord::OpenSubpathLength { num_knots } => {
                writer.write_u16(*num_knots)?;
                writer.write_bytes(&[0; 22])?;
            }
            PathRecord::ClosedSubpathBezierKnotLinked(knot)
            | PathRecord::ClosedSubpathBezierKnotUnlinked(knot)
            | PathRecord::OpenSubpathBezierKnotLinked(knot)
            | PathRecord::OpenSubpathBezierKnotUnlinked(knot) => {
                knot.write(writer, height, width)?;
            }
            PathRecord::Clipboard {
                top,
                left,
                bottom,
                right,
                resolution,
            } => {
                writer.write_i32(write_point(*top, height))?;
                writer.write_i32(write_point(*left, width))?;
                writer.write_i32(write_point(*bottom, height))?;
                writer.write_i32(write_point(*right, width))?;
                writer.write_i32(*resolution)?;
                writer.write_i32(0)?;
            }
        }
        Ok(())
    }
}

/// A vector mask's path: a flat list of records, always starting with
/// `PathFillRule`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathResource {
    pub path_records: Vec<PathRecord>,
}

impl PathResource {
    pub fn length(&self) -> u64 {
        self.path_records.len() as u64 * RECORD_LENGTH
    }

    pub fn read(cursor: &mut PsdCursor, length: u64, height: u32, width: u32) -> Result<PathResource, PsdError> {
        let end = cursor.position() + length;
        let mut path_records = Vec::new();
        while cursor.position() + RECORD_LENGTH <= end {
            path_records.push(PathRecord::read(cursor, height, width)?);
        }

        if !matches!(path_records.first(), Some(PathRecord::PathFillRule)) {
            return Err(PathRecordError::MissingFillRule.into());
        }

        cursor.read((end - cursor.position()) as u32)?;

        Ok(PathResource { path_records })
    }

    /// Builds the path records for a rectangular vector mask, matching the
    /// fixed 8-knot shape Photoshop writes for a simple rect mask.
    pub fn from_rect(top: f64, left: f64, bottom: f64, right: f64) -> PathResource {
        use PathRecord::*;
        PathResource {
            path_records: vec![
                PathFillRule,
                InitialFillRule { all_pixels: false },
                OpenSubpathLength { num_knots: 5 },
                OpenSubpathBezierKnotLinked(BezierKnot::smooth(top, left)),
                OpenSubpathBezierKnotLinked(BezierKnot::smooth(top, right)),
                OpenSubpathBezierKnotLinked(BezierKnot::smooth(bottom, right)),
                OpenSubpathBezierKnotLinked(BezierKnot::smooth(bottom, left)),
                OpenSubpathBezierKnotLinked(BezierKnot::smooth(top, left)),
            ],
        }
    }

    pub fn write<W: Write + Seek>(
        &self,
        writer: &mut PsdWriter<W>,
        height: u32,
        width: u32,
    ) -> Result<(), PsdError> {
        for record in &self.path_records {
            record.write(writer, height, width)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum PathRecordError {
    #[error(transparent)]
    Enum(EnumError),
    #[error("invalid padding in {record_type:?} path record")]
    InvalidPadding { record_type: PathRecordType },
    #[error("path resource must start with a path fill rule record")]
    MissingFillRule,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_rect_path() {
        let resource = PathResource::from_rect(0.0, 0.0, 100.0, 200.0);
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            resource.write(&mut w, 100, 200).unwrap();
        }
        let bytes = buf.into_inner();
        let mut cursor = PsdCursor::new(&bytes);
        let roundtripped =
            PathResource::read(&mut cursor, bytes.len() as u64, 100, 200).unwrap();
        assert_eq!(roundtripped.path_records.len(), 8);
        assert!(matches!(
            roundtripped.path_records[0],
            PathRecord::PathFillRule
        ));
    }

    #[test]
    fn rejects_resource_not_starting_with_fill_rule() {
        let resource = PathResource {
            path_records: vec![PathRecord::InitialFillRule { all_pixels: false }],
        };
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            resource.write(&mut w, 100, 100).unwrap();
        }
        let bytes = buf.into_inner();
        let mut cursor = PsdCursor::new(&bytes);
        assert!(matches!(
            PathResource::read(&mut cursor, bytes.len() as u64, 100, 100),
            Err(PsdError::PathRecord(PathRecordError::MissingFillRule))
        ));
    }
}
