//! Concrete image resource block payloads. Grounded on
//! `pytoshop/image_resources.py`'s per-resource-id subclasses.

use std::io::{Seek, Write};

use crate::enums::{ColorSpace, GuideDirection, PrintScaleStyle, Units};
use crate::error::PsdError;
use crate::io::cursor::PsdCursor;
use crate::io::writer::PsdWriter;
use super::ImageResourceError;

/// A single ruler guide, as stored inside `GridAndGuidesInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuideResourceBlock {
    pub location: u32,
    pub direction: GuideDirection,
}

impl GuideResourceBlock {
    pub(super) fn read(cursor: &mut PsdCursor) -> Result<GuideResourceBlock, PsdError> {
        let location = cursor.read_u32()?;
        let direction = GuideDirection::from_u8(cursor.read_u8()?)
            .map_err(ImageResourceError::Enum)?;
        Ok(GuideResourceBlock { location, direction })
    }

    pub(super) fn write<W: Write + Seek>(&self, writer: &mut PsdWriter<W>) -> Result<(), PsdError> {
        writer.write_u32(self.location)?;
        writer.write_u8(self.direction.as_u8())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderInfo {
    pub border_width_num: u16,
    pub border_width_den: u16,
    pub unit: Units,
}

impl BorderInfo {
    pub(super) fn read(cursor: &mut PsdCursor) -> Result<BorderInfo, PsdError> {
        let border_width_num = cursor.read_u16()?;
        let border_width_den = cursor.read_u16()?;
        let unit = Units::from_u32(cursor.read_u16()? as u32).map_err(ImageResourceError::Enum)?;
        Ok(BorderInfo {
            border_width_num,
            border_width_den,
            unit,
        })
    }

    pub(super) fn write<W: Write + Seek>(&self, writer: &mut PsdWriter<W>) -> Result<(), PsdError> {
        writer.write_u16(self.border_width_num)?;
        writer.write_u16(self.border_width_den)?;
        writer.write_u16(self.unit.as_u32() as u16)?;
        Ok(())
    }
}

/// `color` holds up to 4 components; unused trailing components are zero.
/// Lab's b/c components are offset by ±32767 on the wire only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundColor {
    pub color_space: ColorSpace,
    pub color: [i32; 4],
}

impl BackgroundColor {
    pub(super) fn read(cursor: &mut PsdCursor) -> Result<BackgroundColor, PsdError> {
        let color_space =
            ColorSpace::from_u16(cursor.read_u16()?).map_err(ImageResourceError::Enum)?;
        let a = cursor.read_u16()? as i32;
        let mut b = cursor.read_u16()? as i32;
        let mut c = cursor.read_u16()? as i32;
        let d = cursor.read_u16()? as i32;
        if color_space == ColorSpace::Lab {
            b -= 32767;
            c -= 32767;
        }
        Ok(BackgroundColor {
            color_space,
            color: [a, b, c, d],
        })
    }

    pub(super) fn write<W: Write + Seek>(&self, writer: &mut PsdWriter<W>) -> Result<(), PsdError> {
        let [a, mut b, mut c, d] = self.color;
        if self.color_space == ColorSpace::Lab {
            b += 32767;
            c += 32767;
        }
        writer.write_u16(self.color_space.as_u16())?;
        writer.write_u16(a as u16)?;
        writer.write_u16(b as u16)?;
        writer.write_u16(c as u16)?;
        writer.write_u16(d as u16)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrintFlags {
    pub labels: bool,
    pub crop_marks: bool,
    pub color_bars: bool,
    pub registration_marks: bool,
    pub negative: bool,
    pub flip: bool,
    pub interpolate: bool,
    pub caption: bool,
    pub print_flags: bool,
}

impl PrintFlags {
    pub(super) fn read(cursor: &mut PsdCursor) -> Result<PrintFlags, PsdError> {
        let mut v = [false; 9];
        for slot in &mut v {
            *slot = cursor.read_u8()? != 0;
        }
        Ok(PrintFlags {
            labels: v[0],
            crop_marks: v[1],
            color_bars: v[2],
            registration_marks: v[3],
            negative: v[4],
            flip: v[5],
            interpolate: v[6],
            caption: v[7],
            print_flags: v[8],
        })
    }

    pub(super) fn write<W: Write + Seek>(&self, writer: &mut PsdWriter<W>) -> Result<(), PsdError> {
        for v in [
            self.labels,
            self.crop_marks,
            self.color_bars,
            self.registration_marks,
            self.negative,
            self.flip,
            self.interpolate,
            self.caption,
            self.print_flags,
        ] {
            writer.write_u8(if v { 255 } else { 0 })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridAndGuidesInfo {
    pub grid_hori: u32,
    pub grid_vert: u32,
    pub guides: Vec<GuideResourceBlock>,
}

impl GridAndGuidesInfo {
    pub(super) fn read(cursor: &mut PsdCursor) -> Result<GridAndGuidesInfo, PsdError> {
        let version = cursor.read_u32()?;
        if version != 1 {
            return Err(ImageResourceError::UnknownGridAndGuidesVersion { version }.into());
        }
        let grid_hori = cursor.read_u32()?;
        let grid_vert = cursor.read_u32()?;
        let n_guides = cursor.read_u32()?;
        let mut guides = Vec::with_capacity(n_guides as usize);
        for _ in 0..n_guides {
            guides.push(GuideResourceBlock::read(cursor)?);
        }
        Ok(GridAndGuidesInfo {
            grid_hori,
            grid_vert,
            guides,
        })
    }

    pub(super) fn write<W: Write + Seek>(&self, writer: &mut PsdWriter<W>) -> Result<(), PsdError> {
        writer.write_u32(1)?;
        writer.write_u32(self.grid_hori)?;
        writer.write_u32(self.grid_vert)?;
        writer.write_u32(self.guides.len() as u32)?;
        for guide in &self.guides {
            guide.write(writer)?;
        }
        Ok(())
    }

    pub(super) fn data_length(&self) -> usize {
        16 + 5 * self.guides.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub version: u32,
    pub has_real_merged_data: bool,
    pub writer: String,
    pub reader: String,
    pub file_version: u32,
}

impl VersionInfo {
    pub(super) fn read(cursor: &mut PsdCursor) -> Result<VersionInfo, PsdError> {
        let version = cursor.read_u32()?;
        let has_real_merged_data = cursor.read_u8()? != 0;
        let writer = cursor.read_unicode_string()?;
        let reader = cursor.read_unicode_string()?;
        let file_version = cursor.read_u32()?;
        Ok(VersionInfo {
            version,
            has_real_merged_data,
            writer,
            reader,
            file_version,
        })
    }

    pub(super) fn write<W: Write + Seek>(&self, writer_: &mut PsdWriter<W>) -> Result<(), PsdError> {
        writer_.write_u32(self.version)?;
        writer_.write_u8(if self.has_real_merged_data { 255 } else { 0 })?;
        writer_.write_unicode_string(&self.writer)?;
        writer_.write_unicode_string(&self.reader)?;
        writer_.write_u32(self.file_version)?;
        Ok(())
    }

    pub(super) fn data_length(&self) -> usize {
        4 + 1
            + (4 + self.writer.encode_utf16().count() * 2 + 2)
            + (4 + self.reader.encode_utf16().count() * 2 + 2)
            + 4
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintScale {
    pub style: PrintScaleStyle,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl PrintScale {
    pub(super) fn read(cursor: &mut PsdCursor) -> Result<PrintScale, PsdError> {
        let style =
            PrintScaleStyle::from_u16(cursor.read_u16()?).map_err(ImageResourceError::Enum)?;
        let x = f32::from_bits(cursor.read_u32()?);
        let y = f32::from_bits(cursor.read_u32()?);
        let scale = f32::from_bits(cursor.read_u32()?);
        Ok(PrintScale { style, x, y, scale })
    }

    pub(super) fn write<W: Write + Seek>(&self, writer: &mut PsdWriter<W>) -> Result<(), PsdError> {
        writer.write_u16(self.style.as_u16())?;
        writer.write_u32(self.x.to_bits())?;
        writer.write_u32(self.y.to_bits())?;
        writer.write_u32(self.scale.to_bits())?;
        Ok(())
    }
}
