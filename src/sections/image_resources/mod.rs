//! The `ImageResources` section (§4.2 of the format, resource-id vocabulary
//! in the GLOSSARY): a flat list of `8BIM`-tagged blocks, most of which this
//! crate parses into a concrete struct, with an opaque-bytes fallback for
//! anything it doesn't recognise. Grounded on `pytoshop/image_resources.py`.

pub mod blocks;

use std::io::{Seek, Write};

use thiserror::Error;

pub use blocks::{
    BackgroundColor, BorderInfo, GridAndGuidesInfo, GuideResourceBlock, PrintFlags, PrintScale,
    VersionInfo,
};

use crate::enums::EnumError;
use crate::error::PsdError;
use crate::io::cursor::PsdCursor;
use crate::io::writer::PsdWriter;

const SIGNATURE: [u8; 4] = *b"8BIM";

const ID_BORDER_INFO: u16 = 1009;
const ID_BACKGROUND_COLOR: u16 = 1010;
const ID_PRINT_FLAGS: u16 = 1011;
pub const ID_LAYERS_GROUP_INFO: u16 = 1026;
const ID_GRID_AND_GUIDES_INFO: u16 = 1032;
const ID_COPYRIGHT_FLAG: u16 = 1034;
const ID_URL: u16 = 1035;
const ID_GLOBAL_ANGLE: u16 = 1037;
const ID_EFFECTS_VISIBLE: u16 = 1042;
const ID_DOCUMENT_SEED_NUMBER: u16 = 1044;
const ID_UNICODE_ALPHA_NAMES: u16 = 1045;
const ID_GLOBAL_ALTITUDE: u16 = 1049;
const ID_WORKFLOW_URL: u16 = 1051;
const ID_ALPHA_IDENTIFIERS: u16 = 1053;
const ID_VERSION_INFO: u16 = 1057;
const ID_PRINT_SCALE: u16 = 1062;

/// The decoded payload of one image resource block, keyed by resource id.
/// Anything not named here round-trips through `Generic`.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageResource {
    BorderInfo(BorderInfo),
    BackgroundColor(BackgroundColor),
    PrintFlags(PrintFlags),
    LayersGroupInfo { group_ids: Vec<u16> },
    GridAndGuidesInfo(GridAndGuidesInfo),
    CopyrightFlag(bool),
    Url(Vec<u8>),
    GlobalAngle(i32),
    EffectsVisible(bool),
    DocumentSeedNumber(u32),
    UnicodeAlphaNames(String),
    GlobalAltitude(u32),
    WorkflowUrl(String),
    AlphaIdentifiers(Vec<u32>),
    VersionInfo(VersionInfo),
    PrintScale(PrintScale),
    Generic { resource_id: u16, data: Vec<u8> },
}

impl ImageResource {
    pub fn resource_id(&self) -> u16 {
        match self {
            ImageResource::BorderInfo(_) => ID_BORDER_INFO,
            ImageResource::BackgroundColor(_) => ID_BACKGROUND_COLOR,
            ImageResource::PrintFlags(_) => ID_PRINT_FLAGS,
            ImageResource::LayersGroupInfo { .. } => ID_LAYERS_GROUP_INFO,
            ImageResource::GridAndGuidesInfo(_) => ID_GRID_AND_GUIDES_INFO,
            ImageResource::CopyrightFlag(_) => ID_COPYRIGHT_FLAG,
            ImageResource::Url(_) => ID_URL,
            ImageResource::GlobalAngle(_) => ID_GLOBAL_ANGLE,
            ImageResource::EffectsVisible(_) => ID_EFFECTS_VISIBLE,
            ImageResource::DocumentSeedNumber(_) => ID_DOCUMENT_SEED_NUMBER,
            ImageResource::UnicodeAlphaNames(_) => ID_UNICODE_ALPHA_NAMES,
            ImageResource::GlobalAltitude(_) => ID_GLOBAL_ALTITUDE,
            ImageResource::WorkflowUrl(_) => ID_WORKFLOW_URL,
            ImageResource::AlphaIdentifiers(_) => ID_ALPHA_IDENTIFIERS,
            ImageResource::VersionInfo(_) => ID_VERSION_INFO,
            ImageResource::PrintScale(_) => ID_PRINT_SCALE,
            ImageResource::Generic { resource_id, .. } => *resource_id,
        }
    }

    fn read(cursor: &mut PsdCursor, resource_id: u16, length: u32) -> Result<ImageResource, PsdError> {
        let start = cursor.position();
        let resource = match resource_id {
            ID_BORDER_INFO => ImageResource::BorderInfo(BorderInfo::read(cursor)?),
            ID_BACKGROUND_COLOR => ImageResource::BackgroundColor(BackgroundColor::read(cursor)?),
            ID_PRINT_FLAGS => ImageResource::PrintFlags(PrintFlags::read(cursor)?),
            ID_LAYERS_GROUP_INFO => {
                let n = length as usize / 2;
                let mut group_ids = Vec::with_capacity(n);
                for _ in 0..n {
                    group_ids.push(cursor.read_u16()?);
                }
                ImageResource::LayersGroupInfo { group_ids }
            }
            ID_GRID_AND_GUIDES_INFO => {
                ImageResource::GridAndGuidesInfo(GridAndGuidesInfo::read(cursor)?)
            }
            ID_COPYRIGHT_FLAG => ImageResource::CopyrightFlag(cursor.read_u8()? != 0),
            ID_URL => ImageResource::Url(cursor.read(length)?.to_vec()),
            ID_GLOBAL_ANGLE => ImageResource::GlobalAngle(cursor.read_i32()?),
            ID_EFFECTS_VISIBLE => ImageResource::EffectsVisible(cursor.read_u8()? != 0),
            ID_DOCUMENT_SEED_NUMBER => ImageResource::DocumentSeedNumber(cursor.read_u32()?),
            ID_UNICODE_ALPHA_NAMES => ImageResource::UnicodeAlphaNames(cursor.read_unicode_string()?),
            ID_GLOBAL_ALTITUDE => ImageResource::GlobalAltitude(cursor.read_u32()?),
            ID_WORKFLOW_URL => ImageResource::WorkflowUrl(cursor.read_unicode_string()?),
            ID_ALPHA_IDENTIFIERS => {
                let n = cursor.read_u32()?;
                let mut identifiers = Vec::with_capacity(n as usize);
                for _ in 0..n {
                    identifiers.push(cursor.read_u32()?);
                }
                ImageResource::AlphaIdentifiers(identifiers)
            }
            ID_VERSION_INFO => ImageResource::VersionInfo(VersionInfo::read(cursor)?),
            ID_PRINT_SCALE => ImageResource::PrintScale(PrintScale::read(cursor)?),
            _ => ImageResource::Generic {
                resource_id,
                data: cursor.read(length)?.to_vec(),
            },
        };

        let consumed = cursor.position() - start;
        if consumed != length as u64 {
            return Err(ImageResourceError::WrongAmountRead {
                resource_id,
                expected: length as u64,
                actual: consumed,
            }
            .into());
        }
        Ok(resource)
    }

    fn write_data<W: Write + Seek>(&self, writer: &mut PsdWriter<W>) -> Result<(), PsdError> {
        match self {
            ImageResource::BorderInfo(v) => v.write(writer),
            ImageResource::BackgroundColor(v) => v.write(writer),
            ImageResource::PrintFlags(v) => v.write(writer),
            ImageResource::LayersGroupInfo { group_ids } => {
                for id in group_ids {
                    writer.write_u16(*id)?;
                }
                Ok(())
            }
            ImageResource::GridAndGuidesInfo(v) => v.write(writer),
            ImageResource::CopyrightFlag(v) => writer.write_u8(if *v { 255 } else { 0 }),
            ImageResource::Url(bytes) => writer.write_bytes(bytes),
            ImageResource::GlobalAngle(v) => writer.write_i32(*v),
            ImageResource::EffectsVisible(v) => writer.write_u8(if *v { 255 } else { 0 }),
            ImageResource::DocumentSeedNumber(v) => writer.write_u32(*v),
            ImageResource::UnicodeAlphaNames(s) => writer.write_unicode_string(s),
            ImageResource::GlobalAltitude(v) => writer.write_u32(*v),
            ImageResource::WorkflowUrl(s) => writer.write_unicode_string(s),
            ImageResource::AlphaIdentifiers(ids) => {
                writer.write_u32(ids.len() as u32)?;
                for id in ids {
                    writer.write_u32(*id)?;
                }
                Ok(())
            }
            ImageResource::VersionInfo(v) => v.write(writer),
            ImageResource::PrintScale(v) => v.write(writer),
            ImageResource::Generic { data, .. } => writer.write_bytes(data),
        }
    }

    fn data_length(&self) -> usize {
        match self {
            ImageResource::BorderInfo(_) => 6,
            ImageResource::BackgroundColor(_) => 10,
            ImageResource::PrintFlags(_) => 9,
            ImageResource::LayersGroupInfo { group_ids } => group_ids.len() * 2,
            ImageResource::GridAndGuidesInfo(v) => v.data_length(),
            ImageResource::CopyrightFlag(_) => 1,
            ImageResource::Url(bytes) => bytes.len(),
            ImageResource::GlobalAngle(_) => 4,
            ImageResource::EffectsVisible(_) => 1,
            ImageResource::DocumentSeedNumber(_) => 4,
            ImageResource::UnicodeAlphaNames(s) => 4 + s.encode_utf16().count() * 2 + 2,
            ImageResource::GlobalAltitude(_) => 4,
            ImageResource::WorkflowUrl(s) => 4 + s.encode_utf16().count() * 2 + 2,
            ImageResource::AlphaIdentifiers(ids) => 4 + ids.len() * 4,
            ImageResource::VersionInfo(v) => v.data_length(),
            ImageResource::PrintScale(_) => 14,
            ImageResource::Generic { data, .. } => data.len(),
        }
    }
}

/// One `8BIM`-tagged block: a name plus its decoded resource payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResourceBlock {
    pub name: String,
    pub resource: ImageResource,
}

impl ImageResourceBlock {
    fn read(cursor: &mut PsdCursor) -> Result<ImageResourceBlock, PsdError> {
        let signature: [u8; 4] = cursor.read_4()?.try_into().unwrap();
        if signature != SIGNATURE {
            return Err(ImageResourceError::BadSignature { signature }.into());
        }
        let resource_id = cursor.read_u16()?;
        let name = cursor.read_pascal_string(2)?;
        let length = cursor.read_u32()?;
        let resource = ImageResource::read(cursor, resource_id, length)?;
        if length % 2 != 0 {
            cursor.read(1)?;
        }
        Ok(ImageResourceBlock { name, resource })
    }

    fn write<W: Write + Seek>(&self, writer: &mut PsdWriter<W>) -> Result<(), PsdError> {
        writer.write_bytes(&SIGNATURE)?;
        writer.write_u16(self.resource.resource_id())?;
        writer.write_pascal_string(&self.name, 2)?;
        let length = self.resource.data_length();
        writer.write_u32(length as u32)?;
        let start = writer.position()?;
        self.resource.write_data(writer)?;
        let end = writer.position()?;
        debug_assert_eq!(end - start, length as u64);
        if length % 2 != 0 {
            writer.write_u8(0)?;
        }
        Ok(())
    }

    fn total_length(&self) -> usize {
        let mut len = 4 + 2 + pascal_string_length(&self.name, 2) + 4 + self.resource.data_length();
        if self.resource.data_length() % 2 != 0 {
            len += 1;
        }
        len
    }
}

fn pascal_string_length(s: &str, padding: usize) -> usize {
    let consumed = 1 + s.len().min(u8::MAX as usize);
    crate::io::pad(consumed, padding)
}

/// The section itself: a length-prefixed run of blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageResources {
    pub blocks: Vec<ImageResourceBlock>,
}

impl ImageResources {
    pub fn get(&self, resource_id: u16) -> Option<&ImageResourceBlock> {
        self.blocks.iter().find(|b| b.resource.resource_id() == resource_id)
    }

    pub fn read(cursor: &mut PsdCursor) -> Result<ImageResources, PsdError> {
        let length = cursor.read_u32()? as u64;
        let end = cursor.position() + length;
        let mut blocks = Vec::new();
        while cursor.position() < end {
            blocks.push(ImageResourceBlock::read(cursor)?);
        }
        if cursor.position() != end {
            return Err(ImageResourceError::WrongAmountReadForSection.into());
        }
        Ok(ImageResources { blocks })
    }

    pub fn write<W: Write + Seek>(&self, writer: &mut PsdWriter<W>) -> Result<(), PsdError> {
        let length: usize = self.blocks.iter().map(|b| b.total_length()).sum();
        writer.write_u32(length as u32)?;
        for block in &self.blocks {
            block.write(writer)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ImageResourceError {
    #[error("image resource block signature {signature:?} is not 8BIM")]
    BadSignature { signature: [u8; 4] },
    #[error("resource {resource_id} read the wrong amount: expected {expected}, got {actual}")]
    WrongAmountRead {
        resource_id: u16,
        expected: u64,
        actual: u64,
    },
    #[error("read the wrong amount reading the image resources section")]
    WrongAmountReadForSection,
    #[error("grid and guides info has unknown version {version}, expected 1")]
    UnknownGridAndGuidesVersion { version: u32 },
    #[error(transparent)]
    Enum(EnumError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_and_generic_blocks() {
        let resources = ImageResources {
            blocks: vec![
                ImageResourceBlock {
                    name: String::new(),
                    resource: ImageResource::GlobalAngle(120),
                },
                ImageResourceBlock {
                    name: "odd".into(),
                    resource: ImageResource::Generic {
                        resource_id: 9999,
                        data: vec![1, 2, 3],
                    },
                },
            ],
        };
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            resources.write(&mut w).unwrap();
        }
        let bytes = buf.into_inner();
        let mut cursor = PsdCursor::new(&bytes);
        assert_eq!(ImageResources::read(&mut cursor).unwrap(), resources);
    }

    #[test]
    fn background_color_adjusts_lab_components() {
        let color = ImageResource::BackgroundColor(BackgroundColor {
            color_space: crate::enums::ColorSpace::Lab,
            color: [1, -100, 200, 0],
        });
        let block = ImageResourceBlock {
            name: String::new(),
            resource: color,
        };
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            block.write(&mut w).unwrap();
        }
        let bytes = buf.into_inner();
        let mut cursor = PsdCursor::new(&bytes);
        let read_back = ImageResourceBlock::read(&mut cursor).unwrap();
        assert_eq!(read_back, block);
    }
}
