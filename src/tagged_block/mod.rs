//! Tagged blocks: the code-keyed extension records hung off layer records
//! (`LayerRecord::extra_data`) and off the layer-and-mask section itself
//! (`LayerAndMaskInfo::additional_layer_info`). Grounded on
//! `pytoshop/tagged_block.py`'s `TaggedBlock` subclasses.

use std::io::{Seek, Write};

use log::trace;
use thiserror::Error;

use crate::enums::{BlendMode, SectionDividerSetting, Version};
use crate::error::PsdError;
use crate::io::cursor::PsdCursor;
use crate::io::writer::PsdWriter;
use crate::io::{pack_bitflags, unpack_bitflags};
use crate::path::PathResource;

/// Codes whose length field widens to `u64` (and whose block signature
/// becomes `8B64` instead of `8BIM`) in PSB files. These are all "large
/// layer info" blocks that can legitimately exceed 4GB.
const LARGE_LAYER_INFO_CODES: [[u8; 4]; 17] = [
    *b"LMsk", *b"Lr16", *b"Lr32", *b"Layr", *b"Mt16", *b"Mt32", *b"Mtrn", *b"Alph", *b"FMsk",
    *b"Ink2", *b"FEid", *b"FXid", *b"PxSD", *b"lnkD", *b"lnk2", *b"lnk3", *b"lnkE",
];

fn is_long_length(code: &[u8; 4], version: Version) -> bool {
    version.is_large() && LARGE_LAYER_INFO_CODES.contains(code)
}

fn pad(length: u64, padding: u64) -> u64 {
    if padding < 2 {
        length
    } else {
        length + ((padding - (length % padding)) % padding)
    }
}

/// The shared payload of `lsct`/`lsdk`, which differ only in their code and
/// in whether the group they mark participates in the animation timeline as
/// a "scene group" (`subtype`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionDivider {
    pub setting: SectionDividerSetting,
    pub key: Option<BlendMode>,
    pub subtype: Option<bool>,
}

impl SectionDivider {
    fn read(cursor: &mut PsdCursor, end: u64) -> Result<SectionDivider, PsdError> {
        let setting = SectionDividerSetting::from_u32(cursor.read_u32()?)
            .map_err(TaggedBlockError::Enum)?;
        let mut key = None;
        let mut subtype = None;
        if cursor.position() < end {
            let sig: [u8; 4] = cursor.read_4()?.try_into().unwrap();
            if &sig != b"8BIM" {
                return Err(TaggedBlockError::BadSectionDividerSignature { signature: sig }.into());
            }
            let code: [u8; 4] = cursor.read_4()?.try_into().unwrap();
            key = Some(BlendMode(code));
            if cursor.position() < end {
                subtype = Some(cursor.read_u32()? != 0);
            }
        }
        Ok(SectionDivider {
            setting,
            key,
            subtype,
        })
    }

    fn write<W: Write + Seek>(&self, writer: &mut PsdWriter<W>) -> Result<(), PsdError> {
        writer.write_u32(self.setting.as_u32())?;
        if self.key.is_some() || self.subtype.is_some() {
            let key = self.key.unwrap_or(BlendMode::NORMAL);
            writer.write_bytes(b"8BIM")?;
            writer.write_bytes(&key.0)?;
            if let Some(subtype) = self.subtype {
                writer.write_u32(if subtype { 1 } else { 0 })?;
            }
        }
        Ok(())
    }

    fn data_length(&self) -> u64 {
        let mut length = 4;
        if self.subtype.is_some() {
            length += 12;
        } else if self.key.is_some() {
            length += 8;
        }
        length
    }
}

/// One entry of a `shmd` metadata-setting block. `copy` is carried through
/// verbatim with no assigned semantics of our own (Photoshop treats it as a
/// "copy on duplicate" flag but we never act on it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    pub key: [u8; 4],
    pub copy: i8,
    pub data: Vec<u8>,
}

/// A single tagged block. `Generic` is the fallback for any code this crate
/// doesn't model explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum TaggedBlock {
    UnicodeLayerName(String),
    LayerId(u32),
    LayerColor(u16),
    LayerNameSource(u32),
    SectionDivider(SectionDivider),
    NestedSectionDivider(SectionDivider),
    VectorMask {
        version: u32,
        invert: bool,
        not_link: bool,
        disable: bool,
        path_resource: PathResource,
    },
    Metadata(Vec<MetadataEntry>),
    Generic {
        code: [u8; 4],
        data: Vec<u8>,
    },
}

impl TaggedBlock {
    pub fn code(&self) -> [u8; 4] {
        match self {
            TaggedBlock::UnicodeLayerName(_) => *b"luni",
            TaggedBlock::LayerId(_) => *b"lyid",
            TaggedBlock::LayerColor(_) => *b"lclr",
            TaggedBlock::LayerNameSource(_) => *b"lnsr",
            TaggedBlock::SectionDivider(_) => *b"lsct",
            TaggedBlock::NestedSectionDivider(_) => *b"lsdk",
            TaggedBlock::VectorMask { .. } => *b"vmsk",
            TaggedBlock::Metadata(_) => *b"shmd",
            TaggedBlock::Generic { code, .. } => *code,
        }
    }

    /// Reads one `8BIM`/`8B64`-signed tagged block, including its own
    /// code/length header. `padding` rounds the payload up when skipping
    /// trailing pad bytes (1 inside a layer record's extra data, 4 for the
    /// layer-and-mask section's additional info list).
    pub fn read(
        cursor: &mut PsdCursor,
        version: Version,
        height: u32,
        width: u32,
        padding: u32,
    ) -> Result<TaggedBlock, PsdError> {
        let signature: [u8; 4] = cursor.read_4()?.try_into().unwrap();
        if &signature != b"8BIM" && &signature != b"8B64" {
            return Err(TaggedBlockError::BadSignature { signature }.into());
        }
        let code: [u8; 4] = cursor.read_4()?.try_into().unwrap();
        let length = cursor.read_length(is_long_length(&code, version))?;
        let padded_length = pad(length, padding as u64);
        trace!(
            "tagged block {:?} at offset {}, {} byte(s)",
            String::from_utf8_lossy(&code),
            cursor.position(),
            length
        );

        let start = cursor.position();
        let end = start + length;
        let block = match &code {
            b"luni" => TaggedBlock::UnicodeLayerName(cursor.read_unicode_string()?),
            b"lyid" => TaggedBlock::LayerId(cursor.read_u32()?),
            b"lclr" => {
                let color = cursor.read_u16()?;
                cursor.read_u16()?;
                cursor.read_u16()?;
                cursor.read_u16()?;
                TaggedBlock::LayerColor(color)
            }
            b"lnsr" => TaggedBlock::LayerNameSource(cursor.read_u32()?),
            b"lsct" => TaggedBlock::SectionDivider(SectionDivider::read(cursor, end)?),
            b"lsdk" => TaggedBlock::NestedSectionDivider(SectionDivider::read(cursor, end)?),
            b"vmsk" => {
                let version_field = cursor.read_u32()?;
                let flags = cursor.read_u32()?;
                let bits = unpack_bitflags(flags as u8, 3);
                let path_resource = PathResource::read(cursor, length - 8, height, width)?;
                TaggedBlock::VectorMask {
                    version: version_field,
                    invert: bits[0],
                    not_link: bits[1],
                    disable: bits[2],
                    path_resource,
                }
            }
            b"shmd" => {
                let count = cursor.read_u32()?;
                let mut entries = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let _signature: [u8; 4] = cursor.read_4()?.try_into().unwrap();
                    let key: [u8; 4] = cursor.read_4()?.try_into().unwrap();
                    let copy = cursor.read_i8()?;
                    cursor.read(3)?;
                    let entry_length = cursor.read_u32()?;
                    let data = cursor.read(entry_length)?.to_vec();
                    let padded_entry = pad(entry_length as u64, 4);
                    let consumed = entry_length as u64;
                    if padded_entry > consumed {
                        cursor.read((padded_entry - consumed) as u32)?;
                    }
                    entries.push(MetadataEntry { key, copy, data });
                }
                TaggedBlock::Metadata(entries)
            }
            _ => TaggedBlock::Generic {
                code,
                data: cursor.read(length as u32)?.to_vec(),
            },
        };

        let read_amount = cursor.position() - start;
        if read_amount != length {
            return Err(TaggedBlockError::WrongAmountRead {
                code,
                expected: length,
                actual: read_amount,
            }
            .into());
        }
        let remaining = padded_length - length;
        if remaining > 0 {
            cursor.read(remaining as u32)?;
        }

        Ok(block)
    }

    /// The full on-wire size of this block including its signature, code,
    /// length field, and trailing pad bytes — what a containing section
    /// needs to reserve for an `extra_length`/section length field.
    pub fn total_length(&self, version: Version, padding: u32) -> u64 {
        let code = self.code();
        let mut length = 8;
        length += if is_long_length(&code, version) { 8 } else { 4 };
        length += pad(self.data_length(), padding as u64);
        length
    }

    fn data_length(&self) -> u64 {
        match self {
            TaggedBlock::UnicodeLayerName(name) => {
                4 + name.encode_utf16().count() as u64 * 2 + 2
            }
            TaggedBlock::LayerId(_) => 4,
            TaggedBlock::LayerColor(_) => 8,
            TaggedBlock::LayerNameSource(_) => 4,
            TaggedBlock::SectionDivider(s) | TaggedBlock::NestedSectionDivider(s) => {
                s.data_length()
            }
            TaggedBlock::VectorMask { path_resource, .. } => 8 + path_resource.length(),
            TaggedBlock::Metadata(entries) => {
                4 + entries
                    .iter()
                    .map(|e| 16 + pad(e.data.len() as u64, 4))
                    .sum::<u64>()
            }
            TaggedBlock::Generic { data, .. } => data.len() as u64,
        }
    }

    fn write_data<W: Write + Seek>(
        &self,
        writer: &mut PsdWriter<W>,
        height: u32,
        width: u32,
    ) -> Result<(), PsdError> {
        match self {
            TaggedBlock::UnicodeLayerName(name) => writer.write_unicode_string(name)?,
            TaggedBlock::LayerId(id) => writer.write_u32(*id)?,
            TaggedBlock::LayerColor(color) => {
                writer.write_u16(*color)?;
                writer.write_u16(0)?;
                writer.write_u16(0)?;
                writer.write_u16(0)?;
            }
            TaggedBlock::LayerNameSource(id) => writer.write_u32(*id)?,
            TaggedBlock::SectionDivider(s) | TaggedBlock::NestedSectionDivider(s) => {
                s.write(writer)?
            }
            TaggedBlock::VectorMask {
                version,
                invert,
                not_link,
                disable,
                path_resource,
            } => {
                let flags = pack_bitflags(&[*invert, *not_link, *disable]);
                writer.write_u32(*version)?;
                writer.write_u32(flags as u32)?;
                path_resource.write(writer, height, width)?;
            }
            TaggedBlock::Metadata(entries) => {
                writer.write_u32(entries.len() as u32)?;
                for entry in entries {
                    writer.write_bytes(b"8BIM")?;
                    writer.write_bytes(&entry.key)?;
                    writer.write_i8(entry.copy)?;
                    writer.write_bytes(&[0; 3])?;
                    writer.write_u32(entry.data.len() as u32)?;
                    writer.write_bytes(&entry.data)?;
                    let padded = pad(entry.data.len() as u64, 4);
                    if padded > entry.data.len() as u64 {
                        writer.write_bytes(&vec![0u8; (padded - entry.data.len() as u64) as usize])?;
                    }
                }
            }
            TaggedBlock::Generic { data, .. } => writer.write_bytes(data)?,
        }
        Ok(())
    }

    pub fn write<W: Write + Seek>(
        &self,
        writer: &mut PsdWriter<W>,
        version: Version,
        height: u32,
        width: u32,
        padding: u32,
    ) -> Result<(), PsdError> {
        let code = self.code();
        if is_long_length(&code, version) {
            writer.write_bytes(b"8B64")?;
        } else {
            writer.write_bytes(b"8BIM")?;
        }
        writer.write_bytes(&code)?;

        let length = self.data_length();
        let padded_length = pad(length, padding as u64);
        writer.write_length(is_long_length(&code, version), length)?;

        let start = writer.position()?;
        self.write_data(writer, height, width)?;
        let end = writer.position()?;
        let written = end - start;
        if written != length {
            return Err(TaggedBlockError::WrongAmountWritten {
                code,
                expected: length,
                actual: written,
            }
            .into());
        }
        let remaining = padded_length - length;
        if remaining > 0 {
            writer.write_bytes(&vec![0u8; remaining as usize])?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum TaggedBlockError {
    #[error("invalid tagged block signature {signature:?}, must be 8BIM or 8B64")]
    BadSignature { signature: [u8; 4] },
    #[error("invalid 8BIM signature inside section divider block, got {signature:?}")]
    BadSectionDividerSignature { signature: [u8; 4] },
    #[error(transparent)]
    Enum(crate::enums::EnumError),
    #[error("tagged block {code:?} read the wrong amount: expected {expected}, got {actual}")]
    WrongAmountRead {
        code: [u8; 4],
        expected: u64,
        actual: u64,
    },
    #[error("tagged block {code:?} wrote the wrong amount: expected {expected}, got {actual}")]
    WrongAmountWritten {
        code: [u8; 4],
        expected: u64,
        actual: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(block: &TaggedBlock, version: Version, height: u32, width: u32, padding: u32) -> TaggedBlock {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            block.write(&mut w, version, height, width, padding).unwrap();
        }
        let bytes = buf.into_inner();
        let mut cursor = PsdCursor::new(&bytes);
        TaggedBlock::read(&mut cursor, version, height, width, padding).unwrap()
    }

    #[test]
    fn round_trips_unicode_layer_name() {
        let block = TaggedBlock::UnicodeLayerName("hello".to_string());
        assert_eq!(round_trip(&block, Version::One, 10, 10, 1), block);
    }

    #[test]
    fn round_trips_layer_id() {
        let block = TaggedBlock::LayerId(42);
        assert_eq!(round_trip(&block, Version::One, 10, 10, 1), block);
    }

    #[test]
    fn round_trips_section_divider_with_key_and_subtype() {
        let block = TaggedBlock::SectionDivider(SectionDivider {
            setting: SectionDividerSetting::Open,
            key: Some(BlendMode::NORMAL),
            subtype: Some(true),
        });
        assert_eq!(round_trip(&block, Version::One, 10, 10, 1), block);
    }

    #[test]
    fn round_trips_section_divider_bare() {
        let block = TaggedBlock::SectionDivider(SectionDivider {
            setting: SectionDividerSetting::Bounding,
            key: None,
            subtype: None,
        });
        assert_eq!(round_trip(&block, Version::One, 10, 10, 1), block);
    }

    #[test]
    fn round_trips_vector_mask() {
        let block = TaggedBlock::VectorMask {
            version: 3,
            invert: true,
            not_link: false,
            disable: false,
            path_resource: PathResource::from_rect(0.0, 0.0, 50.0, 50.0),
        };
        assert_eq!(round_trip(&block, Version::One, 100, 100, 1), block);
    }

    #[test]
    fn round_trips_metadata_preserving_copy_byte() {
        let block = TaggedBlock::Metadata(vec![MetadataEntry {
            key: *b"mlst",
            copy: 0,
            data: vec![1, 2, 3],
        }]);
        assert_eq!(round_trip(&block, Version::One, 10, 10, 1), block);
    }

    #[test]
    fn round_trips_generic_fallback() {
        let block = TaggedBlock::Generic {
            code: *b"zzzz",
            data: vec![9, 9, 9],
        };
        assert_eq!(round_trip(&block, Version::One, 10, 10, 1), block);
    }

    #[test]
    fn large_layer_info_codes_use_8b64_and_u64_length_in_psb() {
        let block = TaggedBlock::Generic {
            code: *b"Lr16",
            data: vec![0; 4],
        };
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            block.write(&mut w, Version::Two, 10, 10, 1).unwrap();
        }
        let bytes = buf.into_inner();
        assert_eq!(&bytes[0..4], b"8B64");
    }
}
