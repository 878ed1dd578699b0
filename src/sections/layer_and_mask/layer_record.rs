//! A single logical layer's header, mask, blending ranges, name, and tagged
//! blocks, plus its channel pixel data. Grounded on `pytoshop/layers.py`'s
//! `LayerRecord`.
//!
//! Reading and writing both happen in two passes, mirroring the original:
//! the header pass reads/writes everything except pixel bytes, stashing a
//! `(ChannelId, length)` table; a second pass reads/writes the channel data
//! itself once every layer's header is known. Unlike the original, channels
//! keep their on-disk order rather than being re-sorted by id — that sort
//! was an incidental side effect of storing them in a dict keyed by id, not
//! a requirement of the format.

use std::io::{Seek, Write};

use thiserror::Error;

use crate::enums::{BlendMode, ChannelId, ColorDepth, EnumError, Version};
use crate::error::PsdError;
use crate::io::cursor::PsdCursor;
use crate::io::writer::PsdWriter;
use crate::io::{pack_bitflags, unpack_bitflags};
use crate::sections::blending_range::BlendingRanges;
use crate::tagged_block::TaggedBlock;

use super::{ChannelImageData, LayerMask};

/// Tail padding for tagged blocks nested inside a layer record's extra data.
const LAYER_RECORD_BLOCK_PADDING: u32 = 1;

/// | Length | Description |
/// |---|---|
/// | 16 | Enclosing rectangle (top, left, bottom, right) |
/// | 2 | Channel count N |
/// | 6/10 × N | Per-channel (id, length), id i16 + length u32 (u64 in PSB) |
/// | 4 | Blend mode signature, always `8BIM` |
/// | 4 | Blend mode key |
/// | 1 | Opacity |
/// | 1 | Clipping |
/// | 1 | Flags |
/// | 1 | Filler |
/// | 4 | Extra data length |
/// | var | `LayerMask` |
/// | var | `BlendingRanges` |
/// | var | Pascal string name, padded to 4 |
/// | var | Zero or more `TaggedBlock`s, padded to 1 (i.e. unpadded) |
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRecord {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
    pub blend_mode: BlendMode,
    pub opacity: u8,
    pub clipping: bool,
    pub transparency_protected: bool,
    pub visible: bool,
    pub pixel_data_irrelevant: bool,
    pub mask: Option<LayerMask>,
    pub blending_ranges: BlendingRanges,
    pub name: String,
    pub blocks: Vec<TaggedBlock>,
    pub channels: Vec<(ChannelId, ChannelImageData)>,
}

impl LayerRecord {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Channel ids other than the two mask channels decode against this
    /// layer's own rectangle.
    fn channel_shape(&self, channel_id: ChannelId) -> (usize, usize) {
        match channel_id {
            ChannelId::USER_LAYER_MASK => self
                .mask
                .map(|m| (m.height() as usize, m.width() as usize))
                .unwrap_or((0, 0)),
            ChannelId::REAL_USER_LAYER_MASK => self
                .mask
                .map(|m| (m.real_bottom - m.real_top, m.real_right - m.real_left))
                .map(|(h, w)| (h as usize, w as usize))
                .unwrap_or((0, 0)),
            _ => (self.height() as usize, self.width() as usize),
        }
    }

    fn extra_length(&self, version: Version) -> u32 {
        let mask_length = LayerMask::total_length(self.mask.as_ref()) as u64;
        let blending_length = self.blending_ranges.total_length();
        let name_length = crate::io::pad(1 + self.name.as_bytes().len().min(255), 4) as u64;
        let blocks_length: u64 = self
            .blocks
            .iter()
            .map(|b| b.total_length(version, LAYER_RECORD_BLOCK_PADDING))
            .sum();
        (mask_length + blending_length + name_length + blocks_length) as u32
    }

    /// Reads everything about this layer except its pixel data, returning
    /// the record alongside the raw `(channel_id, on-disk length)` table
    /// `read_channel_data` needs for its second pass.
    pub fn read(
        cursor: &mut PsdCursor,
        version: Version,
        doc_height: u32,
        doc_width: u32,
    ) -> Result<(LayerRecord, Vec<(ChannelId, u64)>), PsdError> {
        let top = cursor.read_i32()?;
        let left = cursor.read_i32()?;
        let bottom = cursor.read_i32()?;
        let right = cursor.read_i32()?;

        let num_channels = cursor.read_u16()?;
        let mut channel_table = Vec::with_capacity(num_channels as usize);
        for _ in 0..num_channels {
            let channel_id = ChannelId(cursor.read_i16()?);
            let length = cursor.read_length(version.is_large())?;
            channel_table.push((channel_id, length));
        }

        let blend_mode_signature: [u8; 4] = cursor.read_4()?.try_into().unwrap();
        if &blend_mode_signature != b"8BIM" {
            return Err(LayerRecordError::BadBlendModeSignature {
                signature: blend_mode_signature,
            }
            .into());
        }
        let blend_mode = BlendMode(cursor.read_4()?.try_into().unwrap());
        let opacity = cursor.read_u8()?;
        let clipping = cursor.read_u8()? != 0;

        let flags = cursor.read_u8()?;
        let bits = unpack_bitflags(flags, 5);
        let transparency_protected = bits[0];
        let visible = !bits[1];
        let pixel_data_irrelevant = bits[4];
        cursor.read_1()?; // filler

        let extra_length = cursor.read_u32()?;
        let end = cursor.position() + extra_length as u64;

        let mask = LayerMask::read(cursor)?;
        let blending_ranges = BlendingRanges::read(cursor)?;
        let name = cursor.read_pascal_string(4)?;

        let mut blocks = Vec::new();
        while cursor.position() < end {
            blocks.push(TaggedBlock::read(
                cursor,
                version,
                doc_height,
                doc_width,
                LAYER_RECORD_BLOCK_PADDING,
            )?);
        }
        cursor.seek_from_start(end)?;

        Ok((
            LayerRecord {
                top,
                left,
                bottom,
                right,
                blend_mode,
                opacity,
                clipping,
                transparency_protected,
                visible,
                pixel_data_irrelevant,
                mask,
                blending_ranges,
                name,
                blocks,
                channels: Vec::new(),
            },
            channel_table,
        ))
    }

    /// Second pass: decode (or stash lazy references for) every channel
    /// using the table `read` captured, now that the mask's shape is known.
    pub fn read_channel_data(
        &mut self,
        cursor: &mut PsdCursor,
        depth: ColorDepth,
        version: Version,
        channel_table: &[(ChannelId, u64)],
    ) -> Result<(), PsdError> {
        let mut channels = Vec::with_capacity(channel_table.len());
        for &(channel_id, channel_length) in channel_table {
            let (rows, cols) = self.channel_shape(channel_id);
            let data = ChannelImageData::read(cursor, rows, cols, depth, version, channel_length)?;
            channels.push((channel_id, data));
        }
        self.channels = channels;
        Ok(())
    }

    /// Writes everything but pixel data, reserving (but not yet filling in)
    /// the per-channel length table. Returns the offset of that table so
    /// `write_channel_data` can seek back and patch it in.
    pub fn write<W: Write + Seek>(
        &self,
        writer: &mut PsdWriter<W>,
        version: Version,
        doc_height: u32,
        doc_width: u32,
    ) -> Result<u64, PsdError> {
        writer.write_i32(self.top)?;
        writer.write_i32(self.left)?;
        writer.write_i32(self.bottom)?;
        writer.write_i32(self.right)?;

        writer.write_u16(self.channels.len() as u16)?;
        let channel_lengths_offset = writer.position()?;
        let slot_width: u64 = if version.is_large() { 10 } else { 6 };
        writer.skip(slot_width * self.channels.len() as u64)?;

        writer.write_bytes(b"8BIM")?;
        writer.write_bytes(&self.blend_mode.0)?;
        writer.write_u8(self.opacity)?;
        writer.write_u8(self.clipping as u8)?;
        let flags = pack_bitflags(&[
            self.transparency_protected,
            !self.visible,
            false,
            true,
            self.pixel_data_irrelevant,
        ]);
        writer.write_u8(flags)?;
        writer.write_u8(0)?; // filler

        writer.write_u32(self.extra_length(version))?;
        LayerMask::write(self.mask.as_ref(), writer)?;
        self.blending_ranges.write(writer)?;
        writer.write_pascal_string(&self.name, 4)?;
        for block in &self.blocks {
            block.write(
                writer,
                version,
                doc_height,
                doc_width,
                LAYER_RECORD_BLOCK_PADDING,
            )?;
        }

        Ok(channel_lengths_offset)
    }

    /// Second pass: writes every channel's pixel bytes, then seeks back to
    /// `channel_lengths_offset` (captured by `write`) to fill in the table.
    pub fn write_channel_data<W: Write + Seek>(
        &self,
        writer: &mut PsdWriter<W>,
        source: &[u8],
        compression: crate::enums::Compression,
        version: Version,
        channel_lengths_offset: u64,
    ) -> Result<(), PsdError> {
        let mut lengths = Vec::with_capacity(self.channels.len());
        for (_, data) in &self.channels {
            lengths.push(data.write(writer, source, compression, version)?);
        }

        let resume = writer.position()?;
        writer.seek_from_start(channel_lengths_offset)?;
        for ((channel_id, _), length) in self.channels.iter().zip(lengths) {
            writer.write_i16(channel_id.0)?;
            writer.write_length(version.is_large(), length)?;
        }
        writer.seek_from_start(resume)?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum LayerRecordError {
    #[error("invalid blend mode signature {signature:?}, must be 8BIM")]
    BadBlendModeSignature { signature: [u8; 4] },
    #[error(transparent)]
    Enum(EnumError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Compression;

    fn sample_layer() -> LayerRecord {
        LayerRecord {
            top: 0,
            left: 0,
            bottom: 2,
            right: 2,
            blend_mode: BlendMode::NORMAL,
            opacity: 255,
            clipping: false,
            transparency_protected: false,
            visible: true,
            pixel_data_irrelevant: false,
            mask: None,
            blending_ranges: BlendingRanges::default(),
            name: "layer 1".to_string(),
            blocks: Vec::new(),
            channels: vec![
                (
                    ChannelId(0),
                    ChannelImageData::Decoded(crate::pixel_plane::PixelPlane::constant(
                        ColorDepth::Eight,
                        2,
                        2,
                        0,
                    )),
                ),
                (
                    ChannelId(1),
                    ChannelImageData::Decoded(crate::pixel_plane::PixelPlane::constant(
                        ColorDepth::Eight,
                        2,
                        2,
                        0,
                    )),
                ),
            ],
        }
    }

    #[test]
    fn round_trips_header_and_channel_data() {
        let layer = sample_layer();
        let mut buf = std::io::Cursor::new(Vec::new());
        let channel_lengths_offset;
        {
            let mut w = PsdWriter::new(&mut buf);
            channel_lengths_offset = layer.write(&mut w, Version::One, 2, 2).unwrap();
            layer
                .write_channel_data(&mut w, &[], Compression::Raw, Version::One, channel_lengths_offset)
                .unwrap();
        }
        let bytes = buf.into_inner();

        let mut cursor = PsdCursor::new(&bytes);
        let (mut record, channel_table) = LayerRecord::read(&mut cursor, Version::One, 2, 2).unwrap();
        assert_eq!(record.name, "layer 1");
        assert_eq!(channel_table.len(), 2);
        record
            .read_channel_data(&mut cursor, ColorDepth::Eight, Version::One, &channel_table)
            .unwrap();
        assert_eq!(record.channels.len(), 2);
        assert_eq!(record.channels[0].0, ChannelId(0));
        assert_eq!(record.channels[1].0, ChannelId(1));
        for (_, data) in &record.channels {
            let plane = data.decode(&bytes).unwrap();
            assert_eq!(plane.height(), 2);
            assert_eq!(plane.width(), 2);
        }
    }

    #[test]
    fn rejects_bad_blend_mode_signature() {
        let mut bytes = vec![];
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes());
        bytes.extend_from_slice(b"XXXX");

        let mut cursor = PsdCursor::new(&bytes);
        let err = LayerRecord::read(&mut cursor, Version::One, 2, 2).unwrap_err();
        assert!(matches!(
            err,
            PsdError::LayerRecord(LayerRecordError::BadBlendModeSignature { .. })
        ));
    }
}
