//! The list of `LayerRecord`s inside the layer-and-mask section. Grounded on
//! `pytoshop/layers.py`'s `LayerInfo`.

use std::io::{Seek, Write};

use crate::enums::{ColorDepth, Compression, Version};
use crate::error::PsdError;
use crate::io::cursor::PsdCursor;
use crate::io::writer::PsdWriter;

use super::LayerRecord;

/// | Length | Description |
/// |---|---|
/// | 4/8 | Length of the following data (u64 in PSB); 0 means no layers |
/// | 2 | Signed layer count; negative means the first channel is alpha |
/// | var | Every `LayerRecord`'s header, back to back |
/// | var | Every `LayerRecord`'s channel data, in the same order |
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerInfo {
    pub layer_records: Vec<LayerRecord>,
    pub use_alpha_channel: bool,
}

impl LayerInfo {
    pub fn read(
        cursor: &mut PsdCursor,
        version: Version,
        depth: ColorDepth,
        doc_height: u32,
        doc_width: u32,
    ) -> Result<LayerInfo, PsdError> {
        let length = cursor.read_length(version.is_large())?;
        let end = cursor.position() + length;
        if length == 0 {
            return Ok(LayerInfo::default());
        }

        let raw_count = cursor.read_i16()?;
        let use_alpha_channel = raw_count < 0;
        let layer_count = raw_count.unsigned_abs();

        let mut records_and_tables = Vec::with_capacity(layer_count as usize);
        for _ in 0..layer_count {
            records_and_tables.push(LayerRecord::read(cursor, version, doc_height, doc_width)?);
        }

        let mut layer_records = Vec::with_capacity(records_and_tables.len());
        for (mut record, channel_table) in records_and_tables {
            record.read_channel_data(cursor, depth, version, &channel_table)?;
            layer_records.push(record);
        }

        cursor.seek_from_start(end)?;

        Ok(LayerInfo {
            layer_records,
            use_alpha_channel,
        })
    }

    pub fn write<W: Write + Seek>(
        &self,
        writer: &mut PsdWriter<W>,
        version: Version,
        compression: Compression,
        source: &[u8],
        doc_height: u32,
        doc_width: u32,
    ) -> Result<(), PsdError> {
        if self.layer_records.is_empty() {
            writer.write_length(version.is_large(), 0)?;
            return Ok(());
        }

        writer.write_with_patched_length(version.is_large(), |writer| {
            let mut layer_count = self.layer_records.len() as i16;
            if self.use_alpha_channel {
                layer_count = -layer_count;
            }
            writer.write_i16(layer_count)?;

            let mut channel_lengths_offsets = Vec::with_capacity(self.layer_records.len());
            for record in &self.layer_records {
                channel_lengths_offsets.push(record.write(writer, version, doc_height, doc_width)?);
            }
            for (record, offset) in self.layer_records.iter().zip(channel_lengths_offsets) {
                record.write_channel_data(writer, source, compression, version, offset)?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{BlendMode, ChannelId};
    use crate::sections::blending_range::BlendingRanges;
    use crate::sections::layer_and_mask::ChannelImageData;

    #[test]
    fn empty_layer_info_round_trips_as_zero_length() {
        let info = LayerInfo::default();
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            info.write(&mut w, Version::One, Compression::Raw, &[], 0, 0).unwrap();
        }
        let bytes = buf.into_inner();
        assert_eq!(bytes, vec![0, 0, 0, 0]);
        let mut cursor = PsdCursor::new(&bytes);
        let read_back = LayerInfo::read(&mut cursor, Version::One, ColorDepth::Eight, 0, 0).unwrap();
        assert_eq!(read_back, info);
    }

    #[test]
    fn round_trips_two_layers_with_alpha_flag() {
        let layer = LayerRecord {
            top: 0,
            left: 0,
            bottom: 1,
            right: 1,
            blend_mode: BlendMode::NORMAL,
            opacity: 255,
            clipping: false,
            transparency_protected: false,
            visible: true,
            pixel_data_irrelevant: false,
            mask: None,
            blending_ranges: BlendingRanges::default(),
            name: "a".to_string(),
            blocks: Vec::new(),
            channels: vec![(
                ChannelId(0),
                ChannelImageData::Decoded(crate::pixel_plane::PixelPlane::constant(
                    ColorDepth::Eight,
                    1,
                    1,
                    7,
                )),
            )],
        };
        let info = LayerInfo {
            layer_records: vec![layer.clone(), layer],
            use_alpha_channel: true,
        };

        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            info.write(&mut w, Version::One, Compression::Raw, &[], 1, 1).unwrap();
        }
        let bytes = buf.into_inner();
        let mut cursor = PsdCursor::new(&bytes);
        let read_back = LayerInfo::read(&mut cursor, Version::One, ColorDepth::Eight, 1, 1).unwrap();
        assert!(read_back.use_alpha_channel);
        assert_eq!(read_back.layer_records.len(), 2);
        assert_eq!(read_back.layer_records[0].name, "a");
    }
}
