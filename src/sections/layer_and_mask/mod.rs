//! The layer-and-mask information section (§4.3.3): a length-prefixed
//! container holding every layer's records and pixel data, an optional
//! global layer mask, and a version-4-padded tail of additional tagged
//! blocks. Grounded on `pytoshop/layers.py`'s `LayerAndMaskInfo`.

mod channel_image_data;
mod global_mask;
mod layer_info;
mod layer_mask;
mod layer_record;

pub use channel_image_data::ChannelImageData;
pub use global_mask::GlobalLayerMaskInfo;
pub use layer_info::LayerInfo;
pub use layer_mask::{LayerMask, LayerMaskError};
pub use layer_record::{LayerRecord, LayerRecordError};

use std::io::{Seek, Write};

use crate::enums::{ColorDepth, Compression, Version};
use crate::error::PsdError;
use crate::io::cursor::PsdCursor;
use crate::io::writer::PsdWriter;
use crate::tagged_block::TaggedBlock;

/// The tail-padding width used for every tagged block stored directly in
/// this section's `additional_layer_info`, as opposed to the padding-1
/// blocks nested inside a `LayerRecord`'s extra data.
const ADDITIONAL_LAYER_INFO_PADDING: u32 = 4;

/// | Length | Description |
/// |---|---|
/// | 4/8 | Length of the following data (u64 in PSB) |
/// | var | `LayerInfo` |
/// | var | `GlobalLayerMaskInfo`, present only if any additional data follows |
/// | var | Zero or more `TaggedBlock`s, padded to a multiple of 4 |
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerAndMaskInfo {
    pub layer_info: LayerInfo,
    pub global_layer_mask_info: Option<GlobalLayerMaskInfo>,
    pub additional_layer_info: Vec<TaggedBlock>,
}

impl LayerAndMaskInfo {
    pub fn read(
        cursor: &mut PsdCursor,
        version: Version,
        depth: ColorDepth,
        height: u32,
        width: u32,
    ) -> Result<LayerAndMaskInfo, PsdError> {
        let length = cursor.read_length(version.is_large())?;
        let end = cursor.position() + length;

        let layer_info = LayerInfo::read(cursor, version, depth, height, width)?;

        let mut global_layer_mask_info = None;
        let mut additional_layer_info = Vec::new();
        if cursor.position() < end {
            global_layer_mask_info = Some(GlobalLayerMaskInfo::read(cursor)?);

            while cursor.position() < end {
                additional_layer_info.push(TaggedBlock::read(
                    cursor,
                    version,
                    height,
                    width,
                    ADDITIONAL_LAYER_INFO_PADDING,
                )?);
            }
        }

        Ok(LayerAndMaskInfo {
            layer_info,
            global_layer_mask_info,
            additional_layer_info,
        })
    }

    pub fn write<W: Write + Seek>(
        &self,
        writer: &mut PsdWriter<W>,
        version: Version,
        compression: Compression,
        source: &[u8],
        height: u32,
        width: u32,
    ) -> Result<(), PsdError> {
        writer.write_with_patched_length(version.is_large(), |writer| {
            self.layer_info
                .write(writer, version, compression, source, height, width)?;

            if self.global_layer_mask_info.is_some() || !self.additional_layer_info.is_empty() {
                self.global_layer_mask_info
                    .clone()
                    .unwrap_or_default()
                    .write(writer)?;
                for block in &self.additional_layer_info {
                    block.write(
                        writer,
                        version,
                        height,
                        width,
                        ADDITIONAL_LAYER_INFO_PADDING,
                    )?;
                }
            }

            Ok(())
        })
    }
}
