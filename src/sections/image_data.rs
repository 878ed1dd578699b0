//! The composite (non-layer) image data section (§4.3.4): the merged,
//! flattened image a PSD viewer shows before opening any layers. Grounded on
//! `pytoshop/image_data.py`'s `ImageData`.
//!
//! Unlike a layer's per-channel data, every channel here is packed into one
//! compressed stream shaped `(num_channels * height, width)` — for RLE, each
//! of those stacked rows carries its own independent length-prefixed chunk;
//! for raw/zip it's one flat buffer. This section also has no length prefix
//! of its own: being the last thing in the file, its size is "everything
//! left", so `read` is the one place in this crate that consumes a cursor to
//! its end rather than to byte boundary computed in advance.

use std::io::{Seek, Write};

use crate::codecs;
use crate::enums::{ColorDepth, Compression, Version};
use crate::error::PsdError;
use crate::io::cursor::PsdCursor;
use crate::io::writer::PsdWriter;
use crate::pixel_plane::PixelPlane;

/// Either fully decoded per-channel planes, or an unread reference into the
/// document's bytes that `decode` will slice and decompress on demand.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    Decoded(Vec<PixelPlane>),
    LazyRef {
        compression: Compression,
        offset: u64,
        size: u64,
        height: usize,
        width: usize,
        num_channels: usize,
        depth: ColorDepth,
        version: Version,
    },
}

impl ImageData {
    /// Reads the 2-byte compression code, then records the remainder of the
    /// cursor (everything to its end) as this section's payload.
    pub fn read(
        cursor: &mut PsdCursor,
        height: usize,
        width: usize,
        num_channels: usize,
        depth: ColorDepth,
        version: Version,
    ) -> Result<ImageData, PsdError> {
        let compression = Compression::from_u16(cursor.read_u16()?).map_err(ImageDataError::Enum)?;
        let size = cursor.remaining();
        let offset = cursor.position();
        cursor.read(size as u32)?;
        Ok(ImageData::LazyRef {
            compression,
            offset,
            size,
            height,
            width,
            num_channels,
            depth,
            version,
        })
    }

    /// Materialises one plane per channel, decompressing from `source` if
    /// this is still a lazy reference, then splitting the combined
    /// `(num_channels * height) x width` plane back into `num_channels`
    /// `height x width` planes.
    pub fn decode(&self, source: &[u8]) -> Result<Vec<PixelPlane>, PsdError> {
        match self {
            ImageData::Decoded(planes) => Ok(planes.clone()),
            ImageData::LazyRef {
                compression,
                offset,
                size,
                height,
                width,
                num_channels,
                depth,
                version,
            } => {
                let start = *offset as usize;
                let end = start + *size as usize;
                let bytes = &source[start..end];
                let combined = codecs::decode(
                    *compression,
                    bytes,
                    height * num_channels,
                    *width,
                    *depth,
                    *version,
                )?;
                Ok(split_channels(&combined, *num_channels, *height, *width, *depth))
            }
        }
    }

    /// Writes the 2-byte compression code followed by the payload. A lazy
    /// reference is copied verbatim from `source`; decoded planes are
    /// concatenated into one combined plane and compressed fresh.
    pub fn write<W: Write + Seek>(
        &self,
        writer: &mut PsdWriter<W>,
        source: &[u8],
        compression: Compression,
        version: Version,
    ) -> Result<(), PsdError> {
        match self {
            ImageData::Decoded(planes) => {
                writer.write_u16(compression.as_u16())?;
                let combined = combine_channels(planes);
                codecs::encode(writer, &combined, compression, version)?;
            }
            ImageData::LazyRef {
                compression: stored_compression,
                offset,
                size,
                ..
            } => {
                writer.write_u16(stored_compression.as_u16())?;
                let start = *offset as usize;
                let end = start + *size as usize;
                writer.write_bytes(&source[start..end])?;
            }
        }
        Ok(())
    }
}

fn split_channels(
    combined: &PixelPlane,
    num_channels: usize,
    height: usize,
    width: usize,
    depth: ColorDepth,
) -> Vec<PixelPlane> {
    let bytes = combined.to_bigendian_bytes();
    let channel_bytes = height * width * depth.item_size();
    (0..num_channels)
        .map(|i| {
            let chunk = &bytes[i * channel_bytes..(i + 1) * channel_bytes];
            PixelPlane::from_bigendian_bytes(depth, height, width, chunk)
        })
        .collect()
}

fn combine_channels(planes: &[PixelPlane]) -> PixelPlane {
    let depth = planes[0].depth();
    let width = planes[0].width();
    let height = planes[0].height();
    let mut bytes = Vec::new();
    for plane in planes {
        bytes.extend_from_slice(&plane.to_bigendian_bytes());
    }
    PixelPlane::from_bigendian_bytes(depth, height * planes.len(), width, &bytes)
}

#[derive(Debug, thiserror::Error)]
pub enum ImageDataError {
    #[error(transparent)]
    Enum(crate::enums::EnumError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_decoded_planes_through_raw_compression() {
        let planes = vec![
            PixelPlane::constant(ColorDepth::Eight, 2, 2, 10),
            PixelPlane::constant(ColorDepth::Eight, 2, 2, 20),
        ];
        let image_data = ImageData::Decoded(planes.clone());

        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            image_data
                .write(&mut w, &[], Compression::Raw, Version::One)
                .unwrap();
        }
        let bytes = buf.into_inner();

        let mut cursor = PsdCursor::new(&bytes);
        let read_back = ImageData::read(&mut cursor, 2, 2, 2, ColorDepth::Eight, Version::One).unwrap();
        let decoded = read_back.decode(&bytes).unwrap();
        assert_eq!(decoded, planes);
    }
}
