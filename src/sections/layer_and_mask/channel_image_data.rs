//! A single channel's compressed pixel plane. Grounded on
//! `pytoshop/layers.py`'s `ChannelImageData`, which keeps a
//! `(fd, offset, size)` handle and only decompresses on `.image` access; we
//! replace the hidden file-descriptor capture with an explicit `source`
//! slice passed to `decode`/`write`, per §9's "no hidden global cursor
//! state" rule.

use std::io::{Seek, Write};

use crate::codecs;
use crate::enums::{ColorDepth, Compression, Version};
use crate::error::PsdError;
use crate::io::cursor::PsdCursor;
use crate::io::writer::PsdWriter;
use crate::pixel_plane::PixelPlane;

/// Either an already-decoded plane, or a reference into the document's bytes
/// that `decode` will seek to and decompress on demand.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelImageData {
    Decoded(PixelPlane),
    LazyRef {
        compression: Compression,
        offset: u64,
        size: u64,
        rows: usize,
        cols: usize,
        depth: ColorDepth,
        version: Version,
    },
}

impl ChannelImageData {
    /// Reads the 2-byte compression code and records where the `size - 2`
    /// bytes of payload live, without touching them yet.
    pub fn read(
        cursor: &mut PsdCursor,
        rows: usize,
        cols: usize,
        depth: ColorDepth,
        version: Version,
        channel_length: u64,
    ) -> Result<ChannelImageData, PsdError> {
        let compression = Compression::from_u16(cursor.read_u16()?)
            .map_err(super::layer_record::LayerRecordError::Enum)?;
        let size = channel_length - 2;
        let offset = cursor.position();
        cursor.read(size as u32)?;
        Ok(ChannelImageData::LazyRef {
            compression,
            offset,
            size,
            rows,
            cols,
            depth,
            version,
        })
    }

    /// Materializes the plane, decompressing from `source` if this is still
    /// a lazy reference. `source` must be the same byte buffer the
    /// containing document was parsed from.
    pub fn decode(&self, source: &[u8]) -> Result<PixelPlane, PsdError> {
        match self {
            ChannelImageData::Decoded(plane) => Ok(plane.clone()),
            ChannelImageData::LazyRef {
                compression,
                offset,
                size,
                rows,
                cols,
                depth,
                version,
            } => {
                let start = *offset as usize;
                let end = start + *size as usize;
                let bytes = &source[start..end];
                Ok(codecs::decode(*compression, bytes, *rows, *cols, *depth, *version)?)
            }
        }
    }

    /// Writes the 2-byte compression code followed by the pixel payload.
    /// A lazy reference is copied verbatim from `source` without
    /// redecoding/recompressing; a decoded plane is compressed fresh.
    /// Returns the number of bytes written (including the compression
    /// code), the per-channel length `LayerRecord::write_channel_data`
    /// needs to backpatch.
    pub fn write<W: Write + Seek>(
        &self,
        writer: &mut PsdWriter<W>,
        source: &[u8],
        compression: Compression,
        version: Version,
    ) -> Result<u64, PsdError> {
        let start = writer.position()?;
        match self {
            ChannelImageData::Decoded(plane) => {
                writer.write_u16(compression.as_u16())?;
                codecs::encode(writer, plane, compression, version)?;
            }
            ChannelImageData::LazyRef {
                compression: stored_compression,
                offset,
                size,
                ..
            } => {
                writer.write_u16(stored_compression.as_u16())?;
                let start_byte = *offset as usize;
                let end_byte = start_byte + *size as usize;
                writer.write_bytes(&source[start_byte..end_byte])?;
            }
        }
        Ok(writer.position()? - start)
    }
}
