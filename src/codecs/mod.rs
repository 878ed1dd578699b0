//! Per-channel pixel-data codecs: raw, PackBits RLE, DEFLATE, and
//! DEFLATE-with-horizontal-prediction, plus the constant-channel virtual
//! encode fast path.
//!
//! Grounded on `pytoshop/codecs.py`'s `decompress_image`/`compress_image`
//! dispatch; `flate2` supplies DEFLATE (entirely `unimplemented!()` in the
//! teacher codebase this grew from).

pub mod constant;
pub mod packbits;
pub mod raw;
pub mod zip;
pub mod zip_prediction;

use log::trace;
use thiserror::Error;

use crate::enums::{ColorDepth, Compression, Version};
use crate::io::writer::PsdWriter;
use crate::pixel_plane::PixelPlane;
use std::io::{Seek, Write};

/// A codec failure: anything that makes it impossible to trust the decoded
/// plane or the bytes a caller asked us to write.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("compression {compression:?} does not support {bits}-bit depth")]
    UnsupportedDepth { compression: Compression, bits: u16 },
    #[error("RLE write is unsupported for 1-bit depth")]
    RleOneBitWriteUnsupported,
    #[error(
        "pixel data length {actual} is not a multiple of the item size {item_size} for depth {bits}-bit"
    )]
    MisalignedLength {
        actual: usize,
        item_size: usize,
        bits: u16,
    },
    #[error("zlib stream is corrupt or truncated: {0}")]
    Deflate(String),
    #[error("expected a plane of shape ({expected_rows}, {expected_cols}), got ({actual_rows}, {actual_cols})")]
    ShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },
}

/// Decodes `bytes` (the payload that follows a channel's/the composite
/// image's compression code) into a `rows` × `cols` pixel plane.
pub fn decode(
    compression: Compression,
    bytes: &[u8],
    rows: usize,
    cols: usize,
    depth: ColorDepth,
    version: Version,
) -> Result<PixelPlane, CodecError> {
    trace!(
        "decoding {} bytes with {:?} into a {}x{} {:?} plane",
        bytes.len(),
        compression,
        rows,
        cols,
        depth
    );
    match compression {
        Compression::Raw => raw::decode(bytes, rows, cols, depth),
        Compression::Rle => packbits::decode(bytes, rows, cols, depth, version),
        Compression::Zip => zip::decode(bytes, rows, cols, depth),
        Compression::ZipPrediction => zip_prediction::decode(bytes, rows, cols, depth),
    }
}

/// Encodes a materialised plane under the given compression.
pub fn encode<W: Write + Seek>(
    writer: &mut PsdWriter<W>,
    plane: &PixelPlane,
    compression: Compression,
    version: Version,
) -> Result<(), CodecError> {
    trace!(
        "encoding a {}x{} {:?} plane with {:?}",
        plane.height(),
        plane.width(),
        plane.depth(),
        compression
    );
    match compression {
        Compression::Raw => raw::encode(writer, plane),
        Compression::Rle => packbits::encode(writer, plane, version),
        Compression::Zip => zip::encode(writer, plane),
        Compression::ZipPrediction => zip_prediction::encode(writer, plane),
    }
}

/// The constant-channel virtual encode: synthesises `rows` identical rows of
/// `value` without ever materialising a `rows × cols` plane.
pub fn encode_constant<W: Write + Seek>(
    writer: &mut PsdWriter<W>,
    compression: Compression,
    depth: ColorDepth,
    rows: usize,
    cols: usize,
    value: u32,
    version: Version,
) -> Result<(), CodecError> {
    constant::encode_constant(writer, compression, depth, rows, cols, value, version)
}
