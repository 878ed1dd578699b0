//! The constant-channel virtual encode (§4.2, §9): synthesise `rows`
//! identical rows of a scalar value without ever materialising the full
//! `rows × cols` plane. Grounded on `pytoshop/codecs.py`
//! `_make_constant_row`/`compress_constant_raw`/`rle`/`zip`/`zip_prediction`.

use std::io::{Seek, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression as Flate2Compression;

use crate::codecs::packbits;
use crate::codecs::zip::plane_to_raw;
use crate::codecs::CodecError;
use crate::enums::{ColorDepth, Compression, Version};
use crate::io::writer::PsdWriter;
use crate::pixel_plane::PixelPlane;

pub fn encode_constant<W: Write + Seek>(
    writer: &mut PsdWriter<W>,
    compression: Compression,
    depth: ColorDepth,
    rows: usize,
    cols: usize,
    value: u32,
    version: Version,
) -> Result<(), CodecError> {
    // A single constant row is all the per-format encoders below ever need;
    // the full plane is never built.
    let one_row = PixelPlane::constant(depth, 1, cols, value);

    match compression {
        Compression::Raw => {
            let row_bytes = plane_to_raw(&one_row);
            for _ in 0..rows {
                writer
                    .write_bytes(&row_bytes)
                    .map_err(|e| CodecError::Deflate(e.to_string()))?;
            }
            Ok(())
        }
        Compression::Rle => {
            if depth == ColorDepth::One {
                return Err(CodecError::RleOneBitWriteUnsupported);
            }
            let encoded_row = packbits::encode_row(&one_row.row_bigendian_bytes(0));
            for _ in 0..rows {
                writer
                    .write_length(version.is_large(), encoded_row.len() as u64)
                    .map_err(|e| CodecError::Deflate(e.to_string()))?;
            }
            for _ in 0..rows {
                writer
                    .write_bytes(&encoded_row)
                    .map_err(|e| CodecError::Deflate(e.to_string()))?;
            }
            Ok(())
        }
        Compression::Zip => {
            let row_bytes = plane_to_raw(&one_row);
            let mut encoder = ZlibEncoder::new(Vec::new(), Flate2Compression::default());
            for _ in 0..rows {
                encoder
                    .write_all(&row_bytes)
                    .map_err(|e| CodecError::Deflate(e.to_string()))?;
            }
            let deflated = encoder.finish().map_err(|e| CodecError::Deflate(e.to_string()))?;
            writer
                .write_bytes(&deflated)
                .map_err(|e| CodecError::Deflate(e.to_string()))
        }
        Compression::ZipPrediction => {
            if !matches!(depth, ColorDepth::Eight | ColorDepth::Sixteen) {
                return Err(CodecError::UnsupportedDepth {
                    compression,
                    bits: depth.bits(),
                });
            }
            let mut predicted_row = one_row;
            predicted_row.predict_encode_in_place();
            let row_bytes = predicted_row.row_bigendian_bytes(0);
            let mut encoder = ZlibEncoder::new(Vec::new(), Flate2Compression::default());
            for _ in 0..rows {
                encoder
                    .write_all(&row_bytes)
                    .map_err(|e| CodecError::Deflate(e.to_string()))?;
            }
            let deflated = encoder.finish().map_err(|e| CodecError::Deflate(e.to_string()))?;
            writer
                .write_bytes(&deflated)
                .map_err(|e| CodecError::Deflate(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::decode;

    #[test]
    fn constant_channel_decodes_to_uniform_plane() {
        for compression in [
            Compression::Raw,
            Compression::Rle,
            Compression::Zip,
            Compression::ZipPrediction,
        ] {
            let mut buf = std::io::Cursor::new(Vec::new());
            {
                let mut w = PsdWriter::new(&mut buf);
                encode_constant(&mut w, compression, ColorDepth::Eight, 4, 5, 7, Version::One)
                    .unwrap();
            }
            let bytes = buf.into_inner();
            let decoded = decode(compression, &bytes, 4, 5, ColorDepth::Eight, Version::One)
                .unwrap();
            assert_eq!(decoded, PixelPlane::constant(ColorDepth::Eight, 4, 5, 7));
        }
    }
}
