//! DEFLATE with horizontal prediction, valid only for 8- and 16-bit depth.
//! Grounded on `pytoshop/codecs.py` `decompress_zip_prediction`/
//! `compress_zip_prediction`; entirely `unimplemented!()` in the teacher
//! codebase this crate grew from.

use std::io::{Read, Seek, Write};

use flate2::read::ZlibDecoder;

use crate::codecs::zip::deflate;
use crate::codecs::CodecError;
use crate::enums::ColorDepth;
use crate::io::writer::PsdWriter;
use crate::pixel_plane::PixelPlane;

fn check_supported_depth(depth: ColorDepth) -> Result<(), CodecError> {
    match depth {
        ColorDepth::Eight | ColorDepth::Sixteen => Ok(()),
        ColorDepth::One | ColorDepth::ThirtyTwo => Err(CodecError::UnsupportedDepth {
            compression: crate::enums::Compression::ZipPrediction,
            bits: depth.bits(),
        }),
    }
}

pub fn decode(
    bytes: &[u8],
    rows: usize,
    cols: usize,
    depth: ColorDepth,
) -> Result<PixelPlane, CodecError> {
    check_supported_depth(depth)?;

    let mut decoder = ZlibDecoder::new(bytes);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| CodecError::Deflate(e.to_string()))?;

    let mut plane = crate::codecs::raw::decode(&raw, rows, cols, depth)?;
    plane.predict_decode_in_place();
    Ok(plane)
}

pub fn encode<W: Write + Seek>(
    writer: &mut PsdWriter<W>,
    plane: &PixelPlane,
) -> Result<(), CodecError> {
    check_supported_depth(plane.depth())?;

    let mut predicted = plane.clone();
    predicted.predict_encode_in_place();
    let raw = predicted.to_bigendian_bytes();
    let deflated = deflate(&raw)?;
    writer
        .write_bytes(&deflated)
        .map_err(|e| CodecError::Deflate(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_sixteen_bit() {
        let plane = PixelPlane::Sixteen {
            height: 2,
            width: 3,
            samples: vec![1, 2, 3, 100, 90, 80],
        };
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            encode(&mut w, &plane).unwrap();
        }
        let bytes = buf.into_inner();
        let decoded = decode(&bytes, 2, 3, ColorDepth::Sixteen).unwrap();
        assert_eq!(decoded, plane);
    }

    #[test]
    fn rejects_one_bit_and_thirty_two_bit() {
        assert!(matches!(
            check_supported_depth(ColorDepth::One),
            Err(CodecError::UnsupportedDepth { .. })
        ));
        assert!(matches!(
            check_supported_depth(ColorDepth::ThirtyTwo),
            Err(CodecError::UnsupportedDepth { .. })
        ));
    }
}
