//! DEFLATE (zlib) pixel codec. Grounded on `pytoshop/codecs.py`
//! `decompress_zip`/`compress_zip`; entirely `unimplemented!()` in the
//! teacher codebase this crate grew from. `flate2` supplies the zlib stream,
//! matching the wire format Photoshop itself emits.

use std::io::{Read, Seek, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression as Flate2Compression;

use crate::codecs::CodecError;
use crate::enums::ColorDepth;
use crate::io::writer::PsdWriter;
use crate::pixel_plane::PixelPlane;

pub fn decode(
    bytes: &[u8],
    rows: usize,
    cols: usize,
    depth: ColorDepth,
) -> Result<PixelPlane, CodecError> {
    let mut decoder = ZlibDecoder::new(bytes);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| CodecError::Deflate(e.to_string()))?;
    crate::codecs::raw::decode(&raw, rows, cols, depth)
}

pub fn encode<W: Write + Seek>(
    writer: &mut PsdWriter<W>,
    plane: &PixelPlane,
) -> Result<(), CodecError> {
    let deflated = deflate(&plane_to_raw(plane))?;
    writer
        .write_bytes(&deflated)
        .map_err(|e| CodecError::Deflate(e.to_string()))?;
    Ok(())
}

/// Shared with `zip_prediction`: big-endian row bytes, bit-packed for 1-bit.
pub(crate) fn plane_to_raw(plane: &PixelPlane) -> Vec<u8> {
    if plane.depth() == ColorDepth::One {
        let mut buf = std::io::Cursor::new(Vec::new());
        let mut w = PsdWriter::new(&mut buf);
        crate::codecs::raw::encode(&mut w, plane).expect("in-memory write cannot fail");
        buf.into_inner()
    } else {
        plane.to_bigendian_bytes()
    }
}

pub(crate) fn deflate(raw: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Flate2Compression::default());
    encoder
        .write_all(raw)
        .map_err(|e| CodecError::Deflate(e.to_string()))?;
    encoder.finish().map_err(|e| CodecError::Deflate(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_eight_bit() {
        let plane = PixelPlane::Eight {
            height: 2,
            width: 2,
            samples: vec![10, 20, 30, 40],
        };
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            encode(&mut w, &plane).unwrap();
        }
        let bytes = buf.into_inner();
        let decoded = decode(&bytes, 2, 2, ColorDepth::Eight).unwrap();
        assert_eq!(decoded, plane);
    }
}
