//! Raw (uncompressed) pixel codec. Grounded on `pytoshop/codecs.py`
//! `decompress_raw`/`compress_raw`.

use crate::codecs::CodecError;
use crate::enums::ColorDepth;
use crate::io::pad;
use crate::io::writer::PsdWriter;
use crate::pixel_plane::PixelPlane;
use std::io::{Seek, Write};

pub fn decode(
    bytes: &[u8],
    rows: usize,
    cols: usize,
    depth: ColorDepth,
) -> Result<PixelPlane, CodecError> {
    if depth == ColorDepth::One {
        return Ok(PixelPlane::One {
            height: rows,
            width: cols,
            samples: unpack_bits(bytes, rows, cols),
        });
    }

    let item_size = depth.item_size();
    let needed = rows * cols * item_size;
    if bytes.len() < needed {
        return Err(CodecError::MisalignedLength {
            actual: bytes.len(),
            item_size,
            bits: depth.bits(),
        });
    }
    Ok(PixelPlane::from_bigendian_bytes(
        depth,
        rows,
        cols,
        &bytes[..needed],
    ))
}

pub fn encode<W: Write + Seek>(
    writer: &mut PsdWriter<W>,
    plane: &PixelPlane,
) -> Result<(), CodecError> {
    if plane.depth() == ColorDepth::One {
        let packed = pack_bits(plane);
        writer
            .write_bytes(&packed)
            .map_err(|e| CodecError::Deflate(e.to_string()))?;
        return Ok(());
    }
    writer
        .write_bytes(&plane.to_bigendian_bytes())
        .map_err(|e| CodecError::Deflate(e.to_string()))?;
    Ok(())
}

/// One row is `ceil(width / 8)` bytes, MSB-first.
fn unpack_bits(bytes: &[u8], rows: usize, cols: usize) -> Vec<u8> {
    let row_bytes = pad(cols, 8) / 8;
    let mut out = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        let row_start = row * row_bytes;
        for col in 0..cols {
            let byte = bytes.get(row_start + col / 8).copied().unwrap_or(0);
            let bit = (byte >> (7 - (col % 8))) & 1;
            out.push(bit);
        }
    }
    out
}

fn pack_bits(plane: &PixelPlane) -> Vec<u8> {
    let (height, width) = (plane.height(), plane.width());
    let row_bytes = pad(width, 8) / 8;
    let mut out = vec![0u8; height * row_bytes];
    if let PixelPlane::One { samples, .. } = plane {
        for row in 0..height {
            for col in 0..width {
                if samples[row * width + col] != 0 {
                    out[row * row_bytes + col / 8] |= 1 << (7 - (col % 8));
                }
            }
        }
    }
    out
}
