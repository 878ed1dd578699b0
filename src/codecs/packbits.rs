//! PackBits RLE pixel codec, row-indexed by a per-row length table.
//!
//! The low-level PackBits algorithm is grounded on the teacher's
//! `compression::RLECompressed` iterator (decode only); the row-table framing
//! and the encode side are grounded on `pytoshop/codecs.py`
//! `decompress_rle`/`compress_rle`.

use crate::codecs::CodecError;
use crate::enums::{ColorDepth, Version};
use crate::io::writer::PsdWriter;
use crate::pixel_plane::PixelPlane;
use std::io::{Seek, Write};

pub fn decode(
    bytes: &[u8],
    rows: usize,
    cols: usize,
    depth: ColorDepth,
    version: Version,
) -> Result<PixelPlane, CodecError> {
    let row_length_width = if version.is_large() { 4 } else { 2 };
    let table_bytes = rows * row_length_width;
    if bytes.len() < table_bytes {
        return Err(CodecError::MisalignedLength {
            actual: bytes.len(),
            item_size: row_length_width,
            bits: depth.bits(),
        });
    }

    let mut row_lengths = Vec::with_capacity(rows);
    let mut pos = 0;
    for _ in 0..rows {
        let len = if version.is_large() {
            u32::from_be_bytes([
                bytes[pos],
                bytes[pos + 1],
                bytes[pos + 2],
                bytes[pos + 3],
            ]) as usize
        } else {
            u16::from_be_bytes([bytes[pos], bytes[pos + 1]]) as usize
        };
        row_lengths.push(len);
        pos += row_length_width;
    }

    let mut raw = Vec::new();
    for len in row_lengths {
        let chunk = &bytes[pos..pos + len];
        raw.extend_from_slice(&packbits_decode(chunk));
        pos += len;
    }

    crate::codecs::raw::decode(&raw, rows, cols, depth)
}

pub fn encode<W: Write + Seek>(
    writer: &mut PsdWriter<W>,
    plane: &PixelPlane,
    version: Version,
) -> Result<(), CodecError> {
    if plane.depth() == ColorDepth::One {
        return Err(CodecError::RleOneBitWriteUnsupported);
    }

    let rows = plane.height();
    let encoded_rows: Vec<Vec<u8>> = (0..rows)
        .map(|y| packbits_encode(&plane.row_bigendian_bytes(y)))
        .collect();

    for row in &encoded_rows {
        writer
            .write_length(version.is_large(), row.len() as u64)
            .map_err(|e| CodecError::Deflate(e.to_string()))?;
    }
    for row in &encoded_rows {
        writer
            .write_bytes(row)
            .map_err(|e| CodecError::Deflate(e.to_string()))?;
    }
    Ok(())
}

/// Encodes a single row (used both by the normal path above and by the
/// constant-channel virtual encode, which only ever needs one row's worth of
/// PackBits output).
pub fn encode_row(row_bigendian_bytes: &[u8]) -> Vec<u8> {
    packbits_encode(row_bigendian_bytes)
}

fn packbits_decode(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let header = bytes[i] as i8;
        i += 1;
        if header == -128 {
            continue;
        } else if header >= 0 {
            let count = header as usize + 1;
            out.extend_from_slice(&bytes[i..i + count]);
            i += count;
        } else {
            let count = (1 - header as i16) as usize;
            let byte = bytes[i];
            i += 1;
            out.extend(std::iter::repeat(byte).take(count));
        }
    }
    out
}

fn packbits_encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let n = data.len();
    let mut i = 0;
    while i < n {
        let run_len = run_length_at(data, i);
        if run_len >= 2 {
            out.push((1i16 - run_len as i16) as i8 as u8);
            out.push(data[i]);
            i += run_len;
        } else {
            let lit_start = i;
            let mut lit_len = 0;
            while i < n && lit_len < 128 {
                if run_length_at(data, i) >= 2 {
                    break;
                }
                i += 1;
                lit_len += 1;
            }
            out.push((lit_len - 1) as u8);
            out.extend_from_slice(&data[lit_start..lit_start + lit_len]);
        }
    }
    out
}

fn run_length_at(data: &[u8], start: usize) -> usize {
    let mut run_len = 1;
    while start + run_len < data.len() && data[start + run_len] == data[start] && run_len < 128 {
        run_len += 1;
    }
    run_len
}
