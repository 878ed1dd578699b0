//! The pixel-plane collaborator contract (§6): a 2-D unsigned-integer
//! rectangle, row-major, with an explicit byte order for serialisation.
//!
//! The teacher codebase this grew from never reaches for a numeric-array
//! crate either — it keeps decoded channel bytes as plain `Vec<u8>` — and the
//! depth set is closed to four values, so this is implemented in-tree as a
//! small owned-buffer type rather than as a dependency on an external matrix
//! crate (recorded as a design decision in DESIGN.md).

use crate::enums::ColorDepth;

/// A single decoded channel, height × width, one of four native-width sample
/// buffers depending on depth. `One` is kept unpacked — one byte per pixel,
/// value 0 or 1 — distinct from `Eight` even though both store `u8` samples,
/// because depth-1 packs/unpacks at the codec boundary (§4.2) and the two
/// must never be confused when dispatching RLE/raw encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelPlane {
    One { height: usize, width: usize, samples: Vec<u8> },
    Eight { height: usize, width: usize, samples: Vec<u8> },
    Sixteen { height: usize, width: usize, samples: Vec<u16> },
    ThirtyTwo { height: usize, width: usize, samples: Vec<u32> },
}

impl PixelPlane {
    pub fn depth(&self) -> ColorDepth {
        match self {
            PixelPlane::One { .. } => ColorDepth::One,
            PixelPlane::Eight { .. } => ColorDepth::Eight,
            PixelPlane::Sixteen { .. } => ColorDepth::Sixteen,
            PixelPlane::ThirtyTwo { .. } => ColorDepth::ThirtyTwo,
        }
    }

    pub fn height(&self) -> usize {
        match self {
            PixelPlane::One { height, .. } => *height,
            PixelPlane::Eight { height, .. } => *height,
            PixelPlane::Sixteen { height, .. } => *height,
            PixelPlane::ThirtyTwo { height, .. } => *height,
        }
    }

    pub fn width(&self) -> usize {
        match self {
            PixelPlane::One { width, .. } => *width,
            PixelPlane::Eight { width, .. } => *width,
            PixelPlane::Sixteen { width, .. } => *width,
            PixelPlane::ThirtyTwo { width, .. } => *width,
        }
    }

    pub fn item_size(&self) -> usize {
        self.depth().item_size()
    }

    pub fn len(&self) -> usize {
        self.height() * self.width()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds a uniform plane of the given constant value without a caller
    /// having to materialise one themselves — used by the constant-channel
    /// encode path and by its round-trip tests.
    pub fn constant(depth: ColorDepth, height: usize, width: usize, value: u32) -> PixelPlane {
        let len = height * width;
        match depth {
            ColorDepth::One => PixelPlane::One {
                height,
                width,
                samples: vec![(value != 0) as u8; len],
            },
            ColorDepth::Eight => PixelPlane::Eight {
                height,
                width,
                samples: vec![value as u8; len],
            },
            ColorDepth::Sixteen => PixelPlane::Sixteen {
                height,
                width,
                samples: vec![value as u16; len],
            },
            ColorDepth::ThirtyTwo => PixelPlane::ThirtyTwo {
                height,
                width,
                samples: vec![value; len],
            },
        }
    }

    /// Serialises to big-endian bytes in row-major order, the wire format
    /// every codec expects before (non-prediction) compression and emits
    /// after (prediction) decompression. For depth-1 this is the *unpacked*
    /// one-byte-per-pixel form; bit-packing happens in `codecs::raw`.
    pub fn to_bigendian_bytes(&self) -> Vec<u8> {
        match self {
            PixelPlane::One { samples, .. } => samples.clone(),
            PixelPlane::Eight { samples, .. } => samples.clone(),
            PixelPlane::Sixteen { samples, .. } => {
                let mut out = Vec::with_capacity(samples.len() * 2);
                for s in samples {
                    out.extend_from_slice(&s.to_be_bytes());
                }
                out
            }
            PixelPlane::ThirtyTwo { samples, .. } => {
                let mut out = Vec::with_capacity(samples.len() * 4);
                for s in samples {
                    out.extend_from_slice(&s.to_be_bytes());
                }
                out
            }
        }
    }

    /// The inverse of `to_bigendian_bytes`: reinterprets a row-major
    /// big-endian byte buffer as a plane of the given depth/shape. `bytes`
    /// must hold exactly `height * width * item_size` bytes (for depth-1,
    /// `item_size` is 1 — the unpacked form).
    pub fn from_bigendian_bytes(
        depth: ColorDepth,
        height: usize,
        width: usize,
        bytes: &[u8],
    ) -> PixelPlane {
        match depth {
            ColorDepth::One => PixelPlane::One {
                height,
                width,
                samples: bytes.to_vec(),
            },
            ColorDepth::Eight => PixelPlane::Eight {
                height,
                width,
                samples: bytes.to_vec(),
            },
            ColorDepth::Sixteen => PixelPlane::Sixteen {
                height,
                width,
                samples: bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect(),
            },
            ColorDepth::ThirtyTwo => PixelPlane::ThirtyTwo {
                height,
                width,
                samples: bytes
                    .chunks_exact(4)
                    .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            },
        }
    }

    /// Row `y` as a big-endian byte buffer (used by RLE/prediction, which
    /// operate per row).
    pub fn row_bigendian_bytes(&self, y: usize) -> Vec<u8> {
        let width = self.width();
        match self {
            PixelPlane::One { samples, .. } | PixelPlane::Eight { samples, .. } => {
                samples[y * width..(y + 1) * width].to_vec()
            }
            PixelPlane::Sixteen { samples, .. } => {
                let mut out = Vec::with_capacity(width * 2);
                for s in &samples[y * width..(y + 1) * width] {
                    out.extend_from_slice(&s.to_be_bytes());
                }
                out
            }
            PixelPlane::ThirtyTwo { samples, .. } => {
                let mut out = Vec::with_capacity(width * 4);
                for s in &samples[y * width..(y + 1) * width] {
                    out.extend_from_slice(&s.to_be_bytes());
                }
                out
            }
        }
    }

    /// Applies the horizontal delta used by the ZIP+prediction encoder, in
    /// place, row by row, with wrapping arithmetic (native width, per §4.2).
    /// Only valid for 8- and 16-bit depth; callers reject 1-/32-bit earlier.
    pub fn predict_encode_in_place(&mut self) {
        let width = self.width();
        match self {
            PixelPlane::Eight { samples, .. } => {
                for row in samples.chunks_mut(width) {
                    for x in (1..width).rev() {
                        row[x] = row[x].wrapping_sub(row[x - 1]);
                    }
                }
            }
            PixelPlane::Sixteen { samples, .. } => {
                for row in samples.chunks_mut(width) {
                    for x in (1..width).rev() {
                        row[x] = row[x].wrapping_sub(row[x - 1]);
                    }
                }
            }
            PixelPlane::One { .. } | PixelPlane::ThirtyTwo { .. } => {
                unreachable!("prediction is only valid for 8/16-bit")
            }
        }
    }

    /// Inverse of `predict_encode_in_place`.
    pub fn predict_decode_in_place(&mut self) {
        let width = self.width();
        match self {
            PixelPlane::Eight { samples, .. } => {
                for row in samples.chunks_mut(width) {
                    for x in 1..width {
                        row[x] = row[x].wrapping_add(row[x - 1]);
                    }
                }
            }
            PixelPlane::Sixteen { samples, .. } => {
                for row in samples.chunks_mut(width) {
                    for x in 1..width {
                        row[x] = row[x].wrapping_add(row[x - 1]);
                    }
                }
            }
            PixelPlane::One { .. } | PixelPlane::ThirtyTwo { .. } => {
                unreachable!("prediction is only valid for 8/16-bit")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bigendian_round_trip_sixteen_bit() {
        let plane = PixelPlane::Sixteen {
            height: 2,
            width: 2,
            samples: vec![1, 256, 65535, 0],
        };
        let bytes = plane.to_bigendian_bytes();
        let back = PixelPlane::from_bigendian_bytes(ColorDepth::Sixteen, 2, 2, &bytes);
        assert_eq!(plane, back);
    }

    #[test]
    fn prediction_round_trips() {
        let mut plane = PixelPlane::Eight {
            height: 1,
            width: 4,
            samples: vec![10, 12, 9, 250],
        };
        let original = plane.clone();
        plane.predict_encode_in_place();
        plane.predict_decode_in_place();
        assert_eq!(plane, original);
    }

    #[test]
    fn constant_plane_has_uniform_samples() {
        let plane = PixelPlane::constant(ColorDepth::Eight, 3, 3, 42);
        assert_eq!(plane.to_bigendian_bytes(), vec![42u8; 9]);
    }

    #[test]
    fn one_bit_depth_is_distinct_from_eight_bit() {
        let one = PixelPlane::constant(ColorDepth::One, 1, 1, 1);
        assert_eq!(one.depth(), ColorDepth::One);
    }
}
