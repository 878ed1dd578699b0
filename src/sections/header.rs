//! The fixed 26-byte file header. Grounded on the teacher's
//! `sections::file_header_section` (newtype validators, per-field
//! `thiserror`-style error enum) and extended to PSB per
//! `pytoshop/core.py`'s `Header`.

use thiserror::Error;

use crate::enums::{ColorDepth, ColorMode, EnumError, Version};
use crate::error::PsdError;
use crate::io::cursor::PsdCursor;
use crate::io::writer::PsdWriter;
use std::io::{Seek, Write};

const SIGNATURE_V1: [u8; 4] = *b"8BPS";
const SIGNATURE_V2: [u8; 4] = *b"8BPB";
const EXPECTED_RESERVED: [u8; 6] = [0; 6];

/// | Length | Description |
/// |---|---|
/// | 4 | Signature: always "8BPS" (v1) or "8BPB" (v2) |
/// | 2 | Version: 1 or 2 |
/// | 6 | Reserved, must be zero |
/// | 2 | Number of channels, 1-56 |
/// | 4 | Height, 1 to 30000 (v1) or 300000 (v2) |
/// | 4 | Width, 1 to 30000 (v1) or 300000 (v2) |
/// | 2 | Depth: 1, 8, 16 or 32 |
/// | 2 | Color mode |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: Version,
    pub channel_count: ChannelCount,
    pub height: PsdDimension,
    pub width: PsdDimension,
    pub depth: ColorDepth,
    pub color_mode: ColorMode,
}

impl Header {
    pub fn new(
        version: Version,
        channel_count: u8,
        height: u32,
        width: u32,
        depth: u16,
        color_mode: u16,
    ) -> Result<Header, PsdError> {
        Ok(Header {
            version,
            channel_count: ChannelCount::new(channel_count)?,
            height: PsdDimension::new(height, version)?,
            width: PsdDimension::new(width, version)?,
            depth: ColorDepth::from_u16(depth).map_err(HeaderError::Depth)?,
            color_mode: ColorMode::from_u16(color_mode).map_err(HeaderError::ColorMode)?,
        })
    }

    pub fn read(cursor: &mut PsdCursor) -> Result<Header, PsdError> {
        let signature: [u8; 4] = cursor.read_4()?.try_into().unwrap();
        let version = Version::from_u16(cursor.read_u16()?).map_err(HeaderError::Version)?;
        match (signature, version) {
            (SIGNATURE_V1, Version::One) | (SIGNATURE_V2, Version::Two) => {}
            _ => {
                return Err(HeaderError::SignatureVersionMismatch {
                    signature,
                    version: version.as_u16(),
                }
                .into())
            }
        }

        let reserved: [u8; 6] = cursor.read_6()?.try_into().unwrap();
        if reserved != EXPECTED_RESERVED {
            return Err(HeaderError::ReservedNotZero { reserved }.into());
        }

        let channel_count = ChannelCount::new(cursor.read_u16()? as u8)?;
        let height = PsdDimension::new(cursor.read_u32()?, version)?;
        let width = PsdDimension::new(cursor.read_u32()?, version)?;
        let depth = ColorDepth::from_u16(cursor.read_u16()?).map_err(HeaderError::Depth)?;
        let color_mode = ColorMode::from_u16(cursor.read_u16()?).map_err(HeaderError::ColorMode)?;

        Ok(Header {
            version,
            channel_count,
            height,
            width,
            depth,
            color_mode,
        })
    }

    pub fn write<W: Write + Seek>(&self, writer: &mut PsdWriter<W>) -> Result<(), PsdError> {
        writer.write_bytes(&self.version.signature())?;
        writer.write_u16(self.version.as_u16())?;
        writer.write_bytes(&EXPECTED_RESERVED)?;
        writer.write_u16(self.channel_count.0 as u16)?;
        writer.write_u32(self.height.0)?;
        writer.write_u32(self.width.0)?;
        writer.write_u16(self.depth.bits())?;
        writer.write_u16(self.color_mode.as_u16())?;
        Ok(())
    }
}

/// Channel count, must be in `[1, 56]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelCount(pub u8);

impl ChannelCount {
    pub fn new(count: u8) -> Result<ChannelCount, HeaderError> {
        if (1..=56).contains(&count) {
            Ok(ChannelCount(count))
        } else {
            Err(HeaderError::ChannelCount { count })
        }
    }
}

/// Height or width, must be in `[1, version.max_dimension()]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsdDimension(pub u32);

impl PsdDimension {
    pub fn new(value: u32, version: Version) -> Result<PsdDimension, HeaderError> {
        let max = version.max_dimension();
        if (1..=max).contains(&value) {
            Ok(PsdDimension(value))
        } else {
            Err(HeaderError::DimensionOutOfRange {
                value,
                max,
                version: version.as_u16(),
            })
        }
    }
}

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error(transparent)]
    Version(EnumError),
    #[error(
        "signature {signature:?} does not match version {version} (expected 8BPS for v1, 8BPB for v2)"
    )]
    SignatureVersionMismatch { signature: [u8; 4], version: u16 },
    #[error("reserved header bytes must be zero, got {reserved:?}")]
    ReservedNotZero { reserved: [u8; 6] },
    #[error("{count} is an invalid channel count, must be between 1 and 56")]
    ChannelCount { count: u8 },
    #[error("{value} is out of range for version {version}, must be between 1 and {max}")]
    DimensionOutOfRange { value: u32, max: u32, version: u16 },
    #[error(transparent)]
    Depth(EnumError),
    #[error(transparent)]
    ColorMode(EnumError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bytes(signature: [u8; 4], version: u16) -> Vec<u8> {
        let mut bytes = vec![];
        bytes.extend_from_slice(&signature);
        bytes.extend_from_slice(&version.to_be_bytes());
        bytes.extend_from_slice(&EXPECTED_RESERVED);
        bytes.extend_from_slice(&3u16.to_be_bytes());
        bytes.extend_from_slice(&15u32.to_be_bytes());
        bytes.extend_from_slice(&15u32.to_be_bytes());
        bytes.extend_from_slice(&8u16.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes
    }

    #[test]
    fn parses_a_valid_v1_header() {
        let bytes = make_bytes(SIGNATURE_V1, 1);
        let mut cursor = PsdCursor::new(&bytes);
        let header = Header::read(&mut cursor).unwrap();
        assert_eq!(header.version, Version::One);
        assert_eq!(header.channel_count.0, 3);
        assert_eq!(header.height.0, 15);
        assert_eq!(header.width.0, 15);
        assert_eq!(header.depth, ColorDepth::Eight);
        assert_eq!(header.color_mode, ColorMode::Grayscale);
    }

    #[test]
    fn header_round_trips() {
        for (sig, version) in [(SIGNATURE_V1, 1u16), (SIGNATURE_V2, 2u16)] {
            let bytes = make_bytes(sig, version);
            let mut cursor = PsdCursor::new(&bytes);
            let header = Header::read(&mut cursor).unwrap();
            let mut buf = std::io::Cursor::new(Vec::new());
            {
                let mut w = PsdWriter::new(&mut buf);
                header.write(&mut w).unwrap();
            }
            assert_eq!(buf.into_inner(), bytes);
        }
    }

    #[test]
    fn rejects_bad_signature() {
        let bytes = make_bytes(*b"8BPX", 1);
        let mut cursor = PsdCursor::new(&bytes);
        assert!(matches!(
            Header::read(&mut cursor),
            Err(PsdError::Header(HeaderError::SignatureVersionMismatch { .. }))
        ));
    }

    #[test]
    fn rejects_signature_version_mismatch() {
        let bytes = make_bytes(SIGNATURE_V1, 2);
        let mut cursor = PsdCursor::new(&bytes);
        assert!(matches!(
            Header::read(&mut cursor),
            Err(PsdError::Header(HeaderError::SignatureVersionMismatch { .. }))
        ));
    }

    #[test]
    fn enforces_version_dependent_dimension_caps() {
        assert!(PsdDimension::new(30001, Version::One).is_err());
        assert!(PsdDimension::new(30001, Version::Two).is_ok());
        assert!(PsdDimension::new(300001, Version::Two).is_err());
    }
}
