//! A codec for reading and writing Adobe Photoshop PSD/PSB documents.
//!
//! You are encouraged to read the PSD specification before contributing to this codebase.
//! This will help you better understand the current approach and discover ways to improve it.
//!
//! psd spec: https://www.adobe.com/devnet-apps/photoshop/fileformatashtml/
//!
//! Logging: this crate calls `log::trace!`/`log::debug!` at section
//! boundaries, tagged-block dispatch, and codec selection. It depends only
//! on the `log` facade; wiring up a subscriber (`env_logger` or otherwise)
//! is left to the consumer.

#![deny(missing_docs)]

pub mod codecs;
pub mod enums;
pub mod error;
pub mod io;
pub mod nested_layers;
pub mod path;
pub mod pixel_plane;
pub mod sections;
pub mod tagged_block;

use std::io::{Seek, Write};

use log::{debug, trace};

pub use crate::enums::ColorMode;
use crate::enums::{ColorDepth, Compression, Version};
pub use crate::error::PsdError;
use crate::io::cursor::PsdCursor;
use crate::io::writer::PsdWriter;
use crate::sections::color_mode_data::ColorModeData;
use crate::sections::header::Header;
use crate::sections::image_data::ImageData;
use crate::sections::image_resources::ImageResources;
use crate::sections::layer_and_mask::LayerAndMaskInfo;

/// The full contents of a PSD/PSB document: a fixed header followed by four
/// sections read back to back, in order, with no gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct PsdFile {
    /// The fixed 26-byte document header.
    pub header: Header,
    /// Palette bytes for indexed/duotone documents; opaque otherwise.
    pub color_mode_data: ColorModeData,
    /// Flat list of `8BIM`-tagged resource blocks.
    pub image_resources: ImageResources,
    /// Every layer's records and pixel data, plus the global layer mask.
    pub layer_and_mask_info: LayerAndMaskInfo,
    /// The merged, flattened composite image.
    pub image_data: ImageData,
    /// The exact bytes this document was parsed from, kept around so any
    /// still-lazy `LazyRef` channel/composite data can be re-decoded on
    /// write. Empty for a document built in memory (e.g. by
    /// `nested_layers_to_psd`), which never produces lazy references.
    pub source: Vec<u8>,
}

impl PsdFile {
    /// Parses a PSD/PSB document from its on-disk bytes.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let psd_bytes = include_bytes!("./my-psd-file.psd");
    ///
    /// let psd = PsdFile::from_bytes(psd_bytes)?;
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Result<PsdFile, PsdError> {
        let mut cursor = PsdCursor::new(bytes);

        trace!("reading header at offset {}", cursor.position());
        let header = Header::read(&mut cursor)?;
        debug!(
            "header: version={:?} channels={} {}x{} depth={:?} color_mode={:?}",
            header.version,
            header.channel_count.0,
            header.width.0,
            header.height.0,
            header.depth,
            header.color_mode
        );

        trace!("reading color mode data at offset {}", cursor.position());
        let color_mode_data = ColorModeData::read(&mut cursor)?;

        trace!("reading image resources at offset {}", cursor.position());
        let image_resources = ImageResources::read(&mut cursor)?;

        trace!(
            "reading layer and mask info at offset {}",
            cursor.position()
        );
        let layer_and_mask_info = LayerAndMaskInfo::read(
            &mut cursor,
            header.version,
            header.depth,
            header.height.0,
            header.width.0,
        )?;
        debug!(
            "layer and mask info: {} layer record(s)",
            layer_and_mask_info.layer_info.layer_records.len()
        );

        trace!("reading image data at offset {}", cursor.position());
        let image_data = ImageData::read(
            &mut cursor,
            header.height.0 as usize,
            header.width.0 as usize,
            header.channel_count.0 as usize,
            header.depth,
            header.version,
        )?;

        Ok(PsdFile {
            header,
            color_mode_data,
            image_resources,
            layer_and_mask_info,
            image_data,
            source: bytes.to_vec(),
        })
    }

    /// Serialises this document back to PSD/PSB bytes, compressing freshly
    /// decoded pixel data with `compression` (a lazily-referenced section
    /// already on disk is copied verbatim regardless of this argument).
    pub fn to_bytes(&self, compression: Compression) -> Result<Vec<u8>, PsdError> {
        let mut buf = std::io::Cursor::new(Vec::new());
        self.write(&mut buf, compression)?;
        Ok(buf.into_inner())
    }

    /// Writes this document to any `Write + Seek` sink, in the same section
    /// order `from_bytes` expects to read.
    pub fn write<W: Write + Seek>(
        &self,
        sink: &mut W,
        compression: Compression,
    ) -> Result<(), PsdError> {
        let mut writer = PsdWriter::new(sink);
        let source: &[u8] = &self.source;

        trace!("writing header");
        self.header.write(&mut writer)?;

        trace!("writing color mode data");
        self.color_mode_data.write(&mut writer)?;

        trace!("writing image resources");
        self.image_resources.write(&mut writer)?;

        trace!(
            "writing layer and mask info ({} layer record(s))",
            self.layer_and_mask_info.layer_info.layer_records.len()
        );
        self.layer_and_mask_info.write(
            &mut writer,
            self.header.version,
            compression,
            source,
            self.header.height.0,
            self.header.width.0,
        )?;

        trace!("writing image data with compression {:?}", compression);
        self.image_data
            .write(&mut writer, source, compression, self.header.version)?;

        Ok(())
    }
}

// Methods for working with the file header.
impl PsdFile {
    /// The width of the PSD file.
    pub fn width(&self) -> u32 {
        self.header.width.0
    }

    /// The height of the PSD file.
    pub fn height(&self) -> u32 {
        self.header.height.0
    }

    /// The number of bits per channel.
    pub fn depth(&self) -> ColorDepth {
        self.header.depth
    }

    /// The color mode of the file.
    pub fn color_mode(&self) -> ColorMode {
        self.header.color_mode
    }

    /// The document's version: classic PSD or large-document PSB.
    pub fn version(&self) -> Version {
        self.header.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{ColorDepth, ColorMode as Mode, Version};
    use crate::sections::header::{ChannelCount, PsdDimension};

    fn sample_header() -> Header {
        Header {
            version: Version::One,
            channel_count: ChannelCount::new(3).unwrap(),
            height: PsdDimension::new(1, Version::One).unwrap(),
            width: PsdDimension::new(1, Version::One).unwrap(),
            depth: ColorDepth::Eight,
            color_mode: Mode::Rgb,
        }
    }

    fn sample_file() -> PsdFile {
        let planes = vec![
            crate::pixel_plane::PixelPlane::constant(ColorDepth::Eight, 1, 1, 10),
            crate::pixel_plane::PixelPlane::constant(ColorDepth::Eight, 1, 1, 20),
            crate::pixel_plane::PixelPlane::constant(ColorDepth::Eight, 1, 1, 30),
        ];
        PsdFile {
            header: sample_header(),
            color_mode_data: ColorModeData::default(),
            image_resources: ImageResources::default(),
            layer_and_mask_info: LayerAndMaskInfo::default(),
            image_data: ImageData::Decoded(planes),
            source: Vec::new(),
        }
    }

    #[test]
    fn round_trips_a_minimal_file_with_no_layers() {
        let file = sample_file();
        let original_planes = file.image_data.decode(&[]).unwrap();
        let bytes = file.to_bytes(Compression::Raw).unwrap();
        let read_back = PsdFile::from_bytes(&bytes).unwrap();

        assert_eq!(read_back.width(), 1);
        assert_eq!(read_back.height(), 1);
        assert_eq!(read_back.depth(), ColorDepth::Eight);
        assert_eq!(read_back.color_mode(), Mode::Rgb);
        assert_eq!(read_back.image_data.decode(&bytes).unwrap(), original_planes);
    }
}
