//! End-to-end document round trips across compressions and color modes,
//! exercising the crate purely through its public API (no binary fixtures —
//! every document here is built in memory).

use anyhow::Result;
use psd_codec::enums::{BlendMode, ChannelId, ColorDepth, ColorMode, Compression, Version};
use psd_codec::nested_layers::{nested_layers_to_psd, Image, Layer};
use psd_codec::pixel_plane::PixelPlane;
use psd_codec::sections::color_mode_data::ColorModeData;
use psd_codec::sections::header::{ChannelCount, Header, PsdDimension};
use psd_codec::sections::image_data::ImageData;
use psd_codec::sections::image_resources::ImageResources;
use psd_codec::sections::layer_and_mask::LayerAndMaskInfo;
use psd_codec::PsdFile;

fn rgb_file(width: u32, height: u32) -> PsdFile {
    let header = Header {
        version: Version::One,
        channel_count: ChannelCount::new(3).unwrap(),
        height: PsdDimension::new(height, Version::One).unwrap(),
        width: PsdDimension::new(width, Version::One).unwrap(),
        depth: ColorDepth::Eight,
        color_mode: ColorMode::Rgb,
    };
    let planes = vec![
        PixelPlane::constant(ColorDepth::Eight, height as usize, width as usize, 255),
        PixelPlane::constant(ColorDepth::Eight, height as usize, width as usize, 0),
        PixelPlane::constant(ColorDepth::Eight, height as usize, width as usize, 0),
    ];
    PsdFile {
        header,
        color_mode_data: ColorModeData::default(),
        image_resources: ImageResources::default(),
        layer_and_mask_info: LayerAndMaskInfo::default(),
        image_data: ImageData::Decoded(planes),
        source: Vec::new(),
    }
}

#[test]
fn round_trips_across_every_compression() -> Result<()> {
    for compression in [
        Compression::Raw,
        Compression::Rle,
        Compression::Zip,
        Compression::ZipPrediction,
    ] {
        let file = rgb_file(4, 3);
        let bytes = file.to_bytes(compression)?;
        let read_back = PsdFile::from_bytes(&bytes)?;

        assert_eq!(read_back.width(), 4);
        assert_eq!(read_back.height(), 3);
        assert_eq!(read_back.color_mode(), ColorMode::Rgb);
        assert_eq!(
            read_back.image_data.decode(&bytes)?,
            file.image_data.decode(&[])?,
            "compression {:?} lost composite pixel data",
            compression
        );
    }
    Ok(())
}

#[test]
fn psb_documents_accept_dimensions_larger_than_psd_limit() -> Result<()> {
    let header = Header::new(Version::Two, 3, 40_000, 1, 8, ColorMode::Rgb.as_u16())?;
    let planes = vec![
        PixelPlane::constant(ColorDepth::Eight, 40_000, 1, 10),
        PixelPlane::constant(ColorDepth::Eight, 40_000, 1, 20),
        PixelPlane::constant(ColorDepth::Eight, 40_000, 1, 30),
    ];
    let file = PsdFile {
        header,
        color_mode_data: ColorModeData::default(),
        image_resources: ImageResources::default(),
        layer_and_mask_info: LayerAndMaskInfo::default(),
        image_data: ImageData::Decoded(planes),
        source: Vec::new(),
    };

    let bytes = file.to_bytes(Compression::Raw)?;
    let read_back = PsdFile::from_bytes(&bytes)?;
    assert_eq!(read_back.height(), 40_000);
    assert_eq!(read_back.version(), Version::Two);
    Ok(())
}

#[test]
fn rejects_a_psd_v1_height_over_the_version_limit() {
    let err = Header::new(Version::One, 3, 30_001, 1, 8, ColorMode::Rgb.as_u16());
    assert!(err.is_err());
}

/// Reproduces the "read a file, write it back unmodified" path: after
/// `from_bytes`, every layer channel and the composite image are still
/// `LazyRef`s pointing into the parsed bytes, so writing again must carry
/// those source bytes through rather than re-encode from nothing.
#[test]
fn a_freshly_parsed_file_with_layers_writes_back_unmodified() -> Result<()> {
    let image = Image {
        name: "Layer".to_string(),
        blend_mode: BlendMode::NORMAL,
        visible: true,
        opacity: 255,
        group_id: None,
        top: 0,
        left: 0,
        bottom: 2,
        right: 2,
        channels: vec![
            (ChannelId(0), PixelPlane::constant(ColorDepth::Eight, 2, 2, 11)),
            (ChannelId(1), PixelPlane::constant(ColorDepth::Eight, 2, 2, 22)),
            (ChannelId(2), PixelPlane::constant(ColorDepth::Eight, 2, 2, 33)),
        ],
    };
    let built = nested_layers_to_psd(
        &[Layer::Image(image)],
        ColorMode::Rgb,
        Version::One,
        Compression::Rle,
        None,
        None,
        false,
    )?;
    let first_bytes = built.to_bytes(Compression::Rle)?;

    let parsed = PsdFile::from_bytes(&first_bytes)?;
    let channels_before = parsed.layer_and_mask_info.layer_info.layer_records[0]
        .channels
        .iter()
        .map(|(id, data)| Ok((*id, data.decode(&first_bytes)?)))
        .collect::<Result<Vec<_>>>()?;
    let composite_before = parsed.image_data.decode(&first_bytes)?;

    let second_bytes = parsed.to_bytes(Compression::Rle)?;
    let reparsed = PsdFile::from_bytes(&second_bytes)?;
    let channels_after = reparsed.layer_and_mask_info.layer_info.layer_records[0]
        .channels
        .iter()
        .map(|(id, data)| Ok((*id, data.decode(&second_bytes)?)))
        .collect::<Result<Vec<_>>>()?;
    let composite_after = reparsed.image_data.decode(&second_bytes)?;

    assert_eq!(channels_before, channels_after);
    assert_eq!(composite_before, composite_after);
    Ok(())
}
