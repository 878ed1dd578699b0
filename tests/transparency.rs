//! Transparency-channel handling when flattening a nested-layer tree: a
//! missing alpha channel gets synthesised as fully opaque (or a rectangular
//! vector mask, if requested), and a fully-transparent image layer is
//! dropped entirely.

use anyhow::Result;
use psd_codec::enums::{BlendMode, ChannelId, ColorDepth, ColorMode, Compression, Version};
use psd_codec::nested_layers::{nested_layers_to_psd, Image, Layer};
use psd_codec::pixel_plane::PixelPlane;

fn image_without_alpha(name: &str) -> Image {
    Image {
        name: name.to_string(),
        blend_mode: BlendMode::NORMAL,
        visible: true,
        opacity: 255,
        group_id: None,
        top: 0,
        left: 0,
        bottom: 2,
        right: 2,
        channels: vec![
            (ChannelId(0), PixelPlane::constant(ColorDepth::Eight, 2, 2, 10)),
            (ChannelId(1), PixelPlane::constant(ColorDepth::Eight, 2, 2, 20)),
            (ChannelId(2), PixelPlane::constant(ColorDepth::Eight, 2, 2, 30)),
        ],
    }
}

#[test]
fn images_with_no_alpha_channel_get_a_synthesised_opaque_one() -> Result<()> {
    let tree = vec![Layer::Image(image_without_alpha("Opaque"))];
    let file = nested_layers_to_psd(
        &tree,
        ColorMode::Rgb,
        Version::One,
        Compression::Raw,
        None,
        None,
        false,
    )?;

    let record = &file.layer_and_mask_info.layer_info.layer_records[0];
    let has_alpha = record
        .channels
        .iter()
        .any(|(id, _)| *id == ChannelId::TRANSPARENCY);
    assert!(has_alpha);
    Ok(())
}

#[test]
fn images_with_no_alpha_channel_get_a_vector_mask_when_requested() -> Result<()> {
    let tree = vec![Layer::Image(image_without_alpha("Masked"))];
    let file = nested_layers_to_psd(
        &tree,
        ColorMode::Rgb,
        Version::One,
        Compression::Raw,
        None,
        None,
        true,
    )?;

    let record = &file.layer_and_mask_info.layer_info.layer_records[0];
    let has_vector_mask = record
        .blocks
        .iter()
        .any(|b| matches!(b, psd_codec::tagged_block::TaggedBlock::VectorMask { .. }));
    assert!(has_vector_mask);
    let has_synthesised_alpha = record
        .channels
        .iter()
        .any(|(id, _)| *id == ChannelId::TRANSPARENCY);
    assert!(!has_synthesised_alpha);
    Ok(())
}

#[test]
fn an_entirely_transparent_image_layer_is_dropped() -> Result<()> {
    let mut transparent = image_without_alpha("Invisible");
    transparent.channels.push((
        ChannelId::TRANSPARENCY,
        PixelPlane::constant(ColorDepth::Eight, 2, 2, 0),
    ));
    let visible = image_without_alpha("Visible");

    let tree = vec![Layer::Image(transparent), Layer::Image(visible)];
    let file = nested_layers_to_psd(
        &tree,
        ColorMode::Rgb,
        Version::One,
        Compression::Raw,
        None,
        None,
        false,
    )?;

    let names: Vec<&str> = file
        .layer_and_mask_info
        .layer_info
        .layer_records
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(names, vec!["Visible"]);
    Ok(())
}
