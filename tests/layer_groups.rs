//! Nested group trees flattened to a `PsdFile` and projected back, through
//! the public `nested_layers` API only.

use anyhow::Result;
use psd_codec::enums::{BlendMode, ChannelId, ColorDepth, ColorMode, Compression, Version};
use psd_codec::nested_layers::{nested_layers_to_psd, psd_to_nested_layers, Group, Image, Layer};
use psd_codec::pixel_plane::PixelPlane;

fn leaf(name: &str, top: i32, left: i32, bottom: i32, right: i32) -> Image {
    let w = (right - left) as usize;
    let h = (bottom - top) as usize;
    Image {
        name: name.to_string(),
        blend_mode: BlendMode::NORMAL,
        visible: true,
        opacity: 255,
        group_id: None,
        top,
        left,
        bottom,
        right,
        channels: vec![
            (ChannelId(0), PixelPlane::constant(ColorDepth::Eight, h, w, 10)),
            (ChannelId(1), PixelPlane::constant(ColorDepth::Eight, h, w, 20)),
            (ChannelId(2), PixelPlane::constant(ColorDepth::Eight, h, w, 30)),
        ],
    }
}

/// outside group
///   inside group
///     First Layer
#[test]
fn one_group_inside_another_round_trips() -> Result<()> {
    let inside = Group {
        name: "group inside".to_string(),
        layers: vec![Layer::Image(leaf("First Layer", 0, 0, 1, 1))],
        ..Group::default()
    };
    let outside = Group {
        name: "group outside".to_string(),
        layers: vec![Layer::Group(inside)],
        ..Group::default()
    };
    let tree = vec![Layer::Group(outside)];

    let file = nested_layers_to_psd(
        &tree,
        ColorMode::Rgb,
        Version::One,
        Compression::Raw,
        None,
        None,
        false,
    )?;
    let bytes = file.to_bytes(Compression::Raw)?;
    let read_back = psd_codec::PsdFile::from_bytes(&bytes)?;
    let projected = psd_to_nested_layers(&read_back, &bytes)?;

    assert_eq!(projected.len(), 1);
    let Layer::Group(outside) = &projected[0] else {
        panic!("expected the root to be a group");
    };
    assert_eq!(outside.name, "group outside");
    assert_eq!(outside.layers.len(), 1);
    let Layer::Group(inside) = &outside.layers[0] else {
        panic!("expected a nested group");
    };
    assert_eq!(inside.name, "group inside");
    assert_eq!(inside.layers.len(), 1);
    assert_eq!(inside.layers[0].name(), "First Layer");
    Ok(())
}

#[test]
fn siblings_at_the_top_level_keep_their_order() -> Result<()> {
    let tree = vec![
        Layer::Image(leaf("First", 0, 0, 2, 2)),
        Layer::Image(leaf("Second", 0, 2, 2, 4)),
    ];

    let file = nested_layers_to_psd(
        &tree,
        ColorMode::Rgb,
        Version::One,
        Compression::Raw,
        None,
        None,
        false,
    )?;
    let bytes = file.to_bytes(Compression::Raw)?;
    let read_back = psd_codec::PsdFile::from_bytes(&bytes)?;
    let projected = psd_to_nested_layers(&read_back, &bytes)?;

    assert_eq!(projected.len(), 2);
    assert_eq!(projected[0].name(), "First");
    assert_eq!(projected[1].name(), "Second");
    Ok(())
}

#[test]
fn flattening_an_empty_tree_is_rejected() {
    let err = nested_layers_to_psd(
        &[],
        ColorMode::Rgb,
        Version::One,
        Compression::Raw,
        None,
        None,
        false,
    );
    assert!(err.is_err());
}
