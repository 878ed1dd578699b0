//! Projects the flat `LayerRecord` list into the `Group`/`Image` tree a user
//! actually thinks in terms of, and back. Grounded on
//! `pytoshop/user/nested_layers.py`'s `psd_to_nested_layers`/
//! `nested_layers_to_psd`.
//!
//! The flat file encodes a group tree via `lsct`/`lsdk` section-divider
//! tagged blocks inserted as sentinel layer records: an open/closed sentinel
//! before a group's children, a bounding sentinel after. Reading walks the
//! on-disk list in reverse to recover that pre-order; writing flattens in
//! pre-order then reverses before handing the result to `LayerInfo`.

use thiserror::Error;

use crate::enums::{
    BlendMode, ChannelId, ColorDepth, ColorMode, Compression, SectionDividerSetting, Version,
};
use crate::error::PsdError;
use crate::pixel_plane::PixelPlane;
use crate::sections::blending_range::BlendingRanges;
use crate::sections::color_mode_data::ColorModeData;
use crate::sections::header::Header;
use crate::sections::image_data::ImageData;
use crate::sections::image_resources::{
    ImageResource, ImageResourceBlock, ImageResources, ID_LAYERS_GROUP_INFO,
};
use crate::sections::layer_and_mask::{ChannelImageData, LayerAndMaskInfo, LayerInfo, LayerRecord};
use crate::tagged_block::{SectionDivider, TaggedBlock};
use crate::path::PathResource;
use crate::PsdFile;

/// A node of the nested-layer tree: either a folder of other layers or a
/// single image's pixel data.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Group(Group),
    Image(Image),
}

impl Layer {
    pub fn name(&self) -> &str {
        match self {
            Layer::Group(g) => &g.name,
            Layer::Image(i) => &i.name,
        }
    }

    pub fn blend_mode(&self) -> BlendMode {
        match self {
            Layer::Group(g) => g.blend_mode,
            Layer::Image(i) => i.blend_mode,
        }
    }

    pub fn visible(&self) -> bool {
        match self {
            Layer::Group(g) => g.visible,
            Layer::Image(i) => i.visible,
        }
    }

    pub fn opacity(&self) -> u8 {
        match self {
            Layer::Group(g) => g.opacity,
            Layer::Image(i) => i.opacity,
        }
    }

    pub fn group_id(&self) -> Option<u16> {
        match self {
            Layer::Group(g) => g.group_id,
            Layer::Image(i) => i.group_id,
        }
    }
}

/// A folder of other layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    pub blend_mode: BlendMode,
    pub visible: bool,
    pub opacity: u8,
    pub group_id: Option<u16>,
    pub closed: bool,
    pub layers: Vec<Layer>,
}

impl Default for Group {
    fn default() -> Group {
        Group {
            name: String::new(),
            blend_mode: BlendMode::PASS_THROUGH,
            visible: true,
            opacity: 255,
            group_id: None,
            closed: true,
            layers: Vec::new(),
        }
    }
}

/// A leaf layer: a rectangle of pixel data, one plane per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub name: String,
    pub blend_mode: BlendMode,
    pub visible: bool,
    pub opacity: u8,
    pub group_id: Option<u16>,
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
    pub channels: Vec<(ChannelId, PixelPlane)>,
}

/// Walks `psd`'s flat layer list into the `Group`/`Image` tree it describes.
/// `source` must be the same bytes `psd` was parsed from, so that any
/// still-lazy channel data can be decoded.
pub fn psd_to_nested_layers(psd: &PsdFile, source: &[u8]) -> Result<Vec<Layer>, PsdError> {
    let records = &psd.layer_and_mask_info.layer_info.layer_records;
    let group_ids = layers_group_info(&psd.image_resources, records.len());

    struct Frame {
        group: Group,
    }

    let mut stack: Vec<Frame> = vec![Frame {
        group: Group::default(),
    }];

    for (idx, record) in records.iter().enumerate().rev() {
        let group_id = group_ids.get(idx).copied().filter(|&id| id != 0);
        let name = unicode_name(record).unwrap_or_else(|| record.name.clone());

        match section_divider(record) {
            Some(setting @ (SectionDividerSetting::Open | SectionDividerSetting::Closed)) => {
                stack.push(Frame {
                    group: Group {
                        name,
                        blend_mode: record.blend_mode,
                        visible: record.visible,
                        opacity: record.opacity,
                        group_id,
                        closed: setting == SectionDividerSetting::Closed,
                        layers: Vec::new(),
                    },
                });
            }
            Some(SectionDividerSetting::Bounding) => {
                if stack.len() > 1 {
                    let finished = stack.pop().unwrap().group;
                    stack
                        .last_mut()
                        .unwrap()
                        .group
                        .layers
                        .push(Layer::Group(finished));
                } else {
                    // Legacy recovery: a bounding sentinel with no matching
                    // open sentinel still in scope. Treat everything
                    // accumulated at the root so far as the body of a
                    // synthesised group, named after its first child.
                    let root = &mut stack.last_mut().unwrap().group;
                    let mut wrapped = Group {
                        closed: false,
                        ..Group::default()
                    };
                    if let Some(first) = root.layers.first() {
                        wrapped.name = first.name().to_string();
                        wrapped.blend_mode = first.blend_mode();
                        wrapped.opacity = first.opacity();
                    }
                    wrapped.layers = std::mem::take(&mut root.layers);
                    root.layers.push(Layer::Group(wrapped));
                }
            }
            Some(SectionDividerSetting::AnyOther) | None => {
                let channels = record
                    .channels
                    .iter()
                    .map(|(id, data)| Ok((*id, data.decode(source)?)))
                    .collect::<Result<Vec<_>, PsdError>>()?;
                let image = Image {
                    name,
                    blend_mode: record.blend_mode,
                    visible: record.visible,
                    opacity: record.opacity,
                    group_id,
                    top: record.top,
                    left: record.left,
                    bottom: record.bottom,
                    right: record.right,
                    channels,
                };
                stack.last_mut().unwrap().group.layers.push(Layer::Image(image));
            }
        }
    }

    Ok(stack.pop().unwrap().group.layers)
}

fn unicode_name(record: &LayerRecord) -> Option<String> {
    record.blocks.iter().find_map(|b| match b {
        TaggedBlock::UnicodeLayerName(name) => Some(name.clone()),
        _ => None,
    })
}

fn section_divider(record: &LayerRecord) -> Option<SectionDividerSetting> {
    record.blocks.iter().find_map(|b| match b {
        TaggedBlock::SectionDivider(d) | TaggedBlock::NestedSectionDivider(d) => Some(d.setting),
        _ => None,
    })
}

fn layers_group_info(resources: &ImageResources, expected_len: usize) -> Vec<u16> {
    match resources.get(ID_LAYERS_GROUP_INFO) {
        Some(block) => match &block.resource {
            ImageResource::LayersGroupInfo { group_ids } => group_ids.clone(),
            _ => vec![0; expected_len],
        },
        None => vec![0; expected_len],
    }
}

/// The inverse of `psd_to_nested_layers`: flattens a `Group`/`Image` tree
/// into a complete `PsdFile`.
///
/// When `size` is `None`, every image is translated so the tree's bounding
/// box starts at `(0, 0)` and the document size is derived from it;
/// otherwise the caller-supplied `(width, height)` is used unchanged and no
/// translation happens. `vector_mask` controls whether an image with no
/// transparency channel gets a rectangular vector mask instead of a
/// synthesised opaque alpha channel.
pub fn nested_layers_to_psd(
    layers: &[Layer],
    color_mode: ColorMode,
    version: Version,
    compression: Compression,
    depth: Option<ColorDepth>,
    size: Option<(u32, u32)>,
    vector_mask: bool,
) -> Result<PsdFile, PsdError> {
    if layers.is_empty() {
        return Err(NestedLayerError::EmptyLayerList.into());
    }

    let (width, height, layers) = normalize_positions(layers, size)?;
    let (num_channels, depth) = determine_channels_and_depth(&layers, depth)?;

    let mut flat_records = Vec::new();
    let mut flat_group_ids = Vec::new();
    flatten_layers(
        &layers,
        &mut flat_records,
        &mut flat_group_ids,
        vector_mask,
        depth,
    )?;
    flat_records.reverse();
    flat_group_ids.reverse();

    let header = Header::new(
        version,
        num_channels as u8,
        height,
        width,
        depth.bits(),
        color_mode.as_u16(),
    )?;

    let image_resources = if flat_group_ids.iter().any(|&id| id != 0) {
        ImageResources {
            blocks: vec![ImageResourceBlock {
                name: String::new(),
                resource: ImageResource::LayersGroupInfo {
                    group_ids: flat_group_ids,
                },
            }],
        }
    } else {
        ImageResources::default()
    };

    let layer_and_mask_info = LayerAndMaskInfo {
        layer_info: LayerInfo {
            layer_records: flat_records,
            use_alpha_channel: true,
        },
        global_layer_mask_info: None,
        additional_layer_info: Vec::new(),
    };

    // Rendering the flattened composite is out of scope here (§4.6 projects
    // the layer tree, it doesn't rasterise it); the composite section is a
    // blank canvas of the right shape, matching `compression`'s choice of
    // codec but not any visual content.
    let composite_planes = (0..num_channels)
        .map(|_| PixelPlane::constant(depth, height as usize, width as usize, 0))
        .collect();
    let _ = compression;

    Ok(PsdFile {
        header,
        color_mode_data: ColorModeData::default(),
        image_resources,
        layer_and_mask_info,
        image_data: ImageData::Decoded(composite_planes),
        source: Vec::new(),
    })
}

fn for_each_image<'a>(layers: &'a [Layer], f: &mut impl FnMut(&'a Image)) {
    for layer in layers {
        match layer {
            Layer::Image(img) => f(img),
            Layer::Group(group) => for_each_image(&group.layers, f),
        }
    }
}

fn normalize_positions(
    layers: &[Layer],
    size: Option<(u32, u32)>,
) -> Result<(u32, u32, Vec<Layer>), PsdError> {
    match size {
        Some((width, height)) => Ok((width, height, layers.to_vec())),
        None => {
            let mut bounds: Option<(i32, i32, i32, i32)> = None;
            for_each_image(layers, &mut |img| {
                bounds = Some(match bounds {
                    None => (img.top, img.left, img.bottom, img.right),
                    Some((top, left, bottom, right)) => (
                        top.min(img.top),
                        left.min(img.left),
                        bottom.max(img.bottom),
                        right.max(img.right),
                    ),
                });
            });
            let (top, left, bottom, right) = bounds.ok_or(NestedLayerError::NoImagesFound)?;
            let width = (right - left).max(0) as u32;
            let height = (bottom - top).max(0) as u32;
            let shifted = shift_layers(layers, -top, -left);
            Ok((width, height, shifted))
        }
    }
}

fn shift_layers(layers: &[Layer], dy: i32, dx: i32) -> Vec<Layer> {
    layers
        .iter()
        .map(|layer| match layer {
            Layer::Image(img) => {
                let mut img = img.clone();
                img.top += dy;
                img.bottom += dy;
                img.left += dx;
                img.right += dx;
                Layer::Image(img)
            }
            Layer::Group(group) => {
                let mut group = group.clone();
                group.layers = shift_layers(&group.layers, dy, dx);
                Layer::Group(group)
            }
        })
        .collect()
}

fn determine_channels_and_depth(
    layers: &[Layer],
    depth: Option<ColorDepth>,
) -> Result<(usize, ColorDepth), PsdError> {
    let mut found: Option<(usize, ColorDepth)> = None;
    let mut error = None;
    for_each_image(layers, &mut |img| {
        if error.is_some() {
            return;
        }
        let channel_depth = match img.channels.first() {
            Some((_, plane)) => plane.depth(),
            None => {
                error = Some(NestedLayerError::NoChannelsFound);
                return;
            }
        };
        let color_channel_count = img.channels.iter().filter(|(id, _)| id.is_color()).count();
        match found {
            None => found = Some((color_channel_count, channel_depth)),
            Some((_, existing_depth)) if existing_depth != channel_depth => {
                error = Some(NestedLayerError::InconsistentDepth);
            }
            _ => {}
        }
    });
    if let Some(error) = error {
        return Err(error.into());
    }
    let (count, found_depth) = found.ok_or(NestedLayerError::NoImagesFound)?;
    Ok((count, depth.unwrap_or(found_depth)))
}

fn flatten_layers(
    layers: &[Layer],
    flat_records: &mut Vec<LayerRecord>,
    flat_group_ids: &mut Vec<u16>,
    vector_mask: bool,
    depth: ColorDepth,
) -> Result<(), PsdError> {
    for layer in layers {
        match layer {
            Layer::Group(group) => {
                let open_index = flat_records.len() as u32;
                flat_records.push(sentinel_record(
                    group.blend_mode,
                    group.opacity,
                    group.visible,
                    group.name.clone(),
                    vec![
                        TaggedBlock::UnicodeLayerName(group.name.clone()),
                        TaggedBlock::SectionDivider(SectionDivider {
                            setting: if group.closed {
                                SectionDividerSetting::Closed
                            } else {
                                SectionDividerSetting::Open
                            },
                            key: None,
                            subtype: None,
                        }),
                        TaggedBlock::LayerId(open_index),
                    ],
                ));
                flat_group_ids.push(group.group_id.unwrap_or(0));

                flatten_layers(&group.layers, flat_records, flat_group_ids, vector_mask, depth)?;

                let close_index = flat_records.len() as u32;
                flat_records.push(sentinel_record(
                    BlendMode::NORMAL,
                    255,
                    true,
                    String::new(),
                    vec![
                        TaggedBlock::SectionDivider(SectionDivider {
                            setting: SectionDividerSetting::Bounding,
                            key: None,
                            subtype: None,
                        }),
                        TaggedBlock::LayerNameSource(close_index),
                    ],
                ));
                flat_group_ids.push(group.group_id.unwrap_or(0));
            }
            Layer::Image(image) => {
                let transparency = image
                    .channels
                    .iter()
                    .find(|(id, _)| *id == ChannelId::TRANSPARENCY);
                if let Some((_, plane)) = transparency {
                    if plane.to_bigendian_bytes().iter().all(|&b| b == 0) {
                        continue;
                    }
                }

                let index = flat_records.len() as u32;
                let mut channels: Vec<(ChannelId, ChannelImageData)> = image
                    .channels
                    .iter()
                    .map(|(id, plane)| (*id, ChannelImageData::Decoded(plane.clone())))
                    .collect();

                let mut blocks = vec![
                    TaggedBlock::UnicodeLayerName(image.name.clone()),
                    TaggedBlock::LayerId(index),
                ];

                if vector_mask {
                    let path_resource = PathResource::from_rect(
                        (image.top + 5) as f64,
                        (image.left + 5) as f64,
                        (image.bottom - 5) as f64,
                        (image.right - 5) as f64,
                    );
                    blocks.push(TaggedBlock::VectorMask {
                        version: 3,
                        invert: false,
                        not_link: false,
                        disable: false,
                        path_resource,
                    });
                } else if transparency.is_none() {
                    let width = (image.right - image.left).max(0) as usize;
                    let height = (image.bottom - image.top).max(0) as usize;
                    channels.push((
                        ChannelId::TRANSPARENCY,
                        ChannelImageData::Decoded(PixelPlane::constant(
                            depth,
                            height,
                            width,
                            max_value(depth),
                        )),
                    ));
                }

                flat_records.push(LayerRecord {
                    top: image.top,
                    left: image.left,
                    bottom: image.bottom,
                    right: image.right,
                    blend_mode: image.blend_mode,
                    opacity: image.opacity,
                    clipping: false,
                    transparency_protected: false,
                    visible: image.visible,
                    pixel_data_irrelevant: false,
                    mask: None,
                    blending_ranges: BlendingRanges::default(),
                    name: image.name.clone(),
                    blocks,
                    channels,
                });
                flat_group_ids.push(image.group_id.unwrap_or(0));
            }
        }
    }
    Ok(())
}

fn sentinel_record(
    blend_mode: BlendMode,
    opacity: u8,
    visible: bool,
    name: String,
    blocks: Vec<TaggedBlock>,
) -> LayerRecord {
    LayerRecord {
        top: 0,
        left: 0,
        bottom: 0,
        right: 0,
        blend_mode,
        opacity,
        clipping: false,
        transparency_protected: false,
        visible,
        pixel_data_irrelevant: false,
        mask: None,
        blending_ranges: BlendingRanges::default(),
        name,
        blocks,
        channels: Vec::new(),
    }
}

fn max_value(depth: ColorDepth) -> u32 {
    match depth {
        ColorDepth::One => 1,
        ColorDepth::Eight => 0xFF,
        ColorDepth::Sixteen => 0xFFFF,
        ColorDepth::ThirtyTwo => 0xFFFF_FFFF,
    }
}

#[derive(Debug, Error)]
pub enum NestedLayerError {
    #[error("cannot flatten an empty layer tree")]
    EmptyLayerList,
    #[error("no image layers found in the layer tree")]
    NoImagesFound,
    #[error("an image layer has no channels")]
    NoChannelsFound,
    #[error("images in the layer tree have inconsistent channel depths")]
    InconsistentDepth,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::ColorMode as Mode;

    fn leaf(top: i32, left: i32, bottom: i32, right: i32, value: u32) -> Image {
        let w = (right - left) as usize;
        let h = (bottom - top) as usize;
        Image {
            name: "leaf".to_string(),
            blend_mode: BlendMode::NORMAL,
            visible: true,
            opacity: 255,
            group_id: None,
            top,
            left,
            bottom,
            right,
            channels: vec![
                (ChannelId(0), PixelPlane::constant(ColorDepth::Eight, h, w, value)),
                (ChannelId(1), PixelPlane::constant(ColorDepth::Eight, h, w, value)),
                (ChannelId(2), PixelPlane::constant(ColorDepth::Eight, h, w, value)),
            ],
        }
    }

    #[test]
    fn rejects_an_empty_layer_list() {
        let err = nested_layers_to_psd(
            &[],
            Mode::Rgb,
            Version::One,
            Compression::Raw,
            None,
            None,
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PsdError::NestedLayer(NestedLayerError::EmptyLayerList)
        ));
    }

    #[test]
    fn flattens_a_single_image_and_projects_it_back() {
        let layers = vec![Layer::Image(leaf(0, 0, 4, 4, 42))];
        let psd = nested_layers_to_psd(
            &layers,
            Mode::Rgb,
            Version::One,
            Compression::Raw,
            None,
            None,
            false,
        )
        .unwrap();
        assert_eq!(psd.width(), 4);
        assert_eq!(psd.height(), 4);
        assert_eq!(psd.layer_and_mask_info.layer_info.layer_records.len(), 1);

        let bytes = psd.to_bytes(Compression::Raw).unwrap();
        let read_back = PsdFile::from_bytes(&bytes).unwrap();
        let projected = psd_to_nested_layers(&read_back, &bytes).unwrap();
        assert_eq!(projected.len(), 1);
        match &projected[0] {
            Layer::Image(img) => {
                assert_eq!(img.name, "leaf");
                assert_eq!((img.top, img.left, img.bottom, img.right), (0, 0, 4, 4));
            }
            Layer::Group(_) => panic!("expected an image"),
        }
    }

    #[test]
    fn flattens_a_group_with_one_child_and_projects_it_back() {
        let group = Group {
            name: "folder".to_string(),
            blend_mode: BlendMode::PASS_THROUGH,
            visible: true,
            opacity: 255,
            group_id: None,
            closed: false,
            layers: vec![Layer::Image(leaf(0, 0, 2, 2, 7))],
        };
        let layers = vec![Layer::Group(group)];
        let psd = nested_layers_to_psd(
            &layers,
            Mode::Rgb,
            Version::One,
            Compression::Raw,
            None,
            None,
            false,
        )
        .unwrap();
        // open sentinel + leaf + bounding sentinel
        assert_eq!(psd.layer_and_mask_info.layer_info.layer_records.len(), 3);

        let bytes = psd.to_bytes(Compression::Raw).unwrap();
        let read_back = PsdFile::from_bytes(&bytes).unwrap();
        let projected = psd_to_nested_layers(&read_back, &bytes).unwrap();
        assert_eq!(projected.len(), 1);
        match &projected[0] {
            Layer::Group(g) => {
                assert_eq!(g.name, "folder");
                assert_eq!(g.layers.len(), 1);
                assert!(!g.closed);
            }
            Layer::Image(_) => panic!("expected a group"),
        }
    }
}
