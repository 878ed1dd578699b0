//! Section structures (§4.3): Header, ColorModeData, ImageResources,
//! LayerAndMaskInfo, ImageData, composed in fixed order by `PsdFile`.

pub mod blending_range;
pub mod color_mode_data;
pub mod header;
pub mod image_data;
pub mod image_resources;
pub mod layer_and_mask;
