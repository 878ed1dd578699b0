//! A layer's mask / adjustment-layer data. Grounded on
//! `pytoshop/layers.py`'s `LayerMask`.
//!
//! Encoded as `Option<LayerMask>` at the call site rather than pytoshop's
//! reflection-based "is every field still at its default" check: `None`
//! writes the zero-length marker, `Some` always writes the full body.

use std::io::{Seek, Write};

use thiserror::Error;

use crate::enums::EnumError;
use crate::error::PsdError;
use crate::io::cursor::PsdCursor;
use crate::io::writer::PsdWriter;
use crate::io::{pack_bitflags, unpack_bitflags};

/// | Length | Description |
/// |---|---|
/// | 4 | Length of the following data; 0 means no mask (short-circuits here) |
/// | 16 | Enclosing rectangle (top, left, bottom, right) |
/// | 1 | Default color |
/// | 1 | Flags |
/// | 1 | Mask parameters, present only if flags bit 4 is set |
/// | var | user/vector mask density and feather, each present per a mask-parameters bit |
/// | 1 | Real flags |
/// | 1 | Real user mask background |
/// | 16 | Real enclosing rectangle |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerMask {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
    pub default_color: bool,
    pub position_relative_to_layer: bool,
    pub layer_mask_disabled: bool,
    pub invert_layer_mask_when_blending: bool,
    pub user_mask_from_rendering_other_data: bool,
    pub user_mask_density: Option<u8>,
    pub user_mask_feather: Option<f64>,
    pub vector_mask_density: Option<u8>,
    pub vector_mask_feather: Option<f64>,
    pub real_flags: u8,
    pub real_user_mask_background: bool,
    pub real_top: i32,
    pub real_left: i32,
    pub real_bottom: i32,
    pub real_right: i32,
}

impl LayerMask {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    fn mask_parameters_flags(&self) -> u8 {
        pack_bitflags(&[
            self.user_mask_density.is_some(),
            self.user_mask_feather.is_some(),
            self.vector_mask_density.is_some(),
            self.vector_mask_feather.is_some(),
        ])
    }

    fn data_length(&self) -> u32 {
        let mut length = 16 + 1 + 1;
        let mask_flags = self.mask_parameters_flags();
        if mask_flags != 0 {
            length += 1;
            if self.user_mask_density.is_some() {
                length += 1;
            }
            if self.user_mask_feather.is_some() {
                length += 8;
            }
            if self.vector_mask_density.is_some() {
                length += 1;
            }
            if self.vector_mask_feather.is_some() {
                length += 8;
            }
        }
        length + 1 + 1 + 16
    }

    /// Total on-wire size including the 4-byte length prefix.
    pub fn total_length(mask: Option<&LayerMask>) -> u32 {
        4 + mask.map_or(0, LayerMask::data_length)
    }

    pub fn read(cursor: &mut PsdCursor) -> Result<Option<LayerMask>, PsdError> {
        let length = cursor.read_u32()?;
        let end = cursor.position() + length as u64;
        if length == 0 {
            return Ok(None);
        }

        let top = cursor.read_i32()?;
        let left = cursor.read_i32()?;
        let bottom = cursor.read_i32()?;
        let right = cursor.read_i32()?;

        let default_color = cursor.read_u8()? != 0;

        let flags = cursor.read_u8()?;
        let bits = unpack_bitflags(flags, 4);
        let position_relative_to_layer = bits[0];
        let layer_mask_disabled = bits[1];
        let invert_layer_mask_when_blending = bits[2];
        let user_mask_from_rendering_other_data = bits[3];

        if length == 20 {
            cursor.seek_from_start(end)?;
            return Ok(Some(LayerMask {
                top,
                left,
                bottom,
                right,
                default_color,
                position_relative_to_layer,
                layer_mask_disabled,
                invert_layer_mask_when_blending,
                user_mask_from_rendering_other_data,
                user_mask_density: None,
                user_mask_feather: None,
                vector_mask_density: None,
                vector_mask_feather: None,
                real_flags: 0,
                real_user_mask_background: false,
                real_top: top,
                real_left: left,
                real_bottom: bottom,
                real_right: right,
            }));
        }

        let mut user_mask_density = None;
        let mut user_mask_feather = None;
        let mut vector_mask_density = None;
        let mut vector_mask_feather = None;
        // Bit 4 (value 16) of the outer flags byte: a mask-parameters byte
        // follows, itself holding which of the four optional fields exist.
        if flags & 16 != 0 {
            let mask_parameters = cursor.read_u8()?;
            let has = unpack_bitflags(mask_parameters, 4);
            if has[0] {
                user_mask_density = Some(cursor.read_u8()?);
            }
            if has[1] {
                user_mask_feather = Some(cursor.read_f64()?);
            }
            if has[2] {
                vector_mask_density = Some(cursor.read_u8()?);
            }
            if has[3] {
                vector_mask_feather = Some(cursor.read_f64()?);
            }
        }

        let real_flags = cursor.read_u8()?;
        let real_user_mask_background = cursor.read_u8()? != 0;

        let real_top = cursor.read_i32()?;
        let real_left = cursor.read_i32()?;
        let real_bottom = cursor.read_i32()?;
        let real_right = cursor.read_i32()?;

        cursor.seek_from_start(end)?;

        Ok(Some(LayerMask {
            top,
            left,
            bottom,
            right,
            default_color,
            position_relative_to_layer,
            layer_mask_disabled,
            invert_layer_mask_when_blending,
            user_mask_from_rendering_other_data,
            user_mask_density,
            user_mask_feather,
            vector_mask_density,
            vector_mask_feather,
            real_flags,
            real_user_mask_background,
            real_top,
            real_left,
            real_bottom,
            real_right,
        }))
    }

    pub fn write<W: Write + Seek>(
        mask: Option<&LayerMask>,
        writer: &mut PsdWriter<W>,
    ) -> Result<(), PsdError> {
        let mask = match mask {
            Some(mask) => mask,
            None => {
                writer.write_u32(0)?;
                return Ok(());
            }
        };

        writer.write_u32(mask.data_length())?;
        writer.write_i32(mask.top)?;
        writer.write_i32(mask.left)?;
        writer.write_i32(mask.bottom)?;
        writer.write_i32(mask.right)?;
        writer.write_u8(if mask.default_color { 255 } else { 0 })?;

        let mask_flags = mask.mask_parameters_flags();
        let flags = pack_bitflags(&[
            mask.position_relative_to_layer,
            mask.layer_mask_disabled,
            mask.invert_layer_mask_when_blending,
            mask.user_mask_from_rendering_other_data,
            mask_flags != 0,
        ]);
        writer.write_u8(flags)?;

        if mask_flags != 0 {
            writer.write_u8(mask_flags)?;
            if let Some(density) = mask.user_mask_density {
                writer.write_u8(density)?;
            }
            if let Some(feather) = mask.user_mask_feather {
                writer.write_f64(feather)?;
            }
            if let Some(density) = mask.vector_mask_density {
                writer.write_u8(density)?;
            }
            if let Some(feather) = mask.vector_mask_feather {
                writer.write_f64(feather)?;
            }
        }

        writer.write_u8(mask.real_flags)?;
        writer.write_u8(if mask.real_user_mask_background {
            255
        } else {
            0
        })?;
        writer.write_i32(mask.real_top)?;
        writer.write_i32(mask.real_left)?;
        writer.write_i32(mask.real_bottom)?;
        writer.write_i32(mask.real_right)?;

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum LayerMaskError {
    #[error(transparent)]
    Enum(EnumError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_round_trips_as_zero_length() {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            LayerMask::write(None, &mut w).unwrap();
        }
        let bytes = buf.into_inner();
        assert_eq!(bytes, vec![0, 0, 0, 0]);
        let mut cursor = PsdCursor::new(&bytes);
        assert_eq!(LayerMask::read(&mut cursor).unwrap(), None);
    }

    #[test]
    fn reads_legacy_20_byte_short_form() {
        // Some older files stop right after the flags byte: length == 20
        // means "rectangle + default_color + flags and nothing else".
        let mut bytes = vec![];
        bytes.extend_from_slice(&20u32.to_be_bytes());
        bytes.extend_from_slice(&1i32.to_be_bytes());
        bytes.extend_from_slice(&2i32.to_be_bytes());
        bytes.extend_from_slice(&3i32.to_be_bytes());
        bytes.extend_from_slice(&4i32.to_be_bytes());
        bytes.push(255);
        bytes.push(0b0000_1001); // position_relative_to_layer + user_mask_from_rendering_other_data

        let mut cursor = PsdCursor::new(&bytes);
        let mask = LayerMask::read(&mut cursor).unwrap().unwrap();
        assert_eq!((mask.top, mask.left, mask.bottom, mask.right), (1, 2, 3, 4));
        assert!(mask.default_color);
        assert!(mask.position_relative_to_layer);
        assert!(!mask.layer_mask_disabled);
        assert!(mask.user_mask_from_rendering_other_data);
        assert_eq!((mask.real_top, mask.real_left, mask.real_bottom, mask.real_right), (1, 2, 3, 4));
    }

    #[test]
    fn round_trips_mask_with_optional_density_and_feather() {
        let mask = LayerMask {
            top: 0,
            left: 0,
            bottom: 100,
            right: 100,
            default_color: false,
            position_relative_to_layer: false,
            layer_mask_disabled: true,
            invert_layer_mask_when_blending: false,
            user_mask_from_rendering_other_data: false,
            user_mask_density: Some(128),
            user_mask_feather: Some(2.5),
            vector_mask_density: None,
            vector_mask_feather: None,
            real_flags: 1,
            real_user_mask_background: true,
            real_top: 0,
            real_left: 0,
            real_bottom: 100,
            real_right: 100,
        };
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut w = PsdWriter::new(&mut buf);
            LayerMask::write(Some(&mask), &mut w).unwrap();
        }
        let bytes = buf.into_inner();
        let mut cursor = PsdCursor::new(&bytes);
        assert_eq!(LayerMask::read(&mut cursor).unwrap(), Some(mask));
    }
}
