//! Crate-wide error type.
//!
//! Every section/subsystem defines its own `thiserror`-derived error enum so
//! that each failure carries the offending value and the place it was found;
//! this type composes them into one thing a caller can match on or just
//! propagate with `?`.

use thiserror::Error;

use crate::codecs::CodecError;
use crate::sections::header::HeaderError;
use crate::sections::image_data::ImageDataError;
use crate::sections::image_resources::ImageResourceError;
use crate::sections::layer_and_mask::{LayerMaskError, LayerRecordError};
use crate::nested_layers::NestedLayerError;
use crate::path::PathRecordError;
use crate::tagged_block::TaggedBlockError;

/// Any error that can occur while reading or writing a PSD/PSB file.
#[derive(Debug, Error)]
pub enum PsdError {
    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    ImageResource(#[from] ImageResourceError),

    #[error(transparent)]
    ImageData(#[from] ImageDataError),

    #[error(transparent)]
    LayerRecord(#[from] LayerRecordError),

    #[error(transparent)]
    LayerMask(#[from] LayerMaskError),

    #[error(transparent)]
    TaggedBlock(#[from] TaggedBlockError),

    #[error(transparent)]
    PathRecord(#[from] PathRecordError),

    #[error(transparent)]
    NestedLayer(#[from] NestedLayerError),

    #[error("unexpected end of input: needed {needed} bytes, only {available} remained at offset {offset}")]
    UnexpectedEof {
        needed: u64,
        available: u64,
        offset: u64,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
