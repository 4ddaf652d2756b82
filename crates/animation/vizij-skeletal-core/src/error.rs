//! Error types for skeletal playback.
//!
//! Everything in here is a configuration error: content and code disagree about a clip,
//! layer or bone name. Runtime conditions such as a full additive request buffer or a bone
//! missing from a clip are not errors and never surface through this type.

use crate::ids::LayerId;

/// Errors produced while building assets or issuing playback commands.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AnimationError {
    /// A clip name was requested that the library does not contain.
    #[error("Clip not found: {name}")]
    UnknownClip { name: String },

    /// A layer identifier is not registered in the layer topology.
    #[error("Layer not registered: {layer:?}")]
    UnknownLayer { layer: LayerId },

    /// A bone name could not be resolved against the skeleton or bone set.
    #[error("Bone '{name}' not found while {context}")]
    UnknownBone { name: String, context: String },

    /// More layers of one kind were registered than the topology can hold.
    #[error("Cannot add more than {capacity} {kind} animation layers")]
    LayerCapacityExceeded { kind: &'static str, capacity: usize },

    /// The same layer identifier was registered twice.
    #[error("An animation layer with identifier {layer:?} already exists")]
    DuplicateLayer { layer: LayerId },

    /// Skeleton data violates the bone ordering or naming invariants.
    #[error("Invalid skeleton: {reason}")]
    InvalidSkeleton { reason: String },

    /// Clip data violates duration or keyframe ordering invariants.
    #[error("Invalid clip '{clip}': {reason}")]
    InvalidClip { clip: String, reason: String },

    /// A bone mask was built for a skeleton with a different bone count.
    #[error("Bone mask for layer {layer:?} covers {mask_len} bones, skeleton has {bone_count}")]
    MaskSizeMismatch {
        layer: LayerId,
        mask_len: usize,
        bone_count: usize,
    },

    /// Asset JSON could not be parsed.
    #[error("Parse error: {reason}")]
    Parse { reason: String },
}

impl AnimationError {
    /// Get error category for logging.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnknownClip { .. }
            | Self::UnknownLayer { .. }
            | Self::UnknownBone { .. }
            | Self::LayerCapacityExceeded { .. }
            | Self::DuplicateLayer { .. }
            | Self::MaskSizeMismatch { .. } => "config",
            Self::InvalidSkeleton { .. } | Self::InvalidClip { .. } => "data",
            Self::Parse { .. } => "parse",
        }
    }

    pub(crate) fn invalid_clip(clip: &str, reason: impl Into<String>) -> Self {
        Self::InvalidClip {
            clip: clip.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for AnimationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}
