//! Vizij Skeletal Core (engine-agnostic)
//!
//! Runtime skeletal animation evaluator. A shared [`Skeleton`] and [`AnimationLibrary`]
//! (bone set, baked clips, layer topology) drive any number of [`AnimationPlayer`]s, one per
//! character. Each tick a player takes `play`/`stop` intents, advances time and weights, and
//! produces a local [`Transform`] per bone by blending override layers and stacking additive
//! clips on top. Hierarchy resolution and skinning are left to the consumer.

pub mod clip;
pub mod config;
pub mod curve;
pub mod error;
pub mod ids;
pub mod interp;
pub mod layers;
pub mod library;
pub mod mask;
pub mod player;
pub mod skeleton;
pub mod state;
pub mod stored;
pub mod transform;

// Re-exports for consumers
pub use clip::{AnimationClip, BoneChannel, FreezeAxes, WrapMode, NO_CHANNEL};
pub use config::{
    Config, PlayOptions, MAX_ADDITIVE_LAYERS, MAX_ADDITIVE_SLOTS, MAX_OVERRIDE_LAYERS,
};
pub use curve::{find_frame_index, measure_time_distance, sample_curve, Curve, Keyframe};
pub use error::AnimationError;
pub use ids::{ClipId, LayerId};
pub use layers::{LayerDefinition, LayerKind, LayerSpec, LayerTopology, LayerTopologyBuilder};
pub use library::{AnimationLibrary, AnimationLibraryBuilder, BoneSet, ChannelSource, ClipSource};
pub use mask::{BoneMask, BoneMaskBuilder};
pub use player::AnimationPlayer;
pub use skeleton::{Bone, Skeleton};
pub use state::{AdditiveLayerState, ClipRequest, OverrideLayerState, Playback, Transition};
pub use stored::{parse_animation_set_json, parse_skeleton_json};
pub use transform::Transform;

pub type Result<T> = core::result::Result<T, AnimationError>;
