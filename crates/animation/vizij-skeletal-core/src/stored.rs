//! JSON loaders for skeletons and animation sets.

use hashbrown::HashMap;
use serde::Deserialize;

use crate::layers::{LayerSpec, LayerTopologyBuilder};
use crate::library::{AnimationLibrary, AnimationLibraryBuilder, BoneSet, ClipSource};
use crate::skeleton::{Bone, Skeleton};
use crate::Result;

/// Public API: parse skeleton JSON into a validated [`Skeleton`].
///
/// Shape: `{"bones": [{"name", "parent", "bind": {"translation", "rotation", "scale"},
/// "inverseBind"?}]}`. Vectors are arrays, rotations are `[x, y, z, w]`, the inverse bind
/// matrix is 16 floats in column-major order and defaults to identity.
pub fn parse_skeleton_json(s: &str) -> Result<Skeleton> {
    let stored: StoredSkeleton = serde_json::from_str(s)?;
    Skeleton::new(stored.bones)
}

/// Public API: parse an animation set (bone set, layers and clips) against `skeleton`.
///
/// Notes:
/// - `boneIndices` is optional; without it the skeleton's bone order is the bone set.
/// - Layers are registered in the order listed; masks name skeleton bones.
/// - Clip validation (durations, key order, bone names, default layers) happens while baking,
///   so every error surfaces here rather than during playback.
pub fn parse_animation_set_json(s: &str, skeleton: &Skeleton) -> Result<AnimationLibrary> {
    let stored: StoredAnimationSet = serde_json::from_str(s)?;

    let bone_set = match &stored.bone_indices {
        Some(table) => BoneSet::from_indices(table)?,
        None => BoneSet::from_skeleton(skeleton),
    };
    let topology = stored
        .layers
        .into_iter()
        .fold(LayerTopologyBuilder::new(), LayerTopologyBuilder::layer)
        .build(skeleton)?;

    AnimationLibraryBuilder::new(skeleton, bone_set, topology)
        .clips(stored.clips)
        .build()
}

#[derive(Deserialize)]
struct StoredSkeleton {
    bones: Vec<Bone>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAnimationSet {
    #[serde(default)]
    bone_indices: Option<HashMap<String, usize>>,
    #[serde(default)]
    layers: Vec<LayerSpec>,
    #[serde(default)]
    clips: Vec<ClipSource>,
}
