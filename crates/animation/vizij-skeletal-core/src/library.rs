//! Animation library: the bone set table, baked clips and the layer topology they play on.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::clip::{AnimationClip, BoneChannel, FreezeAxes, WrapMode, NO_CHANNEL};
use crate::error::AnimationError;
use crate::ids::{ClipId, LayerId};
use crate::layers::LayerTopology;
use crate::skeleton::Skeleton;
use crate::Result;

/// Bone name -> stable set index shared by every clip in a library.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoneSet {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl BoneSet {
    /// Build from names in set-index order.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(AnimationError::Parse {
                    reason: format!("bone set lists '{name}' twice"),
                });
            }
        }
        Ok(Self { names, index })
    }

    /// The skeleton's own bone order as the set.
    pub fn from_skeleton(skeleton: &Skeleton) -> Self {
        let names: Vec<String> = skeleton.bones().iter().map(|b| b.name.clone()).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Self { names, index }
    }

    /// Build from an explicit name -> index table. Indices must be dense from zero.
    pub fn from_indices(table: &HashMap<String, usize>) -> Result<Self> {
        let mut names = vec![None; table.len()];
        for (name, &i) in table {
            let slot = names
                .get_mut(i)
                .filter(|slot| slot.is_none())
                .ok_or_else(|| AnimationError::Parse {
                    reason: format!("bone set index {i} for '{name}' is out of range or reused"),
                })?;
            *slot = Some(name.clone());
        }
        Self::new(names.into_iter().flatten())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[inline]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }
}

fn default_layer() -> LayerId {
    LayerId::Base
}

/// Curves for one named bone, as authored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelSource {
    pub bone: String,
    #[serde(flatten)]
    pub curves: BoneChannel,
}

/// An unbaked clip description, resolved against the bone set when the library is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipSource {
    pub name: String,
    pub duration: f32,
    pub wrap_mode: WrapMode,
    #[serde(default = "default_layer")]
    pub default_layer: LayerId,
    #[serde(default)]
    pub freeze_root_bone: FreezeAxes,
    #[serde(default)]
    pub channels: Vec<ChannelSource>,
}

impl ClipSource {
    pub fn new(name: impl Into<String>, duration: f32, wrap_mode: WrapMode) -> Self {
        Self {
            name: name.into(),
            duration,
            wrap_mode,
            default_layer: LayerId::Base,
            freeze_root_bone: FreezeAxes::empty(),
            channels: Vec::new(),
        }
    }

    pub fn on_layer(mut self, layer: LayerId) -> Self {
        self.default_layer = layer;
        self
    }

    pub fn freeze_root(mut self, axes: FreezeAxes) -> Self {
        self.freeze_root_bone = axes;
        self
    }

    pub fn channel(mut self, bone: impl Into<String>, curves: BoneChannel) -> Self {
        self.channels.push(ChannelSource {
            bone: bone.into(),
            curves,
        });
        self
    }
}

/// Everything a player needs besides the skeleton. Immutable once built.
#[derive(Clone, Debug)]
pub struct AnimationLibrary {
    bone_set: BoneSet,
    clips: Vec<AnimationClip>,
    by_name: HashMap<String, ClipId>,
    topology: LayerTopology,
}

impl AnimationLibrary {
    #[inline]
    pub fn bone_set(&self) -> &BoneSet {
        &self.bone_set
    }

    #[inline]
    pub fn topology(&self) -> &LayerTopology {
        &self.topology
    }

    #[inline]
    pub fn clip(&self, id: ClipId) -> Option<&AnimationClip> {
        self.clips.get(id.index())
    }

    pub fn clip_id(&self, name: &str) -> Option<ClipId> {
        self.by_name.get(name).copied()
    }

    pub fn clip_by_name(&self, name: &str) -> Option<&AnimationClip> {
        self.clip_id(name).and_then(|id| self.clip(id))
    }

    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    #[inline]
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }
}

/// Validates clip sources and bakes them into an [`AnimationLibrary`].
pub struct AnimationLibraryBuilder<'a> {
    skeleton: &'a Skeleton,
    bone_set: BoneSet,
    topology: LayerTopology,
    sources: Vec<ClipSource>,
}

impl<'a> AnimationLibraryBuilder<'a> {
    pub fn new(skeleton: &'a Skeleton, bone_set: BoneSet, topology: LayerTopology) -> Self {
        Self {
            skeleton,
            bone_set,
            topology,
            sources: Vec::new(),
        }
    }

    pub fn clip(mut self, source: ClipSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn clips(mut self, sources: impl IntoIterator<Item = ClipSource>) -> Self {
        self.sources.extend(sources);
        self
    }

    pub fn build(self) -> Result<AnimationLibrary> {
        self.topology.validate_masks(self.skeleton.bone_count())?;

        let mut clips = Vec::with_capacity(self.sources.len());
        let mut by_name = HashMap::with_capacity(self.sources.len());
        for source in self.sources {
            let id = ClipId(clips.len() as u32);
            if by_name.insert(source.name.clone(), id).is_some() {
                return Err(AnimationError::invalid_clip(
                    &source.name,
                    "a clip with this name already exists",
                ));
            }
            clips.push(bake_clip(source, self.skeleton, &self.bone_set, &self.topology)?);
        }

        log::debug!(
            "built animation library: {} clips over {} bones",
            clips.len(),
            self.bone_set.len()
        );
        Ok(AnimationLibrary {
            bone_set: self.bone_set,
            clips,
            by_name,
            topology: self.topology,
        })
    }
}

fn bake_clip(
    source: ClipSource,
    skeleton: &Skeleton,
    bone_set: &BoneSet,
    topology: &LayerTopology,
) -> Result<AnimationClip> {
    let ClipSource {
        name,
        duration,
        wrap_mode,
        default_layer,
        freeze_root_bone,
        channels: sources,
    } = source;

    if !duration.is_finite() || duration < 0.0 {
        return Err(AnimationError::invalid_clip(
            &name,
            format!("duration must be finite and non-negative, got {duration}"),
        ));
    }
    if !topology.has_layer(default_layer) {
        return Err(AnimationError::UnknownLayer {
            layer: default_layer,
        });
    }

    let mut mapping = vec![NO_CHANNEL; bone_set.len()].into_boxed_slice();
    let mut channels = Vec::with_capacity(sources.len());
    for ChannelSource { bone, mut curves } in sources {
        let set_index = bone_set
            .index_of(&bone)
            .ok_or_else(|| AnimationError::UnknownBone {
                name: bone.clone(),
                context: format!("baking clip '{name}'"),
            })?;
        if mapping[set_index] != NO_CHANNEL {
            return Err(AnimationError::invalid_clip(
                &name,
                format!("bone '{bone}' has more than one channel"),
            ));
        }

        let unordered = curves
            .translation
            .first_unordered()
            .or_else(|| curves.rotation.first_unordered())
            .or_else(|| curves.scale.first_unordered());
        if let Some(key) = unordered {
            return Err(AnimationError::invalid_clip(
                &name,
                format!("keyframe {key} of bone '{bone}' is out of time order"),
            ));
        }

        for key in curves.rotation.keys_mut() {
            key.value = key.value.normalize();
        }
        let is_root = skeleton
            .find_bone(&bone)
            .and_then(|i| skeleton.bone(i))
            .is_some_and(|b| b.is_root());
        if is_root && !freeze_root_bone.is_empty() {
            curves.freeze_translation(freeze_root_bone);
        }

        mapping[set_index] = channels.len() as i32;
        channels.push(curves);
    }

    Ok(AnimationClip {
        name,
        duration,
        wrap_mode,
        default_layer,
        channels,
        bone_index_mapping: mapping,
    })
}
