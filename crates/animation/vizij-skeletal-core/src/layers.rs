//! Layer topology: which override and additive layers exist and which bones they affect.
//!
//! Built once at asset-load time and shared read-only by every player. Capacities are fixed
//! (`MAX_OVERRIDE_LAYERS`, `MAX_ADDITIVE_LAYERS`) and storage is inline.

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::config::{MAX_ADDITIVE_LAYERS, MAX_OVERRIDE_LAYERS};
use crate::error::AnimationError;
use crate::ids::LayerId;
use crate::mask::{BoneMask, BoneMaskBuilder};
use crate::skeleton::Skeleton;
use crate::Result;

/// How a layer composes with the layers below it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerKind {
    /// Blends toward its sampled pose, replacing what is below for masked bones.
    Override,
    /// Adds the delta of its clips on top of the override result.
    Additive,
}

/// A registered layer. `index` is its position among layers of the same kind.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerDefinition {
    pub id: LayerId,
    pub mask: Option<BoneMask>,
    pub index: usize,
}

impl LayerDefinition {
    /// Whether this layer affects `bone`. Layers without a mask affect every bone.
    #[inline]
    pub fn affects(&self, bone: usize) -> bool {
        self.mask.as_ref().map_or(true, |m| m.contains(bone))
    }
}

#[derive(Clone, Debug, Default)]
pub struct LayerTopology {
    overrides: ArrayVec<LayerDefinition, MAX_OVERRIDE_LAYERS>,
    additives: ArrayVec<LayerDefinition, MAX_ADDITIVE_LAYERS>,
    index_of: [Option<u8>; LayerId::COUNT],
    additive_bits: u8,
}

impl LayerTopology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_override_layer(&mut self, id: LayerId, mask: Option<BoneMask>) -> Result<usize> {
        if self.overrides.is_full() {
            return Err(AnimationError::LayerCapacityExceeded {
                kind: "override",
                capacity: MAX_OVERRIDE_LAYERS,
            });
        }
        if self.has_layer(id) {
            return Err(AnimationError::DuplicateLayer { layer: id });
        }
        let index = self.overrides.len();
        self.overrides.push(LayerDefinition { id, mask, index });
        self.index_of[id.as_index()] = Some(index as u8);
        Ok(index)
    }

    pub fn add_additive_layer(&mut self, id: LayerId, mask: Option<BoneMask>) -> Result<usize> {
        if self.additives.is_full() {
            return Err(AnimationError::LayerCapacityExceeded {
                kind: "additive",
                capacity: MAX_ADDITIVE_LAYERS,
            });
        }
        if self.has_layer(id) {
            return Err(AnimationError::DuplicateLayer { layer: id });
        }
        let index = self.additives.len();
        self.additives.push(LayerDefinition { id, mask, index });
        self.index_of[id.as_index()] = Some(index as u8);
        self.additive_bits |= 1 << id.as_index();
        Ok(index)
    }

    #[inline]
    pub fn has_layer(&self, id: LayerId) -> bool {
        self.index_of[id.as_index()].is_some()
    }

    /// Index of the layer among layers of its kind.
    #[inline]
    pub fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.index_of[id.as_index()].map(usize::from)
    }

    #[inline]
    pub fn is_additive(&self, id: LayerId) -> bool {
        self.additive_bits & (1 << id.as_index()) != 0
    }

    pub fn override_layer(&self, index: usize) -> Option<&LayerDefinition> {
        self.overrides.get(index)
    }

    pub fn additive_layer(&self, index: usize) -> Option<&LayerDefinition> {
        self.additives.get(index)
    }

    pub fn override_layers(&self) -> &[LayerDefinition] {
        &self.overrides
    }

    pub fn additive_layers(&self) -> &[LayerDefinition] {
        &self.additives
    }

    #[inline]
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }

    #[inline]
    pub fn additive_count(&self) -> usize {
        self.additives.len()
    }

    /// Check that every mask covers exactly `bone_count` bones.
    pub fn validate_masks(&self, bone_count: usize) -> Result<()> {
        for layer in self.overrides.iter().chain(self.additives.iter()) {
            if let Some(mask) = &layer.mask {
                if mask.len() != bone_count {
                    return Err(AnimationError::MaskSizeMismatch {
                        layer: layer.id,
                        mask_len: mask.len(),
                        bone_count,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Declarative description of one layer, resolved against a skeleton by
/// [`LayerTopologyBuilder::build`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: LayerId,
    pub kind: LayerKind,
    #[serde(default)]
    pub mask: Option<BoneMaskBuilder>,
}

#[derive(Clone, Debug, Default)]
pub struct LayerTopologyBuilder {
    layers: Vec<LayerSpec>,
}

impl LayerTopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn override_layer(mut self, id: LayerId, mask: Option<BoneMaskBuilder>) -> Self {
        self.layers.push(LayerSpec {
            id,
            kind: LayerKind::Override,
            mask,
        });
        self
    }

    pub fn additive_layer(mut self, id: LayerId, mask: Option<BoneMaskBuilder>) -> Self {
        self.layers.push(LayerSpec {
            id,
            kind: LayerKind::Additive,
            mask,
        });
        self
    }

    pub fn layer(mut self, spec: LayerSpec) -> Self {
        self.layers.push(spec);
        self
    }

    pub fn build(&self, skeleton: &Skeleton) -> Result<LayerTopology> {
        let mut topology = LayerTopology::new();
        for spec in &self.layers {
            let mask = spec
                .mask
                .as_ref()
                .map(|m| m.build(skeleton))
                .transpose()?;
            match spec.kind {
                LayerKind::Override => topology.add_override_layer(spec.id, mask)?,
                LayerKind::Additive => topology.add_additive_layer(spec.id, mask)?,
            };
        }
        Ok(topology)
    }
}
