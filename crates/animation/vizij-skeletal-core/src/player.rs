//! Animation player: one per character instance.
//!
//! Shares the skeleton and library with every other player and owns only its runtime state.
//! Per tick: issue `play`/`stop` intents, call [`AnimationPlayer::update_time`] once, then
//! sample bones. Sampling never mutates state.

use std::sync::Arc;

use arrayvec::ArrayVec;

use crate::clip::AnimationClip;
use crate::config::{Config, PlayOptions, MAX_ADDITIVE_LAYERS, MAX_OVERRIDE_LAYERS};
use crate::error::AnimationError;
use crate::ids::{ClipId, LayerId};
use crate::interp::{accumulate_additive, blend_transform};
use crate::library::AnimationLibrary;
use crate::skeleton::Skeleton;
use crate::state::{AdditiveLayerState, ClipRequest, OverrideLayerState, Playback};
use crate::transform::Transform;
use crate::Result;

#[derive(Debug)]
pub struct AnimationPlayer {
    library: Arc<AnimationLibrary>,
    skeleton: Arc<Skeleton>,
    config: Config,
    /// Skeleton bone index -> bone set index.
    set_index: Box<[Option<usize>]>,
    overrides: ArrayVec<OverrideLayerState, MAX_OVERRIDE_LAYERS>,
    additives: ArrayVec<AdditiveLayerState, MAX_ADDITIVE_LAYERS>,
}

impl AnimationPlayer {
    /// Bind a library to a skeleton. Fails if a layer mask was built for another skeleton.
    pub fn new(
        library: Arc<AnimationLibrary>,
        skeleton: Arc<Skeleton>,
        config: Config,
    ) -> Result<Self> {
        let topology = library.topology();
        topology.validate_masks(skeleton.bone_count())?;

        let set_index = skeleton
            .bones()
            .iter()
            .map(|bone| {
                let index = library.bone_set().index_of(&bone.name);
                if index.is_none() {
                    log::warn!(
                        "bone '{}' is not in the animation bone set; it will hold its bind pose",
                        bone.name
                    );
                }
                index
            })
            .collect();

        let overrides = (0..topology.override_count())
            .map(|_| OverrideLayerState::default())
            .collect();
        let additives = (0..topology.additive_count())
            .map(|_| AdditiveLayerState::default())
            .collect();

        Ok(Self {
            library,
            skeleton,
            config,
            set_index,
            overrides,
            additives,
        })
    }

    #[inline]
    pub fn library(&self) -> &Arc<AnimationLibrary> {
        &self.library
    }

    #[inline]
    pub fn skeleton(&self) -> &Arc<Skeleton> {
        &self.skeleton
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Play `clip_name` on `layer` at full weight and speed, fading over the configured
    /// default transition.
    pub fn play(&mut self, layer: LayerId, clip_name: &str) -> Result<()> {
        let options = PlayOptions {
            transition_seconds: self.config.default_transition_seconds,
            ..PlayOptions::default()
        };
        self.play_with(layer, clip_name, options)
    }

    /// Play `clip_name` on `layer`.
    ///
    /// Override layers: the same clip is retargeted in place, a different clip crossfades
    /// from the current one. Additive layers: the request is queued and reconciled with the
    /// slots on the next [`update_time`](Self::update_time).
    pub fn play_with(
        &mut self,
        layer: LayerId,
        clip_name: &str,
        options: PlayOptions,
    ) -> Result<()> {
        let id = self.resolve_clip(clip_name)?;
        self.play_clip(layer, id, options)
    }

    /// Play `clip_name` on the layer the clip was authored for.
    pub fn play_default(&mut self, clip_name: &str, options: PlayOptions) -> Result<()> {
        let id = self.resolve_clip(clip_name)?;
        let layer = self
            .library
            .clip(id)
            .map(AnimationClip::default_layer)
            .ok_or_else(|| unknown_clip(clip_name))?;
        self.play_clip(layer, id, options)
    }

    /// Play by handle.
    pub fn play_clip(&mut self, layer: LayerId, id: ClipId, options: PlayOptions) -> Result<()> {
        let topology = self.library.topology();
        let index = topology
            .layer_index(layer)
            .ok_or(AnimationError::UnknownLayer { layer })?;
        let clip = self
            .library
            .clip(id)
            .ok_or_else(|| unknown_clip(&format!("{id:?}")))?;

        if topology.is_additive(layer) {
            let request = ClipRequest {
                clip: id,
                weight: options.weight,
                speed: options.speed,
                fade_seconds: options.transition_seconds,
            };
            if !self.additives[index].enqueue(request) {
                log::trace!(
                    "additive layer {layer:?} request buffer full; dropped '{}'",
                    clip.name()
                );
            }
        } else if self.overrides[index].play(
            id,
            clip,
            options.weight,
            options.speed,
            options.transition_seconds,
        ) {
            log::debug!("layer {layer:?} switched to '{}'", clip.name());
        }
        Ok(())
    }

    /// Fade `layer` out. On an additive layer every slot fades.
    pub fn stop(&mut self, layer: LayerId, fade_seconds: f32) -> Result<()> {
        let topology = self.library.topology();
        let index = topology
            .layer_index(layer)
            .ok_or(AnimationError::UnknownLayer { layer })?;
        if topology.is_additive(layer) {
            self.additives[index].stop(fade_seconds);
        } else {
            self.overrides[index].stop(fade_seconds);
        }
        Ok(())
    }

    pub fn stop_all(&mut self, fade_seconds: f32) {
        for layer in &mut self.overrides {
            layer.stop(fade_seconds);
        }
        for layer in &mut self.additives {
            layer.stop(fade_seconds);
        }
    }

    /// Reconcile queued additive requests with the additive slots.
    /// Called by [`update_time`](Self::update_time); exposed for callers that drive ticks manually.
    pub fn resolve_additive_clips(&mut self) {
        let fade = self.config.default_fade_seconds;
        for layer in &mut self.additives {
            layer.resolve(&self.library, fade);
        }
    }

    /// Advance every layer by `dt` seconds.
    pub fn update_time(&mut self, dt: f32) {
        self.resolve_additive_clips();
        let fade = self.config.default_fade_seconds;
        for layer in &mut self.overrides {
            layer.advance(dt, &self.library, fade);
        }
        for layer in &mut self.additives {
            layer.advance(dt, &self.library, fade);
        }
    }

    /// Local transform of skeleton bone `bone` for the current state.
    pub fn sample_bone(&self, bone: usize) -> Transform {
        let Some(bind) = self.skeleton.bone(bone).map(|b| b.local_bind) else {
            return Transform::IDENTITY;
        };
        let Some(set) = self.set_index.get(bone).copied().flatten() else {
            return bind;
        };
        let topology = self.library.topology();

        let mut pose = bind;
        for (layer, state) in topology.override_layers().iter().zip(&self.overrides) {
            let playback = &state.playback;
            if !playback.is_active() || !layer.affects(bone) {
                continue;
            }
            let Some(mut layer_pose) = self.sample_playback(playback, set, &bind) else {
                continue;
            };
            if let Some(transition) = &state.transition {
                let source = self.sample_clip(
                    transition.clip,
                    transition.time,
                    transition.speed,
                    set,
                    &bind,
                );
                if let Some(source) = source {
                    layer_pose = blend_transform(&source, &layer_pose, transition.progress());
                }
            }
            pose = blend_transform(&pose, &layer_pose, playback.weight);
        }

        let reference = pose;
        for (layer, state) in topology.additive_layers().iter().zip(&self.additives) {
            if !layer.affects(bone) {
                continue;
            }
            for slot in state.slots.iter().filter(|s| s.is_active()) {
                let Some(id) = slot.clip else { continue };
                let Some(clip) = self.library.clip(id) else { continue };
                if let Some(sampled) = clip.sample_bone(set, slot.time, slot.speed, &reference) {
                    accumulate_additive(&mut pose, &reference, &sampled, slot.weight);
                }
            }
        }
        pose
    }

    /// Sample every skeleton bone into `out`, in bone order.
    pub fn sample_pose(&self, out: &mut [Transform]) {
        for (bone, transform) in out.iter_mut().enumerate().take(self.skeleton.bone_count()) {
            *transform = self.sample_bone(bone);
        }
    }

    pub fn override_state(&self, index: usize) -> Option<&OverrideLayerState> {
        self.overrides.get(index)
    }

    pub fn additive_slots(&self, index: usize) -> Option<&[Playback]> {
        self.additives.get(index).map(|l| &l.slots[..])
    }

    /// Override state by layer identifier; `None` for additive or unregistered layers.
    pub fn layer_state(&self, layer: LayerId) -> Option<&OverrideLayerState> {
        let topology = self.library.topology();
        if topology.is_additive(layer) {
            return None;
        }
        self.overrides.get(topology.layer_index(layer)?)
    }

    fn resolve_clip(&self, name: &str) -> Result<ClipId> {
        self.library.clip_id(name).ok_or_else(|| unknown_clip(name))
    }

    /// Layer pose: the clip's channel, or the bind pose for bones the clip does not animate.
    fn sample_playback(
        &self,
        playback: &Playback,
        set: usize,
        bind: &Transform,
    ) -> Option<Transform> {
        self.sample_clip(playback.clip?, playback.time, playback.speed, set, bind)
    }

    fn sample_clip(
        &self,
        id: ClipId,
        time: f32,
        speed: f32,
        set: usize,
        bind: &Transform,
    ) -> Option<Transform> {
        let clip = self.library.clip(id)?;
        Some(clip.sample_bone(set, time, speed, bind).unwrap_or(*bind))
    }
}

fn unknown_clip(name: &str) -> AnimationError {
    AnimationError::UnknownClip {
        name: name.to_string(),
    }
}
