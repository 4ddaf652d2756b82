//! Animation clips: per-bone channels plus duration, wrap behavior and the bone mapping.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::curve::{sample_curve, QuatCurve, Vec3Curve};
use crate::ids::LayerId;
use crate::transform::Transform;

/// Sentinel in [`AnimationClip::bone_index_mapping`] for bones without a channel.
pub const NO_CHANNEL: i32 = -1;

/// What happens when playback runs past either end of a clip.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WrapMode {
    /// Clamp at the boundary and fade the layer/slot out.
    Once,
    /// Wrap around; reverse playback wraps from the start to the end.
    Loop,
    /// Clamp at the boundary and keep holding the last pose.
    Clamp,
}

/// Translation, rotation and scale curves for one bone. Empty curves fall back to the
/// bind pose component.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneChannel {
    #[serde(default)]
    pub translation: Vec3Curve,
    #[serde(default)]
    pub rotation: QuatCurve,
    #[serde(default)]
    pub scale: Vec3Curve,
}

impl BoneChannel {
    /// Sample all three components, substituting `bind` for missing curves.
    pub fn sample(
        &self,
        duration: f32,
        time: f32,
        speed: f32,
        looping: bool,
        bind: &Transform,
    ) -> Transform {
        Transform {
            translation: sample_curve(&self.translation, duration, time, speed, looping)
                .unwrap_or(bind.translation),
            rotation: sample_curve(&self.rotation, duration, time, speed, looping)
                .unwrap_or(bind.rotation),
            scale: sample_curve(&self.scale, duration, time, speed, looping)
                .unwrap_or(bind.scale),
        }
    }

    /// Zero the selected translation axes on every key.
    pub(crate) fn freeze_translation(&mut self, axes: FreezeAxes) {
        for key in self.translation.keys_mut() {
            if axes.contains(FreezeAxes::X) {
                key.value.x = 0.0;
            }
            if axes.contains(FreezeAxes::Y) {
                key.value.y = 0.0;
            }
            if axes.contains(FreezeAxes::Z) {
                key.value.z = 0.0;
            }
        }
    }
}

bitflags! {
    /// Translation axes to zero on root bones when a clip is built.
    ///
    /// Stored as `{ "x": bool, "y": bool, "z": bool }` with missing axes left unfrozen.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FreezeAxes: u8 {
        const X = 1 << 0;
        const Y = 1 << 1;
        const Z = 1 << 2;
        const XZ = Self::X.bits() | Self::Z.bits();
    }
}

#[derive(Serialize, Deserialize)]
struct StoredAxes {
    #[serde(default)]
    x: bool,
    #[serde(default)]
    y: bool,
    #[serde(default)]
    z: bool,
}

impl Serialize for FreezeAxes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        StoredAxes {
            x: self.contains(Self::X),
            y: self.contains(Self::Y),
            z: self.contains(Self::Z),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FreezeAxes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let axes = StoredAxes::deserialize(deserializer)?;
        let mut flags = Self::empty();
        flags.set(Self::X, axes.x);
        flags.set(Self::Y, axes.y);
        flags.set(Self::Z, axes.z);
        Ok(flags)
    }
}

/// An immutable clip owned by an [`AnimationLibrary`](crate::AnimationLibrary).
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    pub(crate) name: String,
    pub(crate) duration: f32,
    pub(crate) wrap_mode: WrapMode,
    pub(crate) default_layer: LayerId,
    pub(crate) channels: Vec<BoneChannel>,
    /// Set bone index -> channel index, [`NO_CHANNEL`] when absent.
    pub(crate) bone_index_mapping: Box<[i32]>,
}

impl AnimationClip {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap_mode
    }

    #[inline]
    pub fn default_layer(&self) -> LayerId {
        self.default_layer
    }

    #[inline]
    pub fn channels(&self) -> &[BoneChannel] {
        &self.channels
    }

    #[inline]
    pub fn bone_index_mapping(&self) -> &[i32] {
        &self.bone_index_mapping
    }

    /// Channel animating the bone with the given set index, if any.
    #[inline]
    pub fn channel_for(&self, set_bone: usize) -> Option<&BoneChannel> {
        let channel = *self.bone_index_mapping.get(set_bone)?;
        usize::try_from(channel)
            .ok()
            .and_then(|c| self.channels.get(c))
    }

    /// Sample the bone with set index `set_bone`; `None` when the clip does not animate it.
    pub fn sample_bone(
        &self,
        set_bone: usize,
        time: f32,
        speed: f32,
        bind: &Transform,
    ) -> Option<Transform> {
        let looping = self.wrap_mode == WrapMode::Loop;
        self.channel_for(set_bone)
            .map(|ch| ch.sample(self.duration, time, speed, looping, bind))
    }

    /// Resolve a playback time past either end of the clip. Returns the wrapped time and
    /// whether a `Once` clip ran out.
    pub fn wrap_time(&self, time: f32) -> (f32, bool) {
        let duration = self.duration;
        if time >= 0.0 && time <= duration {
            return (time, false);
        }
        match self.wrap_mode {
            WrapMode::Once => (time.clamp(0.0, duration), true),
            WrapMode::Clamp => (time.clamp(0.0, duration), false),
            WrapMode::Loop => {
                if duration <= 0.0 {
                    return (0.0, false);
                }
                let m = time % duration;
                let wrapped = if m < 0.0 { duration + m } else { m };
                // `duration + (-tiny)` can round back up to `duration`.
                (if wrapped >= duration { 0.0 } else { wrapped }, false)
            }
        }
    }

    /// Playback start time for a given speed: reverse playback starts at the end.
    #[inline]
    pub fn start_time(&self, speed: f32) -> f32 {
        if speed < 0.0 {
            self.duration
        } else {
            0.0
        }
    }
}
