//! Playback configuration and per-call options.

use serde::{Deserialize, Serialize};

/// Maximum number of override layers in a topology.
pub const MAX_OVERRIDE_LAYERS: usize = 2;
/// Maximum number of additive layers in a topology.
pub const MAX_ADDITIVE_LAYERS: usize = 1;
/// Concurrent clip slots per additive layer; also the per-tick request buffer size.
pub const MAX_ADDITIVE_SLOTS: usize = 3;

/// Player-wide defaults.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Crossfade length used by [`AnimationPlayer::play`](crate::AnimationPlayer::play).
    pub default_transition_seconds: f32,
    /// Fade-out length applied when a `Once` clip ends or an additive slot is evicted.
    pub default_fade_seconds: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_transition_seconds: 0.15,
            default_fade_seconds: 0.15,
        }
    }
}

/// Options for a single `play` call.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayOptions {
    /// Target blend weight.
    pub weight: f32,
    /// Playback speed multiplier; negative plays in reverse.
    pub speed: f32,
    /// Crossfade (override layers) or fade-in (additive slots) duration.
    pub transition_seconds: f32,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            weight: 1.0,
            speed: 1.0,
            transition_seconds: Config::default().default_transition_seconds,
        }
    }
}

impl PlayOptions {
    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_transition(mut self, seconds: f32) -> Self {
        self.transition_seconds = seconds;
        self
    }
}
