//! Keyframe curves and direction-aware sampling.
//!
//! Model:
//! - A curve is a time-ascending list of keyframes in clip seconds, `[0, duration]`.
//! - Lookup is a binary search for the key to interpolate *from*. Forward playback
//!   (speed >= 0) interpolates toward the next key, reverse playback toward the previous one.
//! - Progress between keys is measured with circular time distance so that a looping clip
//!   interpolates correctly across the seam between the last and the first key.
//! - Non-looping clips never cross the seam; they hold the boundary key instead.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::interp::Interpolate;

/// A single sample of a curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
}

impl<T> Keyframe<T> {
    pub fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

/// Time-ordered keyframes for one transform component of one bone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Curve<T> {
    keys: Vec<Keyframe<T>>,
}

pub type Vec3Curve = Curve<Vec3>;
pub type QuatCurve = Curve<Quat>;

impl<T> Curve<T> {
    pub fn new(keys: Vec<Keyframe<T>>) -> Self {
        Self { keys }
    }

    pub fn empty() -> Self {
        Self { keys: Vec::new() }
    }

    #[inline]
    pub fn keys(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn keys_mut(&mut self) -> &mut [Keyframe<T>] {
        &mut self.keys
    }

    /// Index of the first key whose time is not ascending, if any.
    pub(crate) fn first_unordered(&self) -> Option<usize> {
        self.keys
            .windows(2)
            .position(|w| w[1].time < w[0].time)
            .map(|i| i + 1)
    }
}

/// Circular distance from `first` to `second` on a timeline of length `duration`.
#[inline]
pub fn measure_time_distance(duration: f32, first: f32, second: f32) -> f32 {
    if first <= second {
        second - first
    } else {
        duration - first + second
    }
}

/// Find the key to interpolate from at time `t`.
///
/// Forward (`speed >= 0`): the last key with `time <= t`; before the first key the segment
/// wraps, so the last key is returned.
/// Reverse (`speed < 0`): the first key with `time >= t`; after the last key the segment
/// wraps, so key 0 is returned.
///
/// `keys` must be non-empty.
pub fn find_frame_index<T>(keys: &[Keyframe<T>], t: f32, speed: f32) -> usize {
    debug_assert!(!keys.is_empty());
    let last = keys.len() - 1;
    if speed >= 0.0 {
        let after = keys.partition_point(|k| k.time <= t);
        if after == 0 {
            last
        } else {
            after - 1
        }
    } else {
        let before = keys.partition_point(|k| k.time < t);
        if before > last {
            0
        } else {
            before
        }
    }
}

/// Sample a curve at time `t`. Returns `None` for an empty curve.
pub fn sample_curve<T: Interpolate>(
    curve: &Curve<T>,
    duration: f32,
    t: f32,
    speed: f32,
    looping: bool,
) -> Option<T> {
    let keys = curve.keys();
    let (first, last) = (keys.first()?, keys.last()?);
    if keys.len() == 1 {
        return Some(first.value);
    }
    if !looping {
        if t <= first.time {
            return Some(first.value);
        }
        if t >= last.time {
            return Some(last.value);
        }
    }

    let n = keys.len();
    let index = find_frame_index(keys, t, speed);
    let curr = &keys[index];
    let (next, elapsed, span) = if speed >= 0.0 {
        let next = &keys[(index + 1) % n];
        (
            next,
            measure_time_distance(duration, curr.time, t),
            measure_time_distance(duration, curr.time, next.time),
        )
    } else {
        let next = &keys[if index == 0 { n - 1 } else { index - 1 }];
        (
            next,
            measure_time_distance(duration, t, curr.time),
            measure_time_distance(duration, next.time, curr.time),
        )
    };

    if span <= 0.0 {
        return Some(curr.value);
    }
    let progress = (elapsed / span).clamp(0.0, 1.0);
    Some(T::interpolate(curr.value, next.value, progress))
}
