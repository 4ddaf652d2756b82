//! Per-character runtime state: what each layer and additive slot is playing, where in the
//! clip it is, and how its weight is moving.
//!
//! Weight model:
//! - `weight` moves toward `target_weight` at `weight_velocity` per second.
//! - Reaching the target stops the ramp; reaching a zero target also releases the clip.
//! - While fading to zero the clip time is frozen.

use arrayvec::ArrayVec;

use crate::clip::AnimationClip;
use crate::config::MAX_ADDITIVE_SLOTS;
use crate::ids::ClipId;
use crate::library::AnimationLibrary;

/// Playback of one clip on an override layer or an additive slot.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Playback {
    pub clip: Option<ClipId>,
    pub time: f32,
    pub speed: f32,
    pub weight: f32,
    pub target_weight: f32,
    pub weight_velocity: f32,
}

impl Playback {
    pub const EMPTY: Playback = Playback {
        clip: None,
        time: 0.0,
        speed: 0.0,
        weight: 0.0,
        target_weight: 0.0,
        weight_velocity: 0.0,
    };

    /// Playing a clip with non-zero weight.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.clip.is_some() && self.weight > 0.0
    }

    #[inline]
    pub fn is_fading_out(&self) -> bool {
        self.target_weight == 0.0 && self.weight_velocity < 0.0
    }

    /// Switch to `id` from the start of the clip in the direction of `speed`.
    pub(crate) fn start(&mut self, id: ClipId, clip: &AnimationClip, speed: f32) {
        self.clip = Some(id);
        self.speed = speed;
        self.time = clip.start_time(speed);
    }

    /// Ramp from the current weight to `weight` over `seconds`; `seconds <= 0` applies it now.
    pub(crate) fn retarget(&mut self, weight: f32, seconds: f32) {
        self.target_weight = weight;
        if seconds <= 0.0 || self.weight == weight {
            self.weight = weight;
            self.weight_velocity = 0.0;
            if weight <= 0.0 {
                self.clear();
            }
        } else {
            self.weight_velocity = (weight - self.weight) / seconds;
        }
    }

    /// Fade to zero over `fade_seconds`, never slower than a fade already in progress.
    pub(crate) fn stop(&mut self, fade_seconds: f32) {
        if self.clip.is_none() {
            return;
        }
        if fade_seconds <= 0.0 || self.weight <= 0.0 {
            self.clear();
            return;
        }
        self.target_weight = 0.0;
        self.weight_velocity = self.weight_velocity.min(-self.weight / fade_seconds);
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::EMPTY;
    }

    /// Advance the weight ramp. Returns `true` when a fade-out finished and the clip was released.
    pub(crate) fn advance_weight(&mut self, dt: f32) -> bool {
        if self.clip.is_none() || self.weight_velocity == 0.0 {
            return false;
        }
        self.weight += dt * self.weight_velocity;
        let reached = if self.weight_velocity > 0.0 {
            self.weight >= self.target_weight
        } else {
            self.weight <= self.target_weight
        };
        if !reached {
            return false;
        }
        self.weight = self.target_weight;
        self.weight_velocity = 0.0;
        if self.target_weight <= 0.0 {
            self.clear();
            return true;
        }
        false
    }

    /// Advance clip time and apply the wrap mode. Returns `true` when a `Once` clip ran out.
    pub(crate) fn advance_time(&mut self, dt: f32, clip: &AnimationClip) -> bool {
        if self.clip.is_none() || self.is_fading_out() {
            return false;
        }
        let (time, ended) = clip.wrap_time(self.time + dt * self.speed);
        self.time = time;
        ended
    }

    /// Weight then time, stopping `Once` clips that ran out.
    fn advance(&mut self, dt: f32, library: &AnimationLibrary, fade_seconds: f32) {
        let Some(id) = self.clip else {
            return;
        };
        if self.advance_weight(dt) {
            log::debug!("clip {id:?} faded out");
            return;
        }
        let Some(clip) = library.clip(id) else {
            self.clear();
            return;
        };
        if self.advance_time(dt, clip) {
            log::debug!("clip '{}' reached its end, fading out", clip.name());
            self.stop(fade_seconds);
        }
    }
}

/// Crossfade source snapshotted when an override layer switches clips.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub clip: ClipId,
    pub time: f32,
    pub speed: f32,
    pub total_duration: f32,
    pub remaining_duration: f32,
}

impl Transition {
    /// Blend factor from the source pose (0) to the current pose (1).
    #[inline]
    pub fn progress(&self) -> f32 {
        if self.total_duration <= 0.0 {
            return 1.0;
        }
        (1.0 - self.remaining_duration / self.total_duration).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OverrideLayerState {
    pub playback: Playback,
    pub transition: Option<Transition>,
}

impl OverrideLayerState {
    /// Play `id` on this layer. Returns `true` when the layer switched clips.
    pub(crate) fn play(
        &mut self,
        id: ClipId,
        clip: &AnimationClip,
        weight: f32,
        speed: f32,
        transition_seconds: f32,
    ) -> bool {
        let playback = &mut self.playback;
        if playback.clip == Some(id) {
            playback.speed = speed;
            if playback.target_weight != weight {
                playback.retarget(weight, transition_seconds);
            }
            return false;
        }

        self.transition = match playback.clip {
            Some(previous) if transition_seconds > 0.0 => Some(Transition {
                clip: previous,
                time: playback.time,
                speed: playback.speed,
                total_duration: transition_seconds,
                remaining_duration: transition_seconds,
            }),
            _ => None,
        };
        playback.start(id, clip, speed);
        playback.retarget(weight, transition_seconds);
        true
    }

    pub(crate) fn stop(&mut self, fade_seconds: f32) {
        self.playback.stop(fade_seconds);
        if self.playback.clip.is_none() {
            self.transition = None;
        }
    }

    pub(crate) fn advance(&mut self, dt: f32, library: &AnimationLibrary, fade_seconds: f32) {
        self.playback.advance(dt, library, fade_seconds);
        if self.playback.clip.is_none() {
            self.transition = None;
            return;
        }

        let Some(transition) = &mut self.transition else {
            return;
        };
        transition.remaining_duration -= dt;
        match library.clip(transition.clip) {
            Some(source) if transition.remaining_duration > 0.0 => {
                let (time, _) = source.wrap_time(transition.time + dt * transition.speed);
                transition.time = time;
            }
            _ => self.transition = None,
        }
    }
}

/// A queued additive `play` waiting for the next reconciliation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipRequest {
    pub clip: ClipId,
    pub weight: f32,
    pub speed: f32,
    pub fade_seconds: f32,
}

#[derive(Clone, Debug, Default)]
pub struct AdditiveLayerState {
    pub slots: [Playback; MAX_ADDITIVE_SLOTS],
    requests: ArrayVec<ClipRequest, MAX_ADDITIVE_SLOTS>,
}

impl AdditiveLayerState {
    /// Queue a request for this tick. A clip already queued keeps one entry and takes the
    /// newest weight, speed and fade. Returns `false` when the buffer is full and the request
    /// was dropped.
    pub(crate) fn enqueue(&mut self, request: ClipRequest) -> bool {
        if let Some(queued) = self.requests.iter_mut().find(|r| r.clip == request.clip) {
            *queued = request;
            return true;
        }
        self.requests.try_push(request).is_ok()
    }

    #[inline]
    pub fn pending_requests(&self) -> &[ClipRequest] {
        &self.requests
    }

    pub(crate) fn stop(&mut self, fade_seconds: f32) {
        for slot in &mut self.slots {
            slot.stop(fade_seconds);
        }
    }

    /// Match this tick's requests against the slots.
    ///
    /// Requests for a clip already in a slot keep that slot (and its time). The rest start
    /// fresh in the first empty slot. Only when none is empty do they evict the first
    /// unrequested slot. Slots nobody asked for fade out.
    pub(crate) fn resolve(&mut self, library: &AnimationLibrary, fade_seconds: f32) {
        let mut claimed = [false; MAX_ADDITIVE_SLOTS];
        let mut unmatched = ArrayVec::<ClipRequest, MAX_ADDITIVE_SLOTS>::new();

        for request in self.requests.drain(..) {
            let found = self
                .slots
                .iter()
                .enumerate()
                .position(|(i, slot)| !claimed[i] && slot.clip == Some(request.clip));
            match found {
                Some(i) => {
                    claimed[i] = true;
                    let slot = &mut self.slots[i];
                    slot.speed = request.speed;
                    if slot.target_weight != request.weight {
                        slot.retarget(request.weight, request.fade_seconds);
                    }
                }
                None => unmatched.push(request),
            }
        }

        for request in unmatched {
            let free = (0..MAX_ADDITIVE_SLOTS)
                .find(|&i| !claimed[i] && self.slots[i].clip.is_none())
                .or_else(|| (0..MAX_ADDITIVE_SLOTS).find(|&i| !claimed[i]));
            let Some(i) = free else {
                break;
            };
            claimed[i] = true;
            let Some(clip) = library.clip(request.clip) else {
                continue;
            };
            let slot = &mut self.slots[i];
            if let Some(previous) = slot.clip {
                log::debug!("additive slot {i}: {previous:?} replaced by '{}'", clip.name());
            }
            *slot = Playback::EMPTY;
            slot.start(request.clip, clip, request.speed);
            slot.retarget(request.weight, request.fade_seconds);
        }

        for (slot, _) in self.slots.iter_mut().zip(claimed).filter(|(_, c)| !c) {
            slot.stop(fade_seconds);
        }
    }

    pub(crate) fn advance(&mut self, dt: f32, library: &AnimationLibrary, fade_seconds: f32) {
        for slot in &mut self.slots {
            slot.advance(dt, library, fade_seconds);
        }
    }
}
