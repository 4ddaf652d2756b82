//! Identifiers for clips and layers.

use serde::{Deserialize, Serialize};

/// Opaque handle to a clip stored in an [`AnimationLibrary`](crate::AnimationLibrary).
/// Dense index; comparing handles is how "same clip already playing" is detected.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ClipId(pub u32);

impl ClipId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Semantic layer identifiers. A topology registers a subset of these, each classified
/// once as override or additive.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerId {
    /// Full-body base motion (idle, locomotion).
    Base,
    /// Upper-body overrides (waving, aiming).
    UpperBody,
    /// Head overrides (looking around).
    Head,
    /// Additive clips layered on top of everything else (blinking, breathing, hand poses).
    AdditiveBase,
}

impl LayerId {
    /// Number of identifiers.
    pub const COUNT: usize = 4;

    pub const ALL: [LayerId; Self::COUNT] = [
        LayerId::Base,
        LayerId::UpperBody,
        LayerId::Head,
        LayerId::AdditiveBase,
    ];

    #[inline]
    pub fn as_index(self) -> usize {
        self as usize
    }
}
