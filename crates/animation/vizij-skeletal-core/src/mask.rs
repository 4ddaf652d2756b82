//! Bone masks: one bit per skeleton bone.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::AnimationError;
use crate::skeleton::Skeleton;
use crate::Result;

const WORD_BITS: usize = u64::BITS as usize;

/// Fixed-width bitset indexed by skeleton bone index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoneMask {
    words: Box<[u64]>,
    len: usize,
}

impl BoneMask {
    /// An empty mask covering `len` bones.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)].into_boxed_slice(),
            len,
        }
    }

    /// Number of bones covered by the mask.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `bone` is included. Indices past the end are excluded.
    #[inline]
    pub fn contains(&self, bone: usize) -> bool {
        bone < self.len && self.words[bone / WORD_BITS] & (1u64 << (bone % WORD_BITS)) != 0
    }

    #[inline]
    pub fn insert(&mut self, bone: usize) {
        debug_assert!(bone < self.len);
        self.words[bone / WORD_BITS] |= 1u64 << (bone % WORD_BITS);
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| self.contains(i))
    }
}

/// Collects bone names and subtree roots, resolved against a skeleton at build time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneMaskBuilder {
    #[serde(default)]
    bones: Vec<String>,
    #[serde(default)]
    subtrees: Vec<String>,
}

impl BoneMaskBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include a single bone.
    pub fn add(mut self, bone: impl Into<String>) -> Self {
        self.bones.push(bone.into());
        self
    }

    /// Include a bone and all of its descendants.
    pub fn add_subtree(mut self, root: impl Into<String>) -> Self {
        self.subtrees.push(root.into());
        self
    }

    pub fn build(&self, skeleton: &Skeleton) -> Result<BoneMask> {
        let mut mask = BoneMask::new(skeleton.bone_count());
        let resolve = |name: &str| {
            skeleton
                .find_bone(name)
                .ok_or_else(|| AnimationError::UnknownBone {
                    name: name.to_string(),
                    context: "building bone mask".to_string(),
                })
        };

        for name in &self.bones {
            mask.insert(resolve(name)?);
        }

        let mut queue = VecDeque::new();
        for root in &self.subtrees {
            queue.push_back(resolve(root)?);
            while let Some(bone) = queue.pop_front() {
                mask.insert(bone);
                queue.extend(skeleton.children(bone).iter().copied());
            }
        }

        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Bone;
    use crate::transform::Transform;

    fn skeleton() -> Skeleton {
        let names = [
            ("hips", -1),
            ("spine", 0),
            ("chest", 1),
            ("neck", 2),
            ("head", 3),
            ("arm_l", 2),
            ("hand_l", 5),
            ("leg_l", 0),
        ];
        Skeleton::new(
            names
                .iter()
                .map(|(n, p)| Bone::new(*n, *p, Transform::IDENTITY))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn subtree_collects_descendants_breadth_first() {
        let skel = skeleton();
        let mask = BoneMaskBuilder::new().add_subtree("chest").build(&skel).unwrap();
        let bones: Vec<usize> = mask.iter().collect();
        assert_eq!(bones, vec![2, 3, 4, 5, 6]);
        assert!(!mask.contains(0));
        assert!(!mask.contains(7));
    }

    #[test]
    fn single_bones_and_subtrees_combine() {
        let skel = skeleton();
        let mask = BoneMaskBuilder::new()
            .add("hips")
            .add_subtree("neck")
            .build(&skel)
            .unwrap();
        assert_eq!(mask.count(), 3);
        assert!(mask.contains(0) && mask.contains(3) && mask.contains(4));
        assert_eq!(mask.len(), skel.bone_count());
    }

    #[test]
    fn unknown_bone_is_a_build_error() {
        let skel = skeleton();
        let err = BoneMaskBuilder::new().add("tail").build(&skel).unwrap_err();
        assert!(matches!(err, AnimationError::UnknownBone { ref name, .. } if name == "tail"));
        let err = BoneMaskBuilder::new()
            .add_subtree("wing")
            .build(&skel)
            .unwrap_err();
        assert!(matches!(err, AnimationError::UnknownBone { .. }));
    }

    #[test]
    fn masks_wider_than_one_word() {
        let mut mask = BoneMask::new(130);
        mask.insert(0);
        mask.insert(64);
        mask.insert(129);
        assert!(mask.contains(64) && mask.contains(129));
        assert!(!mask.contains(65));
        assert!(!mask.contains(500));
        assert_eq!(mask.count(), 3);
    }
}
