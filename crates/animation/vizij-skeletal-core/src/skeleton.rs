//! Skeleton: ordered bones with bind poses.
//!
//! Bones are stored so that every parent precedes its children, which lets hierarchy
//! resolution (done by the consumer) run as a single forward pass.

use glam::Mat4;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::AnimationError;
use crate::transform::Transform;
use crate::Result;

/// One bone of a skeleton.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bone {
    pub name: String,
    /// Index of the parent bone, `-1` for roots.
    #[serde(rename = "parent")]
    pub parent_index: i32,
    /// Bind-pose transform relative to the parent.
    #[serde(rename = "bind")]
    pub local_bind: Transform,
    #[serde(default = "identity_matrix")]
    pub inverse_bind: Mat4,
}

fn identity_matrix() -> Mat4 {
    Mat4::IDENTITY
}

impl Bone {
    pub fn new(name: impl Into<String>, parent_index: i32, local_bind: Transform) -> Self {
        Self {
            name: name.into(),
            parent_index,
            local_bind,
            inverse_bind: Mat4::IDENTITY,
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<usize> {
        usize::try_from(self.parent_index).ok()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent_index < 0
    }
}

/// Immutable skeleton shared by every player animated from it.
#[derive(Clone, Debug)]
pub struct Skeleton {
    bones: Vec<Bone>,
    name_to_index: HashMap<String, usize>,
    children: Vec<Vec<usize>>,
}

impl Skeleton {
    /// Build a skeleton, validating topological order and unique names.
    pub fn new(bones: Vec<Bone>) -> Result<Self> {
        let mut name_to_index = HashMap::with_capacity(bones.len());
        let mut children = vec![Vec::new(); bones.len()];

        for (index, bone) in bones.iter().enumerate() {
            if name_to_index.insert(bone.name.clone(), index).is_some() {
                return Err(AnimationError::InvalidSkeleton {
                    reason: format!("duplicate bone name '{}'", bone.name),
                });
            }
            if bone.parent_index < -1 {
                return Err(AnimationError::InvalidSkeleton {
                    reason: format!(
                        "bone '{}' has invalid parent index {}",
                        bone.name, bone.parent_index
                    ),
                });
            }
            if let Some(parent) = bone.parent() {
                if parent >= index {
                    return Err(AnimationError::InvalidSkeleton {
                        reason: format!(
                            "bone '{}' (#{index}) must come after its parent #{parent}",
                            bone.name
                        ),
                    });
                }
                children[parent].push(index);
            }
        }

        Ok(Self {
            bones,
            name_to_index,
            children,
        })
    }

    #[inline]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Direct children of a bone, in index order.
    pub fn children(&self, index: usize) -> &[usize] {
        self.children.get(index).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bone(name: &str, parent: i32) -> Bone {
        Bone::new(name, parent, Transform::IDENTITY)
    }

    #[test]
    fn builds_child_lists_from_parent_indices() {
        let skel = Skeleton::new(vec![
            bone("root", -1),
            bone("spine", 0),
            bone("leg_l", 0),
            bone("head", 1),
        ])
        .unwrap();
        assert_eq!(skel.children(0), &[1, 2]);
        assert_eq!(skel.children(1), &[3]);
        assert!(skel.children(3).is_empty());
        assert_eq!(skel.find_bone("head"), Some(3));
        assert_eq!(skel.find_bone("tail"), None);
    }

    #[test]
    fn rejects_parent_after_child() {
        let err = Skeleton::new(vec![bone("root", -1), bone("arm", 2), bone("hand", 1)])
            .unwrap_err();
        assert!(matches!(err, AnimationError::InvalidSkeleton { .. }));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Skeleton::new(vec![bone("root", -1), bone("root", 0)]).unwrap_err();
        assert!(matches!(err, AnimationError::InvalidSkeleton { .. }));
    }
}
