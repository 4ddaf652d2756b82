//! Interpolation helpers:
//! - lerp for vectors
//! - quaternion NLERP with shortest-arc normalization
//! - whole-transform blends and the weighted additive delta

use glam::{Quat, Vec3};

use crate::transform::Transform;

/// Types that can be interpolated between two keyframes.
pub trait Interpolate: Copy {
    fn interpolate(a: Self, b: Self, t: f32) -> Self;
}

impl Interpolate for Vec3 {
    #[inline]
    fn interpolate(a: Self, b: Self, t: f32) -> Self {
        lerp_vec3(a, b, t)
    }
}

impl Interpolate for Quat {
    #[inline]
    fn interpolate(a: Self, b: Self, t: f32) -> Self {
        nlerp_quat(a, b, t)
    }
}

#[inline]
pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// Quaternion NLERP with shortest-arc correction.
/// If dot < 0, negate the second quaternion to ensure the shortest path.
/// Returns a normalized quaternion.
#[inline]
pub fn nlerp_quat(a: Quat, b: Quat, t: f32) -> Quat {
    let b = if a.dot(b) < 0.0 { -b } else { b };
    let q = a + (b - a) * t;
    let len2 = q.length_squared();
    if len2 > 0.0 {
        q * len2.sqrt().recip()
    } else {
        a
    }
}

/// Blend two full transforms component-wise.
#[inline]
pub fn blend_transform(a: &Transform, b: &Transform, t: f32) -> Transform {
    Transform {
        translation: lerp_vec3(a.translation, b.translation, t),
        rotation: nlerp_quat(a.rotation, b.rotation, t),
        scale: lerp_vec3(a.scale, b.scale, t),
    }
}

/// Component-wise ratio guarding against zero reference scale.
#[inline]
fn scale_ratio(sampled: Vec3, reference: Vec3) -> Vec3 {
    let div = |s: f32, r: f32| if r == 0.0 { 1.0 } else { s / r };
    Vec3::new(
        div(sampled.x, reference.x),
        div(sampled.y, reference.y),
        div(sampled.z, reference.z),
    )
}

/// Apply `weight` of the delta between `reference` and `sampled` onto `target`.
///
/// Translation delta is a difference, rotation delta is `inverse(reference) * sampled`
/// slerped from identity, scale delta is a ratio lerped from one.
pub fn accumulate_additive(
    target: &mut Transform,
    reference: &Transform,
    sampled: &Transform,
    weight: f32,
) {
    let dt = (sampled.translation - reference.translation) * weight;
    let dr = Quat::IDENTITY.slerp(reference.rotation.inverse() * sampled.rotation, weight);
    let ds = Vec3::ONE.lerp(scale_ratio(sampled.scale, reference.scale), weight);

    target.translation += dt;
    target.rotation = (target.rotation * dr).normalize();
    target.scale *= ds;
}
