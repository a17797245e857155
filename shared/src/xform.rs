//! Rigid-transform helpers for grab geometry.
//!
//! # Model
//! - World and avatar-frame poses are [`nalgebra::Isometry3<f32>`], composed left to
//!   right: `world = avatar_root * local`.
//! - A grab captures one relative transform (`rel_xform`) between the two joints at
//!   the instant of the grab. Holding it constant keeps the relative hand offset
//!   fixed while both sides move.

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion};

/// Rigid transform (rotation + translation), the pose currency of this workspace.
pub type Xform = Isometry3<f32>;

/// Blends `a` toward `b`: translation lerp, rotation slerp.
///
/// `alpha` 0 returns `a`, 1 returns `b`. Antipodal rotations (where slerp is
/// undefined) fall back to the nearer endpoint instead of panicking.
pub fn tween(a: &Xform, b: &Xform, alpha: f32) -> Xform {
    let pos = a.translation.vector.lerp(&b.translation.vector, alpha);
    let rot = a
        .rotation
        .try_slerp(&b.rotation, alpha, 1.0e-6)
        .unwrap_or(if alpha < 0.5 { a.rotation } else { b.rotation });
    Xform::from_parts(Translation3::from(pos), rot)
}

/// Component-wise identity test used to detect an untracked controller matrix.
///
/// `w` may be 1 or -1; both encode the identity rotation.
pub fn is_identity(x: &Xform, eps: f32) -> bool {
    let q = x.rotation.quaternion();
    let t = &x.translation.vector;
    q.coords.x.abs() < eps
        && q.coords.y.abs() < eps
        && q.coords.z.abs() < eps
        && (q.coords.w.abs() - 1.0).abs() < eps
        && t.x.abs() < eps
        && t.y.abs() < eps
        && t.z.abs() < eps
}

/// Relative transform from the grabbed joint to the grabbing joint at grab time:
/// `rel = other⁻¹ * mine`, i.e. the grabbing joint expressed in the grabbed
/// joint's frame. Applying `other * rel` later reproduces the grabbing joint's
/// pose as if the pair had not moved apart.
pub fn delta_offset(my_joint: &Xform, other_joint: &Xform) -> Xform {
    other_joint.inverse() * my_joint
}

/// Hand-to-hand variant of [`delta_offset`]: shifts the grabbing joint by the
/// world-space palm separation first, so the two palms meet instead of the two
/// wrist joints overlapping.
pub fn hand_delta_offset(
    my_joint: &Xform,
    other_joint: &Xform,
    my_palm: Point3<f32>,
    other_palm: Point3<f32>,
) -> Xform {
    let palm_offset = Xform::from_parts(
        Translation3::from(other_palm - my_palm),
        UnitQuaternion::identity(),
    );
    other_joint.inverse() * (palm_offset * my_joint)
}
