//! Local IK override context and the per-frame pose override it feeds.
//!
//! Links pin the local avatar's hands by writing world-space targets here; the
//! host's animation layer reads them back each frame through
//! [`hand_pose_overrides`], re-expressed in the rig frame.

use nalgebra::{Translation3, UnitQuaternion, Vector3};
use shared::{Hand, Xform};
use std::f32::consts::PI;

use crate::platform::Platform;

/// World-space hand pin targets for the local avatar. Single writer per tick:
/// whichever link currently owns that hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalIkOverrides {
    left: Option<Xform>,
    right: Option<Xform>,
}

impl LocalIkOverrides {
    pub fn set(&mut self, hand: Hand, target: Option<Xform>) {
        match hand {
            Hand::Left => self.left = target,
            Hand::Right => self.right = target,
        }
    }

    pub fn get(&self, hand: Hand) -> Option<&Xform> {
        match hand {
            Hand::Left => self.left.as_ref(),
            Hand::Right => self.right.as_ref(),
        }
    }

    pub fn clear(&mut self) {
        self.left = None;
        self.right = None;
    }
}

/// How the animation system should solve a hand this frame. The numeric values
/// are the host animation layer's hand-type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandIkType {
    RotationAndPosition = 0,
    HipsRelativeRotationAndPosition = 3,
}

/// Override for one hand: always a solve type, plus a rig-frame target pose
/// while that hand is pinned.
#[derive(Debug, Clone, Copy)]
pub struct HandOverride {
    pub ik_type: HandIkType,
    pub pose: Option<Xform>,
}

/// Both hands' overrides for one frame.
#[derive(Debug, Clone, Copy)]
pub struct PoseOverrides {
    pub left: HandOverride,
    pub right: HandOverride,
}

/// Computes the per-frame animation overrides from the pin targets.
///
/// The rig frame is the avatar root rotated 180° about Y (rigs face -Z while
/// avatars face +Z). Hands with a valid controller pose solve full rotation and
/// position; untracked hands fall back to hips-relative solving.
pub fn hand_pose_overrides(
    overrides: &LocalIkOverrides,
    platform: &dyn Platform,
) -> Option<PoseOverrides> {
    let root = platform.avatar_root(platform.local_avatar())?;
    let rig_frame = Xform::from_parts(
        Translation3::from(root.translation.vector),
        root.rotation * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), PI),
    );
    let rig_inverse = rig_frame.inverse();

    let for_hand = |hand: Hand| HandOverride {
        ik_type: if platform.hand_pose_valid(hand) {
            HandIkType::RotationAndPosition
        } else {
            HandIkType::HipsRelativeRotationAndPosition
        },
        pose: overrides.get(hand).map(|target| rig_inverse * target),
    };

    Some(PoseOverrides {
        left: for_hand(Hand::Left),
        right: for_hand(Hand::Right),
    })
}
