//! Identifiers for avatars and grabbable joints.
//!
//! # Model
//! - `AvatarId` is the session-unique identifier the avatar directory hands out.
//! - `JointId` enumerates the fixed allow-list of skeletal points a grab may target.
//!   Joint names are part of the wire format; `as_name`/`from_name` are the canonical
//!   mapping and must stay in sync with the avatar rig naming convention.
//! - `JointKey` is a pure lookup value pairing the two; it owns nothing.

use serde::{Deserialize, Serialize};

/// Session-unique identifier for an avatar in the shared space.
pub type AvatarId = u64;

/// Left/right selector for hands, controllers and haptics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// The hand joint this side maps to.
    pub fn joint(self) -> JointId {
        match self {
            Hand::Left => JointId::LeftHand,
            Hand::Right => JointId::RightHand,
        }
    }

    pub fn other(self) -> Hand {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }
}

/// A named skeletal point on an avatar rig that a grab may target.
///
/// The numeric order is also the scan order within one avatar, which makes
/// nearest-joint tie-breaking deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JointId {
    LeftHand,
    RightHand,
    Hips,
    LeftUpLeg,
    LeftLeg,
    LeftFoot,
    RightUpLeg,
    RightLeg,
    RightFoot,
    Spine2,
    Neck,
    Head,
    LeftShoulder,
    LeftArm,
    LeftForeArm,
    RightShoulder,
    RightArm,
    RightForeArm,
}

/// Joints grabbable by default: hands only.
pub const GRABBABLE_JOINTS: &[JointId] = &[JointId::LeftHand, JointId::RightHand];

/// Extended allow-list used when limb grabbing is enabled.
pub const LIMB_JOINTS: &[JointId] = &[
    JointId::LeftHand,
    JointId::RightHand,
    JointId::Hips,
    JointId::LeftUpLeg,
    JointId::LeftLeg,
    JointId::LeftFoot,
    JointId::RightUpLeg,
    JointId::RightLeg,
    JointId::RightFoot,
    JointId::Spine2,
    JointId::Neck,
    JointId::Head,
    JointId::LeftShoulder,
    JointId::LeftArm,
    JointId::LeftForeArm,
    JointId::RightShoulder,
    JointId::RightArm,
    JointId::RightForeArm,
];

impl JointId {
    /// Rig name for this joint. These strings travel on the wire.
    pub fn as_name(self) -> &'static str {
        match self {
            JointId::LeftHand => "LeftHand",
            JointId::RightHand => "RightHand",
            JointId::Hips => "Hips",
            JointId::LeftUpLeg => "LeftUpLeg",
            JointId::LeftLeg => "LeftLeg",
            JointId::LeftFoot => "LeftFoot",
            JointId::RightUpLeg => "RightUpLeg",
            JointId::RightLeg => "RightLeg",
            JointId::RightFoot => "RightFoot",
            JointId::Spine2 => "Spine2",
            JointId::Neck => "Neck",
            JointId::Head => "Head",
            JointId::LeftShoulder => "LeftShoulder",
            JointId::LeftArm => "LeftArm",
            JointId::LeftForeArm => "LeftForeArm",
            JointId::RightShoulder => "RightShoulder",
            JointId::RightArm => "RightArm",
            JointId::RightForeArm => "RightForeArm",
        }
    }

    /// Inverse of [`JointId::as_name`]. Returns `None` for joints outside the
    /// allow-list, which callers treat as a malformed message field.
    pub fn from_name(name: &str) -> Option<JointId> {
        LIMB_JOINTS.iter().copied().find(|j| j.as_name() == name)
    }

    /// True for the two hand joints.
    pub fn is_hand(self) -> bool {
        matches!(self, JointId::LeftHand | JointId::RightHand)
    }

    /// The hand this joint is, for the two hand joints.
    pub fn as_hand(self) -> Option<Hand> {
        match self {
            JointId::LeftHand => Some(Hand::Left),
            JointId::RightHand => Some(Hand::Right),
            _ => None,
        }
    }

    /// Which hand's controller should rumble for feedback about this joint,
    /// going by the rig's Left*/Right* naming. Center-line joints have none.
    pub fn side(self) -> Option<Hand> {
        let name = self.as_name();
        if name.starts_with("Left") {
            Some(Hand::Left)
        } else if name.starts_with("Right") {
            Some(Hand::Right)
        } else {
            None
        }
    }
}

/// Lookup key for one joint on one avatar. Pure value; the joint data itself
/// lives in the scanner snapshot and may be gone by the time the key is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JointKey {
    pub avatar_id: AvatarId,
    pub joint: JointId,
}

impl JointKey {
    pub fn new(avatar_id: AvatarId, joint: JointId) -> JointKey {
        JointKey { avatar_id, joint }
    }
}
