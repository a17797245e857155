//! JSON wire format for grab coordination messages.
//!
//! # Model
//! One message shape covers all three kinds:
//!
//! ```json
//! {"type": "GRAB", "receiver": 7, "grabbingJoint": "RightHand",
//!  "grabbedJoint": "LeftHand", "relXform": {"rot": {"x": 0.0, "y": 0.0, "z": 0.0,
//!  "w": 1.0}, "pos": {"x": 0.0, "y": 0.0, "z": 0.0}}, "initiator": true}
//! ```
//!
//! Delivery is at-most-once and unordered; there is no ack/retry layer. The state
//! machine treats illegal transitions as logged no-ops, which is the only defense
//! against duplicates and reordering, so decoding must never be fatal either:
//! malformed payloads surface as `Err` and the caller drops them.
//!
//! Field names and the joint-name strings are the compatibility contract; treat
//! them like a storage format.

use crate::xform::Xform;
use nalgebra::{Quaternion, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use crate::ids::AvatarId;

/// Discriminator carried in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    #[serde(rename = "GRAB")]
    Grab,
    #[serde(rename = "RELEASE")]
    Release,
    #[serde(rename = "REJECT")]
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireQuat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Rigid transform as it travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireXform {
    pub rot: WireQuat,
    pub pos: WireVec3,
}

impl WireXform {
    pub fn to_xform(self) -> Xform {
        let rot = UnitQuaternion::from_quaternion(Quaternion::new(
            self.rot.w, self.rot.x, self.rot.y, self.rot.z,
        ));
        Xform::from_parts(Translation3::new(self.pos.x, self.pos.y, self.pos.z), rot)
    }
}

impl From<&Xform> for WireXform {
    fn from(x: &Xform) -> WireXform {
        let q = x.rotation.quaternion();
        let t = &x.translation.vector;
        WireXform {
            rot: WireQuat {
                x: q.coords.x,
                y: q.coords.y,
                z: q.coords.z,
                w: q.coords.w,
            },
            pos: WireVec3 {
                x: t.x,
                y: t.y,
                z: t.z,
            },
        }
    }
}

/// One grab coordination message.
///
/// Joint names stay as strings here; mapping them onto the allow-list happens at
/// the receiving side so an unknown joint is a dropped message, not a decode error
/// for the whole channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrabMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub receiver: AvatarId,
    #[serde(rename = "grabbingJoint")]
    pub grabbing_joint: String,
    #[serde(rename = "grabbedJoint")]
    pub grabbed_joint: String,
    #[serde(rename = "relXform")]
    pub rel_xform: WireXform,
    pub initiator: bool,
}

impl GrabMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(payload: &str) -> Result<GrabMessage, serde_json::Error> {
        serde_json::from_str(payload)
    }
}
