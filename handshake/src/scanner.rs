//! Per-tick snapshotting of grabbable joints on nearby avatars.
//!
//! # Model
//! - `scan()` runs once per tick and replaces the whole snapshot: every
//!   [`JointInfo`] is ephemeral and only valid until the next scan.
//! - The diff against the previous snapshot fires callbacks in a strict order:
//!   removals first (avatar left range), then additions/updates. Links react to
//!   disappearing avatars before anything else mutates this tick.
//! - Avatar iteration preserves the directory's scan order and joints follow the
//!   allow-list order, so nearest-joint ties resolve deterministically.

use std::collections::{BTreeMap, HashMap};

use nalgebra::{Point3, UnitQuaternion};
use shared::{
    is_identity, AvatarId, Hand, JointId, JointKey, Xform, CONTROLLER_IDENTITY_EPS,
    GRABBABLE_JOINTS, LIMB_JOINTS, PALM_Y_OFFSET_FACTOR, PALM_Z_OFFSET_FACTOR,
};

use crate::platform::Platform;

/// World-space pose snapshot for one joint on one avatar.
#[derive(Debug, Clone, Copy)]
pub struct JointInfo {
    pub joint: JointId,
    pub joint_index: usize,
    /// World-space skeletal joint pose.
    pub joint_pose: Xform,
    /// World-space tracked controller pose; equals `joint_pose` when the
    /// controller is untracked or the joint is not a hand.
    pub controller_pose: Xform,
    pub controller_valid: bool,
    /// World-space palm position, pulled toward the handshake meeting point by
    /// the fixed offset factors. Equals the joint position for non-hands.
    pub palm_pos: Point3<f32>,
    pub palm_rot: UnitQuaternion<f32>,
}

/// All grabbable joints of one avatar, latest scan only.
#[derive(Debug, Clone, Default)]
pub struct AvatarSnapshot {
    pub joints: BTreeMap<JointId, JointInfo>,
}

type ScanCallback = Box<dyn FnMut(AvatarId)>;

/// Snapshots a fixed allow-list of joints for every avatar within range and
/// diffs against the previous tick.
pub struct GrabbableJointScanner {
    local_id: AvatarId,
    allow_list: &'static [JointId],
    order: Vec<AvatarId>,
    snapshots: HashMap<AvatarId, AvatarSnapshot>,
    on_added: Option<ScanCallback>,
    on_updated: Option<ScanCallback>,
    on_removed: Option<ScanCallback>,
}

impl GrabbableJointScanner {
    pub fn new(local_id: AvatarId, allow_limb_grabbing: bool) -> GrabbableJointScanner {
        GrabbableJointScanner {
            local_id,
            allow_list: if allow_limb_grabbing {
                LIMB_JOINTS
            } else {
                GRABBABLE_JOINTS
            },
            order: Vec::new(),
            snapshots: HashMap::new(),
            on_added: None,
            on_updated: None,
            on_removed: None,
        }
    }

    pub fn on_avatar_added(&mut self, cb: impl FnMut(AvatarId) + 'static) {
        self.on_added = Some(Box::new(cb));
    }

    pub fn on_avatar_updated(&mut self, cb: impl FnMut(AvatarId) + 'static) {
        self.on_updated = Some(Box::new(cb));
    }

    pub fn on_avatar_removed(&mut self, cb: impl FnMut(AvatarId) + 'static) {
        self.on_removed = Some(Box::new(cb));
    }

    /// Replaces the snapshot with the current world state and fires diff
    /// callbacks: removals first, then additions/updates in scan order.
    pub fn scan(&mut self, platform: &dyn Platform, radius: f32) {
        let Some(local_root) = platform.avatar_root(self.local_id) else {
            log::error!("scan: local avatar {} has no root pose", self.local_id);
            return;
        };
        let center = Point3::from(local_root.translation.vector);

        let mut ids = platform.avatars_in_range(center, radius);
        if !ids.contains(&self.local_id) {
            ids.insert(0, self.local_id);
        }

        let mut next_order = Vec::with_capacity(ids.len());
        let mut next = HashMap::with_capacity(ids.len());
        for id in ids {
            if next.contains_key(&id) {
                continue;
            }
            if let Some(snapshot) = self.snapshot_avatar(platform, id) {
                next_order.push(id);
                next.insert(id, snapshot);
            }
        }

        // Removals before additions/updates.
        for id in self.order.clone() {
            if !next.contains_key(&id) {
                if let Some(cb) = self.on_removed.as_mut() {
                    cb(id);
                }
            }
        }
        for &id in &next_order {
            let cb = if self.snapshots.contains_key(&id) {
                self.on_updated.as_mut()
            } else {
                self.on_added.as_mut()
            };
            if let Some(cb) = cb {
                cb(id);
            }
        }

        self.order = next_order;
        self.snapshots = next;
    }

    fn snapshot_avatar(&self, platform: &dyn Platform, id: AvatarId) -> Option<AvatarSnapshot> {
        let root = platform.avatar_root(id)?;
        let mut joints = BTreeMap::new();

        for &joint in self.allow_list {
            // Joints missing from the rig are omitted, not zeroed.
            let Some(joint_index) = platform.joint_index(id, joint) else {
                continue;
            };
            let Some(local_pose) = platform.joint_pose_in_avatar_frame(id, joint_index) else {
                continue;
            };
            let joint_pose = root * local_pose;

            let mut info = JointInfo {
                joint,
                joint_index,
                joint_pose,
                controller_pose: joint_pose,
                controller_valid: false,
                palm_pos: Point3::from(joint_pose.translation.vector),
                palm_rot: joint_pose.rotation,
            };

            if let Some(hand) = joint.as_hand() {
                if let (Some(palm_pos), Some(palm_rot)) = (
                    platform.palm_position(id, hand),
                    platform.palm_rotation(id, hand),
                ) {
                    // Pull the palm toward the handshake meeting point in the
                    // hand-joint frame, then back out to world space.
                    let mut local_palm = joint_pose.inverse_transform_point(&palm_pos);
                    local_palm.y *= PALM_Y_OFFSET_FACTOR;
                    local_palm.z *= PALM_Z_OFFSET_FACTOR;
                    info.palm_pos = joint_pose.transform_point(&local_palm);
                    info.palm_rot = palm_rot;
                }

                if let Some(local_controller) = platform.controller_pose_in_avatar_frame(id, hand)
                {
                    // An identity matrix means the controller is not tracking.
                    if !is_identity(&local_controller, CONTROLLER_IDENTITY_EPS) {
                        info.controller_pose = root * local_controller;
                        info.controller_valid = true;
                    }
                }
            }

            joints.insert(joint, info);
        }

        Some(AvatarSnapshot { joints })
    }

    /// Closest joint of any *other* avatar strictly within `grab_distance` of the
    /// local hand's joint position. First strictly-smaller distance wins, in scan
    /// order.
    pub fn find_grabbable_joint(&self, hand: Hand, grab_distance: f32) -> Option<JointKey> {
        let my_hand = self.my_hand(hand)?;
        let my_pos = my_hand.joint_pose.translation.vector;

        let mut closest: Option<JointKey> = None;
        let mut closest_dist = f32::MAX;
        for &id in &self.order {
            if id == self.local_id {
                continue;
            }
            let Some(snapshot) = self.snapshots.get(&id) else {
                continue;
            };
            for (&joint, info) in &snapshot.joints {
                let dist = (info.joint_pose.translation.vector - my_pos).norm();
                if dist < grab_distance && dist < closest_dist {
                    closest = Some(JointKey::new(id, joint));
                    closest_dist = dist;
                }
            }
        }
        closest
    }

    /// Direct snapshot lookup. `None` means the key is stale this tick; callers
    /// must tolerate that.
    pub fn joint_info(&self, key: &JointKey) -> Option<&JointInfo> {
        self.snapshots.get(&key.avatar_id)?.joints.get(&key.joint)
    }

    /// The local avatar's own hand, if it survived the latest scan.
    pub fn my_hand(&self, hand: Hand) -> Option<&JointInfo> {
        self.joint_info(&JointKey::new(self.local_id, hand.joint()))
    }

    pub fn local_id(&self) -> AvatarId {
        self.local_id
    }

    /// Fires the removal callback for every avatar still in the snapshot and
    /// clears it. Used at teardown.
    pub fn destroy(&mut self) {
        for id in std::mem::take(&mut self.order) {
            if let Some(cb) = self.on_removed.as_mut() {
                cb(id);
            }
        }
        self.snapshots.clear();
    }
}
