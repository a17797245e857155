//! Host surface the grab system runs against.
//!
//! Everything the interaction needs from the surrounding application (avatar
//! directory, rig poses, IK pins, haptics, pub/sub messaging, audio) is reached
//! through one [`Platform`] handle. The system never holds the platform; every
//! entry point borrows it for the duration of the call, so implementations are
//! free to use interior mutability for their own bookkeeping.

use nalgebra::{Point3, UnitQuaternion};
use shared::{AvatarId, Hand, JointId, Xform};

/// Handle to one playable audio resource. Loading happens elsewhere; the grab
/// system only asks whether it is ready and plays it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundResource {
    pub url: String,
}

impl SoundResource {
    pub fn new(url: impl Into<String>) -> SoundResource {
        SoundResource { url: url.into() }
    }
}

/// Identifies a live audio injector so a clip can be restarted in place instead
/// of being layered on top of itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InjectorId(pub u64);

/// Playback options for one injection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InjectorOptions {
    pub position: Point3<f32>,
    pub looped: bool,
}

/// Everything the grab system consumes from its host.
///
/// Pose accessors return `None` when the avatar or joint is unavailable this
/// frame; callers treat that as "stale this tick", never as an error.
pub trait Platform {
    /// Session id of the avatar this machine simulates.
    fn local_avatar(&self) -> AvatarId;

    /// Avatars within `radius` meters of `center`, in directory order. May or may
    /// not include the local avatar; the scanner adds it if missing.
    fn avatars_in_range(&self, center: Point3<f32>, radius: f32) -> Vec<AvatarId>;

    /// World-space root pose (orientation + position) of an avatar.
    fn avatar_root(&self, id: AvatarId) -> Option<Xform>;

    /// Skeletal index for a named joint, `None` when the rig lacks it.
    fn joint_index(&self, id: AvatarId, joint: JointId) -> Option<usize>;

    /// Joint pose in the avatar's root frame.
    fn joint_pose_in_avatar_frame(&self, id: AvatarId, index: usize) -> Option<Xform>;

    /// Tracked controller pose in the avatar's root frame. An untracked
    /// controller reads as identity; the scanner detects that and falls back to
    /// the joint pose.
    fn controller_pose_in_avatar_frame(&self, id: AvatarId, hand: Hand) -> Option<Xform>;

    /// World-space palm position for a hand.
    fn palm_position(&self, id: AvatarId, hand: Hand) -> Option<Point3<f32>>;

    /// World-space palm rotation for a hand.
    fn palm_rotation(&self, id: AvatarId, hand: Hand) -> Option<UnitQuaternion<f32>>;

    /// Whether the local controller pose for `hand` is currently valid. Drives
    /// the hand IK type in the pose override.
    fn hand_pose_valid(&self, hand: Hand) -> bool;

    /// Force a remote avatar's joint toward a world transform.
    fn pin_joint(&self, id: AvatarId, index: usize, target: &Xform);

    /// Release a previous pin on a remote avatar's joint.
    fn clear_pin_on_joint(&self, id: AvatarId, index: usize);

    /// One haptic pulse on the local controller for `hand`.
    fn trigger_haptic_pulse(&self, strength: f32, duration_ms: f32, hand: Hand);

    /// Publish `payload` on a named pub/sub channel. At-most-once, unordered.
    fn send_message(&self, channel: &str, payload: &str);

    fn subscribe(&self, channel: &str);

    fn unsubscribe(&self, channel: &str);

    /// Whether a sound resource has finished loading.
    fn sound_loaded(&self, sound: &SoundResource) -> bool;

    /// Start playing a sound; returns a handle for later restarts, or `None`
    /// when the host could not start playback.
    fn play_sound(&self, sound: &SoundResource, options: &InjectorOptions) -> Option<InjectorId>;

    /// Re-point and restart an existing injector.
    fn restart_injector(&self, injector: InjectorId, options: &InjectorOptions);

    /// Ask the HMD layer to show the hand controller models.
    fn request_show_hand_controllers(&self);

    /// Ask the HMD layer to hide the hand controller models.
    fn request_hide_hand_controllers(&self);
}
