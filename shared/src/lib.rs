pub mod constants;
pub mod ids;
pub mod wire;
pub mod xform;

pub use constants::{
    CONTROLLER_IDENTITY_EPS, DEFAULT_GRAB_DISTANCE, DEFAULT_REJECT_DISTANCE, DEFAULT_SCAN_RADIUS,
    HANDSHAKE_CHANNEL, HAND_DISABLER_CHANNEL, HAPTIC_PULSE_DISTANCE, HAPTIC_PULSE_DURATION_MS,
    HAPTIC_PULSE_FIRST_DURATION_MS, HAPTIC_PULSE_FIRST_STRENGTH, HAPTIC_PULSE_MAX_STRENGTH,
    HAPTIC_PULSE_STRENGTH, PALM_Y_OFFSET_FACTOR, PALM_Z_OFFSET_FACTOR,
    REJECT_HAPTIC_MAX_FREQUENCY, REJECT_HAPTIC_MIN_FREQUENCY,
};
pub use ids::{AvatarId, Hand, JointId, JointKey, GRABBABLE_JOINTS, LIMB_JOINTS};
pub use wire::{GrabMessage, MessageKind, WireXform};
pub use xform::{delta_offset, hand_delta_offset, is_identity, tween, Xform};
