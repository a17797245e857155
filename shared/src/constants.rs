/// Default maximum distance between the local hand joint and a candidate joint
/// for a grab to start (meters).
pub const DEFAULT_GRAB_DISTANCE: f32 = 0.2;

/// Default pin distance beyond which an engaged link aborts with a Reject (meters).
pub const DEFAULT_REJECT_DISTANCE: f32 = 0.5;

/// Radius around the local avatar inside which other avatars are scanned (meters).
pub const DEFAULT_SCAN_RADIUS: f32 = 5.0;

/// A tracked controller matrix whose rotation and translation are both within this
/// epsilon of identity is treated as "not tracking"; the joint pose is used instead.
pub const CONTROLLER_IDENTITY_EPS: f32 = 0.01;

/// Vertical scale applied to the palm position in the hand-joint frame so grabbed
/// palms meet instead of overlapping.
pub const PALM_Y_OFFSET_FACTOR: f32 = 0.8;

/// Forward scale applied to the palm position in the hand-joint frame.
pub const PALM_Z_OFFSET_FACTOR: f32 = 0.4;

/// Pub/sub channel carrying grab coordination messages between avatars.
pub const HANDSHAKE_CHANNEL: &str = "Handshake";

/// Pub/sub channel used to suppress the default per-hand grab input while a hand
/// is engaged in a link. Payload is one of "left", "right", "both", "none".
pub const HAND_DISABLER_CHANNEL: &str = "Hand-Disabler";

/// Strength of the one strong haptic pulse fired when continuous feedback starts.
pub const HAPTIC_PULSE_FIRST_STRENGTH: f32 = 1.0;

/// Duration of the starting haptic pulse (milliseconds).
pub const HAPTIC_PULSE_FIRST_DURATION_MS: f32 = 16.0;

/// Tracked two-point distance must change by this much (divided by the frequency
/// scale) before another continuous pulse fires (meters).
pub const HAPTIC_PULSE_DISTANCE: f32 = 0.01;

/// Strength of each continuous haptic pulse.
pub const HAPTIC_PULSE_MAX_STRENGTH: f32 = 0.5;

/// Strength of the single pulse fired on every link state transition.
pub const HAPTIC_PULSE_STRENGTH: f32 = 1.0;

/// Duration of transition and continuous pulses (milliseconds).
pub const HAPTIC_PULSE_DURATION_MS: f32 = 1.0;

/// Reject-proximity haptics frequency scale at zero separation.
pub const REJECT_HAPTIC_MIN_FREQUENCY: f32 = 0.5;

/// Reject-proximity haptics frequency scale at the reject distance.
pub const REJECT_HAPTIC_MAX_FREQUENCY: f32 = 3.0;
