use serde::{Deserialize, Serialize};
use shared::{DEFAULT_GRAB_DISTANCE, DEFAULT_REJECT_DISTANCE, DEFAULT_SCAN_RADIUS};

/// Tunables for the grab interaction. Hosts may adjust distances at runtime,
/// typically from a settings UI; the allow-list flag is fixed at startup
/// because it changes what the scanner snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrabConfig {
    /// Maximum joint-to-joint distance for a press to latch (meters).
    pub grab_distance: f32,
    /// Pin distance beyond which an engaged link aborts with a Reject (meters).
    pub reject_distance: f32,
    /// Avatar scan radius (meters).
    pub scan_radius: f32,
    /// When true the scanner snapshots the full limb set instead of hands only.
    pub allow_limb_grabbing: bool,
}

impl Default for GrabConfig {
    fn default() -> Self {
        GrabConfig {
            grab_distance: DEFAULT_GRAB_DISTANCE,
            reject_distance: DEFAULT_REJECT_DISTANCE,
            scan_radius: DEFAULT_SCAN_RADIUS,
            allow_limb_grabbing: false,
        }
    }
}
