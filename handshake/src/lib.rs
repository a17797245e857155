//! Symmetric hand-grab coordination between avatars in a shared space.
//!
//! Each machine simulates only its own avatar and observes the rest, so a grab
//! is a small distributed agreement: a per-joint-pair state machine on every
//! side, driven by local input and ticks plus asynchronous Grab/Release/Reject
//! messages. See [`link`] for the state machine, [`scanner`] for the per-tick
//! pose snapshot and [`system`] for the host-facing wiring.

pub mod config;
pub mod context;
pub mod haptics;
pub mod ik;
pub mod input;
pub mod link;
pub mod platform;
pub mod protocol;
pub mod registry;
pub mod scanner;
pub mod sound;
pub mod system;

pub use config::GrabConfig;
pub use context::{DispatcherFlags, GrabContext};
pub use haptics::{HandFeedback, HapticBuddy};
pub use ik::{hand_pose_overrides, HandIkType, HandOverride, LocalIkOverrides, PoseOverrides};
pub use link::{GrabLink, LinkState};
pub use platform::{InjectorId, InjectorOptions, Platform, SoundResource};
pub use registry::GrabLinkRegistry;
pub use scanner::{AvatarSnapshot, GrabbableJointScanner, JointInfo};
pub use sound::SoundBuddy;
pub use system::{HandshakeSystem, CLAP_SOUND_URL};
