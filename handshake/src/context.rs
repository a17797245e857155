//! Shared per-call context handed to link operations.

use shared::{AvatarId, Hand, HAND_DISABLER_CHANNEL};

use crate::config::GrabConfig;
use crate::haptics::HandFeedback;
use crate::ik::LocalIkOverrides;
use crate::platform::Platform;
use crate::scanner::GrabbableJointScanner;
use crate::sound::SoundBuddy;

/// Arbitration for the default per-hand grab input. A hand engaged in a link
/// suppresses its own default handling; the channel payload always describes
/// the full set of currently suppressed hands so both hands' links can share it.
#[derive(Debug, Clone, Copy)]
pub struct DispatcherFlags {
    pub left_enabled: bool,
    pub right_enabled: bool,
}

impl DispatcherFlags {
    pub fn new() -> DispatcherFlags {
        DispatcherFlags {
            left_enabled: true,
            right_enabled: true,
        }
    }

    /// Suppress default input for `hand`, announcing the combined suppression set.
    pub fn disable(&mut self, platform: &dyn Platform, hand: Hand) {
        match hand {
            Hand::Left => {
                let payload = if self.right_enabled { "left" } else { "both" };
                platform.send_message(HAND_DISABLER_CHANNEL, payload);
                self.left_enabled = false;
            }
            Hand::Right => {
                let payload = if self.left_enabled { "right" } else { "both" };
                platform.send_message(HAND_DISABLER_CHANNEL, payload);
                self.right_enabled = false;
            }
        }
    }

    /// Restore default input for `hand`, announcing what remains suppressed.
    pub fn enable(&mut self, platform: &dyn Platform, hand: Hand) {
        match hand {
            Hand::Left => {
                let payload = if self.right_enabled { "none" } else { "right" };
                platform.send_message(HAND_DISABLER_CHANNEL, payload);
                self.left_enabled = true;
            }
            Hand::Right => {
                let payload = if self.left_enabled { "none" } else { "left" };
                platform.send_message(HAND_DISABLER_CHANNEL, payload);
                self.right_enabled = true;
            }
        }
    }
}

impl Default for DispatcherFlags {
    fn default() -> Self {
        DispatcherFlags::new()
    }
}

/// Borrowed view over everything a link operation may touch. Built fresh for
/// every entry point (tick, input event, inbound message), mirroring the
/// single-threaded cooperative model: no state outlives the call except what
/// lives in the owning system.
pub struct GrabContext<'a> {
    pub platform: &'a dyn Platform,
    pub scanner: &'a GrabbableJointScanner,
    pub config: &'a GrabConfig,
    pub overrides: &'a mut LocalIkOverrides,
    pub dispatch: &'a mut DispatcherFlags,
    pub haptics: &'a mut HandFeedback,
    pub clap: &'a mut SoundBuddy,
}

impl GrabContext<'_> {
    pub fn local_avatar(&self) -> AvatarId {
        self.platform.local_avatar()
    }

    pub fn is_local(&self, avatar_id: AvatarId) -> bool {
        avatar_id == self.platform.local_avatar()
    }
}
