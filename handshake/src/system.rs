//! Top-level wiring: one [`HandshakeSystem`] per machine.
//!
//! The host owns the frame loop and the pub/sub subscription; this type owns
//! every piece of grab state. Control flow per frame: `update(dt)` scans, then
//! drives all live links. Input edges and inbound messages may arrive between
//! frames and are applied synchronously, which keeps each transition atomic
//! with respect to the next tick.

use shared::{AvatarId, Hand, HANDSHAKE_CHANNEL};

use crate::config::GrabConfig;
use crate::context::{DispatcherFlags, GrabContext};
use crate::haptics::HandFeedback;
use crate::ik::{hand_pose_overrides, LocalIkOverrides, PoseOverrides};
use crate::input::HandTriggers;
use crate::platform::{Platform, SoundResource};
use crate::protocol::dispatch_message;
use crate::registry::GrabLinkRegistry;
use crate::scanner::GrabbableJointScanner;
use crate::sound::SoundBuddy;

/// Clip played when a grab latches.
pub const CLAP_SOUND_URL: &str = "sounds/slap.wav";

pub struct HandshakeSystem {
    config: GrabConfig,
    scanner: GrabbableJointScanner,
    registry: GrabLinkRegistry,
    overrides: LocalIkOverrides,
    dispatch: DispatcherFlags,
    haptics: HandFeedback,
    clap: SoundBuddy,
    triggers: HandTriggers,
}

impl HandshakeSystem {
    pub fn new(local_id: AvatarId, config: GrabConfig, clap: SoundResource) -> HandshakeSystem {
        let mut scanner = GrabbableJointScanner::new(local_id, config.allow_limb_grabbing);
        scanner.on_avatar_added(|id| log::debug!("avatar {id} entered grab range"));
        scanner.on_avatar_removed(|id| log::debug!("avatar {id} left grab range"));

        HandshakeSystem {
            config,
            scanner,
            registry: GrabLinkRegistry::new(),
            overrides: LocalIkOverrides::default(),
            dispatch: DispatcherFlags::new(),
            haptics: HandFeedback::new(),
            clap: SoundBuddy::new(clap),
            triggers: HandTriggers::new(),
        }
    }

    pub fn with_defaults(local_id: AvatarId) -> HandshakeSystem {
        HandshakeSystem::new(
            local_id,
            GrabConfig::default(),
            SoundResource::new(CLAP_SOUND_URL),
        )
    }

    /// Subscribe to the coordination channel. Call once before the first tick.
    pub fn start(&mut self, platform: &dyn Platform) {
        platform.subscribe(HANDSHAKE_CHANNEL);
        log::info!(
            "handshake system up for avatar {}",
            self.scanner.local_id()
        );
    }

    /// Per-frame drive: refresh the joint snapshot, then run every live link.
    pub fn update(&mut self, platform: &dyn Platform, dt: f32) {
        self.scanner.scan(platform, self.config.scan_radius);
        let (mut ctx, registry, _) = self.parts(platform);
        registry.process(&mut ctx, dt);
    }

    /// Trigger edge from one of the two physical input actions.
    pub fn on_trigger(&mut self, platform: &dyn Platform, hand: Hand, pressed: bool) {
        let (mut ctx, registry, triggers) = self.parts(platform);
        triggers.on_trigger(registry, &mut ctx, hand, pressed);
    }

    /// Raw payload from the coordination channel.
    pub fn handle_message(&mut self, platform: &dyn Platform, sender: AvatarId, payload: &str) {
        let (mut ctx, registry, _) = self.parts(platform);
        dispatch_message(registry, &mut ctx, sender, payload);
    }

    /// Hand IK overrides for the host's per-frame pose callback.
    pub fn pose_overrides(&self, platform: &dyn Platform) -> Option<PoseOverrides> {
        hand_pose_overrides(&self.overrides, platform)
    }

    /// Unsubscribe, restore normal input dispatch and drop all pins. The system
    /// can be restarted with [`HandshakeSystem::start`].
    pub fn shutdown(&mut self, platform: &dyn Platform) {
        platform.unsubscribe(HANDSHAKE_CHANNEL);
        if !self.dispatch.left_enabled {
            self.dispatch.enable(platform, Hand::Left);
        }
        if !self.dispatch.right_enabled {
            self.dispatch.enable(platform, Hand::Right);
        }
        self.overrides.clear();
        self.scanner.destroy();
        log::info!(
            "handshake system down for avatar {}",
            self.scanner.local_id()
        );
    }

    pub fn config(&self) -> &GrabConfig {
        &self.config
    }

    /// Distances are runtime-tunable; the allow-list flag is not (it is baked
    /// into the scanner at construction).
    pub fn set_distances(&mut self, grab_distance: f32, reject_distance: f32) {
        self.config.grab_distance = grab_distance;
        self.config.reject_distance = reject_distance;
    }

    pub fn registry(&self) -> &GrabLinkRegistry {
        &self.registry
    }

    pub fn scanner(&self) -> &GrabbableJointScanner {
        &self.scanner
    }

    pub fn overrides(&self) -> &LocalIkOverrides {
        &self.overrides
    }

    fn parts<'a>(
        &'a mut self,
        platform: &'a dyn Platform,
    ) -> (GrabContext<'a>, &'a mut GrabLinkRegistry, &'a mut HandTriggers) {
        let HandshakeSystem {
            config,
            scanner,
            registry,
            overrides,
            dispatch,
            haptics,
            clap,
            triggers,
        } = self;
        (
            GrabContext {
                platform,
                scanner,
                config,
                overrides,
                dispatch,
                haptics,
                clap,
            },
            registry,
            triggers,
        )
    }
}
