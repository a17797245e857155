//! The per-pair grab state machine.
//!
//! # Model
//! One `GrabLink` tracks the interaction between a fixed (primary, secondary)
//! joint pair for its whole lifetime. The primary key is the joint this machine
//! acts for (the local avatar's side); the secondary is the partner. Links are
//! created lazily and never destroyed; they decay back to [`LinkState::Alone`]
//! and are reused.
//!
//! # States and roles
//! - `Alone`: at rest, no pins held.
//! - `Leader`: we initiated and wait for the peer's ack; only the *peer's* joint
//!   is pinned, following our controller through `rel_xform⁻¹`.
//! - `Follower`: the peer initiated and we acked; our hand is pinned fully
//!   toward the peer's controller through `rel_xform`.
//! - `Peer`: mutually confirmed; both sides blend halfway.
//! - `Reject`: transient abort, never a resting state. The first `process`
//!   tick drops straight back to `Alone`.
//!
//! Every externally-driven transition with no legal edge from the current state
//! is a logged no-op. Messages arrive at-most-once and unordered, so this is
//! the only defense against duplicates and reordering, and it must stay
//! non-fatal.

use shared::{
    delta_offset, hand_delta_offset, tween, GrabMessage, JointKey, MessageKind, Xform,
    HANDSHAKE_CHANNEL, HAPTIC_PULSE_DURATION_MS, HAPTIC_PULSE_STRENGTH,
    REJECT_HAPTIC_MAX_FREQUENCY, REJECT_HAPTIC_MIN_FREQUENCY,
};

use crate::context::GrabContext;
use crate::platform::InjectorOptions;
use crate::scanner::JointInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Alone,
    Leader,
    Follower,
    Peer,
    Reject,
}

impl LinkState {
    fn name(self) -> &'static str {
        match self {
            LinkState::Alone => "alone",
            LinkState::Leader => "leader",
            LinkState::Follower => "follower",
            LinkState::Peer => "peer",
            LinkState::Reject => "reject",
        }
    }
}

pub struct GrabLink {
    primary: JointKey,
    secondary: JointKey,
    state: LinkState,
    rel_xform: Xform,
    time_in_state: f32,
    initiator: bool,
}

impl GrabLink {
    pub fn new(primary: JointKey, secondary: JointKey) -> GrabLink {
        GrabLink {
            primary,
            secondary,
            state: LinkState::Alone,
            rel_xform: Xform::identity(),
            time_in_state: 0.0,
            initiator: false,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn primary(&self) -> JointKey {
        self.primary
    }

    pub fn secondary(&self) -> JointKey {
        self.secondary
    }

    pub fn rel_xform(&self) -> &Xform {
        &self.rel_xform
    }

    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    pub fn is_initiator(&self) -> bool {
        self.initiator
    }

    /// True while this link holds any pin or is mid-handshake.
    pub fn is_engaged(&self) -> bool {
        self.state != LinkState::Alone
    }

    //
    // externally-driven transitions
    //

    /// Local trigger pulled while this pair is in range.
    pub fn trigger_press(&mut self, ctx: &mut GrabContext) {
        match self.state {
            LinkState::Alone => {
                self.initiator = true;
                self.change_state(ctx, LinkState::Leader);
            }
            LinkState::Follower => self.change_state(ctx, LinkState::Peer),
            state => self.illegal("trigger_press", state),
        }
    }

    /// Local trigger released.
    pub fn trigger_release(&mut self, ctx: &mut GrabContext) {
        match self.state {
            LinkState::Leader => self.change_state(ctx, LinkState::Alone),
            LinkState::Peer => self.change_state(ctx, LinkState::Follower),
            state => self.illegal("trigger_release", state),
        }
    }

    /// Inbound Grab from the peer. `rel_xform` is already inverted into this
    /// side's framing by the message handler.
    pub fn received_grab(&mut self, ctx: &mut GrabContext, rel_xform: Xform) {
        match self.state {
            LinkState::Alone => {
                self.rel_xform = rel_xform;
                self.initiator = false;
                self.change_state(ctx, LinkState::Follower);
            }
            // Keep the offset we computed at press time; both sides captured the
            // same instant so either is consistent.
            LinkState::Leader => self.change_state(ctx, LinkState::Peer),
            state => self.illegal("received_grab", state),
        }
    }

    /// Inbound Release from the peer.
    pub fn received_release(&mut self, ctx: &mut GrabContext) {
        match self.state {
            LinkState::Follower => self.change_state(ctx, LinkState::Alone),
            LinkState::Peer => self.change_state(ctx, LinkState::Leader),
            state => self.illegal("received_release", state),
        }
    }

    /// Abort: either the local distance watchdog fired or the peer sent Reject.
    pub fn reject(&mut self, ctx: &mut GrabContext) {
        match self.state {
            LinkState::Follower | LinkState::Peer | LinkState::Leader => {
                self.change_state(ctx, LinkState::Reject);
            }
            state => self.illegal("reject", state),
        }
    }

    /// Per-tick drive. Runs after the scanner refreshed the snapshot.
    pub fn process(&mut self, ctx: &mut GrabContext, dt: f32) {
        self.time_in_state += dt;
        match self.state {
            LinkState::Alone => {}
            LinkState::Follower => self.follower_process(ctx),
            LinkState::Peer => self.peer_process(ctx),
            LinkState::Leader => self.leader_process(ctx),
            // Pure cleanup pass-through; settles the same tick.
            LinkState::Reject => self.change_state(ctx, LinkState::Alone),
        }
    }

    fn illegal(&self, event: &str, state: LinkState) {
        log::warn!(
            "GrabLink({:?} -> {:?}): {} has no edge from {}, ignoring",
            self.primary,
            self.secondary,
            event,
            state.name()
        );
    }

    fn change_state(&mut self, ctx: &mut GrabContext, next: LinkState) {
        if next == self.state {
            return;
        }
        log::debug!(
            "GrabLink({:?} -> {:?}): {} -> {}",
            self.primary,
            self.secondary,
            self.state.name(),
            next.name()
        );

        self.exit_state(ctx);
        let prev = self.state;
        self.state = next;
        self.time_in_state = 0.0;
        self.enter_state(ctx, prev);
    }

    fn enter_state(&mut self, ctx: &mut GrabContext, prev: LinkState) {
        match self.state {
            LinkState::Alone => self.alone_enter(ctx, prev),
            LinkState::Leader => self.leader_enter(ctx, prev),
            LinkState::Follower => self.follower_enter(ctx, prev),
            LinkState::Peer => self.peer_enter(ctx, prev),
            LinkState::Reject => self.reject_enter(ctx, prev),
        }
    }

    fn exit_state(&mut self, ctx: &mut GrabContext) {
        match self.state {
            LinkState::Alone => ctx.platform.request_show_hand_controllers(),
            LinkState::Leader | LinkState::Follower | LinkState::Peer => {
                self.stop_continuous_haptics(ctx);
            }
            LinkState::Reject => {}
        }
    }

    //
    // alone
    //

    fn alone_enter(&mut self, ctx: &mut GrabContext, prev: LinkState) {
        ctx.platform.request_hide_hand_controllers();
        match prev {
            LinkState::Leader => {
                self.transition_pulse(ctx);
                self.clear_pin(ctx, self.secondary);
                self.send(ctx, MessageKind::Release);
                self.enable_dispatcher(ctx);
            }
            LinkState::Follower => {
                self.transition_pulse(ctx);
                self.clear_pin(ctx, self.primary);
                self.enable_dispatcher(ctx);
            }
            // Every path into Reject had suppressed default input for this hand.
            LinkState::Reject => self.enable_dispatcher(ctx),
            state => self.illegal("alone_enter", state),
        }
    }

    //
    // follower
    //

    fn follower_enter(&mut self, ctx: &mut GrabContext, prev: LinkState) {
        self.start_continuous_haptics(ctx);
        match prev {
            LinkState::Peer => {
                self.transition_pulse(ctx);
                self.clear_pin(ctx, self.secondary);
                self.send(ctx, MessageKind::Release);
            }
            LinkState::Alone => {
                self.transition_pulse(ctx);
                self.disable_dispatcher(ctx);
            }
            state => self.illegal("follower_enter", state),
        }
    }

    fn follower_process(&mut self, ctx: &mut GrabContext) {
        let Some((my, other)) = self.joint_infos(ctx) else {
            return;
        };
        let my_xform = my.controller_pose;
        let other_xform = other.controller_pose;

        // Our hand follows the peer's controller completely.
        let blend_factor = 1.0;
        let target = tween(&my_xform, &(other_xform * self.rel_xform), blend_factor);
        self.pin_joint(ctx, self.primary, &my, &target);

        self.update_reject_haptics(ctx, &my, &other);

        // The rejection metric is how far the pin is dragging our hand.
        let distance = (my_xform.translation.vector - target.translation.vector).norm();
        if distance > ctx.config.reject_distance {
            self.send(ctx, MessageKind::Reject);
            self.reject(ctx);
        }
    }

    //
    // peer
    //

    fn peer_enter(&mut self, ctx: &mut GrabContext, prev: LinkState) {
        match prev {
            LinkState::Leader => self.transition_pulse(ctx),
            LinkState::Follower => {
                self.transition_pulse(ctx);
                self.send(ctx, MessageKind::Grab);
            }
            state => self.illegal("peer_enter", state),
        }
        self.start_continuous_haptics(ctx);
    }

    fn peer_process(&mut self, ctx: &mut GrabContext) {
        let Some((my, other)) = self.joint_infos(ctx) else {
            return;
        };
        let my_xform = my.controller_pose;
        let other_xform = other.controller_pose;

        // Mutually confirmed: both sides meet halfway.
        let blend_factor = 0.5;

        // Our hand toward their controller...
        let my_target = tween(&my_xform, &(other_xform * self.rel_xform), blend_factor);
        self.pin_joint(ctx, self.primary, &my, &my_target);

        // ...and their joint toward our controller, pinned locally so the pair
        // converges even before their own tick runs.
        let other_target = tween(
            &(my_xform * self.rel_xform.inverse()),
            &other_xform,
            blend_factor,
        );
        self.pin_joint(ctx, self.secondary, &other, &other_target);

        self.update_stress_haptics(ctx, &my, &other);

        let distance =
            (my_xform.translation.vector - my_target.translation.vector).norm();
        if distance > ctx.config.reject_distance {
            self.send(ctx, MessageKind::Reject);
            self.reject(ctx);
        }
    }

    //
    // leader
    //

    fn leader_enter(&mut self, ctx: &mut GrabContext, prev: LinkState) {
        self.start_continuous_haptics(ctx);
        match prev {
            LinkState::Alone => {
                self.play_clap(ctx);
                self.transition_pulse(ctx);
                self.disable_dispatcher(ctx);
                self.compute_rel_xform(ctx);
                self.send(ctx, MessageKind::Grab);
            }
            LinkState::Peer => {
                self.transition_pulse(ctx);
                self.clear_pin(ctx, self.primary);
            }
            state => self.illegal("leader_enter", state),
        }
    }

    fn leader_process(&mut self, ctx: &mut GrabContext) {
        let Some((my, other)) = self.joint_infos(ctx) else {
            return;
        };
        let my_xform = my.controller_pose;
        let other_xform = other.controller_pose;

        // Awaiting the peer's ack: only their joint is pinned, following our
        // controller; our own hand stays free.
        let blend_factor = 0.0;
        let other_target = tween(
            &(my_xform * self.rel_xform.inverse()),
            &other_xform,
            blend_factor,
        );
        self.pin_joint(ctx, self.secondary, &other, &other_target);

        self.update_reject_haptics(ctx, &my, &other);
    }

    //
    // reject
    //

    fn reject_enter(&mut self, ctx: &mut GrabContext, prev: LinkState) {
        match prev {
            LinkState::Follower => {
                self.transition_pulse(ctx);
                self.clear_pin(ctx, self.primary);
            }
            LinkState::Peer => {
                self.transition_pulse(ctx);
                self.clear_pin(ctx, self.secondary);
                self.clear_pin(ctx, self.primary);
            }
            LinkState::Leader => {
                self.transition_pulse(ctx);
                self.clear_pin(ctx, self.secondary);
            }
            state => self.illegal("reject_enter", state),
        }
    }

    //
    // pins
    //

    fn pin_joint(&self, ctx: &mut GrabContext, key: JointKey, info: &JointInfo, target: &Xform) {
        if ctx.is_local(key.avatar_id) {
            // The local avatar is pinned through the IK override context the
            // pose-update callback consumes; only hands are supported there.
            match key.joint.as_hand() {
                Some(hand) => ctx.overrides.set(hand, Some(*target)),
                None => log::warn!(
                    "pin_joint: {:?} is not pinnable on the local avatar",
                    key.joint
                ),
            }
        } else {
            ctx.platform.pin_joint(key.avatar_id, info.joint_index, target);
        }
    }

    fn clear_pin(&self, ctx: &mut GrabContext, key: JointKey) {
        if ctx.is_local(key.avatar_id) {
            match key.joint.as_hand() {
                Some(hand) => ctx.overrides.set(hand, None),
                None => log::warn!(
                    "clear_pin: {:?} is not pinnable on the local avatar",
                    key.joint
                ),
            }
        } else {
            match ctx.scanner.joint_info(&key) {
                Some(info) => ctx.platform.clear_pin_on_joint(key.avatar_id, info.joint_index),
                // Avatar already left the snapshot; the pin dies with it.
                None => log::warn!("clear_pin: {:?} not in the latest scan", key),
            }
        }
    }

    //
    // geometry
    //

    fn compute_rel_xform(&mut self, ctx: &GrabContext) {
        let Some((my, other)) = self.joint_infos(ctx) else {
            log::warn!(
                "compute_rel_xform: {:?}/{:?} missing from scan, keeping previous offset",
                self.primary,
                self.secondary
            );
            return;
        };
        // Hand grabbing the same-named hand is the handshake pose: meet at the
        // palms. Everything else keeps the raw joint delta.
        self.rel_xform = if my.joint.is_hand() && my.joint == other.joint {
            hand_delta_offset(
                &my.joint_pose,
                &other.joint_pose,
                my.palm_pos,
                other.palm_pos,
            )
        } else {
            delta_offset(&my.joint_pose, &other.joint_pose)
        };
    }

    fn joint_infos(&self, ctx: &GrabContext) -> Option<(JointInfo, JointInfo)> {
        let my = ctx.scanner.joint_info(&self.primary).copied()?;
        let other = ctx.scanner.joint_info(&self.secondary).copied()?;
        Some((my, other))
    }

    //
    // feedback
    //

    fn transition_pulse(&self, ctx: &mut GrabContext) {
        if let Some(side) = self.primary.joint.side() {
            ctx.platform
                .trigger_haptic_pulse(HAPTIC_PULSE_STRENGTH, HAPTIC_PULSE_DURATION_MS, side);
        }
    }

    fn start_continuous_haptics(&self, ctx: &mut GrabContext) {
        let Some(side) = self.primary.joint.side() else {
            return;
        };
        let Some((my, other)) = self.joint_infos(ctx) else {
            return;
        };
        ctx.haptics.for_side(side).start(ctx.platform, &my, &other);
    }

    fn stop_continuous_haptics(&self, ctx: &mut GrabContext) {
        if let Some(side) = self.primary.joint.side() {
            ctx.haptics.for_side(side).stop();
        }
    }

    /// Pulse density rises as the controller separation approaches the reject
    /// threshold.
    fn update_reject_haptics(&self, ctx: &mut GrabContext, my: &JointInfo, other: &JointInfo) {
        let Some(side) = self.primary.joint.side() else {
            return;
        };
        let distance = (my.controller_pose.translation.vector
            - other.controller_pose.translation.vector)
            .norm();
        let factor = (distance / ctx.config.reject_distance).clamp(0.0, 1.0);
        let frequency = REJECT_HAPTIC_MIN_FREQUENCY
            + factor * (REJECT_HAPTIC_MAX_FREQUENCY - REJECT_HAPTIC_MIN_FREQUENCY);

        let buddy = ctx.haptics.for_side(side);
        buddy.set_frequency_scale(frequency);
        buddy.update(ctx.platform, my, other);
    }

    fn update_stress_haptics(&self, ctx: &mut GrabContext, my: &JointInfo, other: &JointInfo) {
        if let Some(side) = self.primary.joint.side() {
            ctx.haptics.for_side(side).update(ctx.platform, my, other);
        }
    }

    fn play_clap(&self, ctx: &mut GrabContext) {
        let Some(info) = ctx.scanner.joint_info(&self.primary) else {
            return;
        };
        let options = InjectorOptions {
            position: nalgebra::Point3::from(info.joint_pose.translation.vector),
            looped: false,
        };
        ctx.clap.play(ctx.platform, &options);
    }

    //
    // input dispatch + messaging
    //

    fn disable_dispatcher(&self, ctx: &mut GrabContext) {
        if let Some(hand) = self.primary.joint.as_hand() {
            ctx.dispatch.disable(ctx.platform, hand);
        }
    }

    fn enable_dispatcher(&self, ctx: &mut GrabContext) {
        if let Some(hand) = self.primary.joint.as_hand() {
            ctx.dispatch.enable(ctx.platform, hand);
        }
    }

    fn send(&self, ctx: &GrabContext, kind: MessageKind) {
        let msg = GrabMessage {
            kind,
            receiver: self.secondary.avatar_id,
            grabbing_joint: self.primary.joint.as_name().to_owned(),
            grabbed_joint: self.secondary.joint.as_name().to_owned(),
            rel_xform: (&self.rel_xform).into(),
            initiator: self.initiator,
        };
        match msg.encode() {
            Ok(payload) => ctx.platform.send_message(HANDSHAKE_CHANNEL, &payload),
            Err(err) => log::error!("failed to encode {:?} message: {err}", kind),
        }
    }
}
