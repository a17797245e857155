//! End-to-end grab coordination between two live systems sharing one world.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::*;
use handshake::{HandshakeSystem, LinkState};
use shared::{
    GrabMessage, Hand, JointId, JointKey, MessageKind, HANDSHAKE_CHANNEL, HAND_DISABLER_CHANNEL,
};

const DT: f32 = 0.016;

fn state(sys: &HandshakeSystem, primary: JointKey, secondary: JointKey) -> Option<LinkState> {
    sys.registry().find(primary, secondary).map(|l| l.state())
}

fn a_keys() -> (JointKey, JointKey) {
    (
        JointKey::new(1, JointId::RightHand),
        JointKey::new(2, JointId::LeftHand),
    )
}

fn b_keys() -> (JointKey, JointKey) {
    (
        JointKey::new(2, JointId::LeftHand),
        JointKey::new(1, JointId::RightHand),
    )
}

#[test]
fn full_grab_scenario_walks_both_machines_through_every_role() {
    let (_world, a_plat, b_plat) = two_avatar_setup();
    let mut a = HandshakeSystem::with_defaults(1);
    let mut b = HandshakeSystem::with_defaults(2);
    a.start(&a_plat);
    b.start(&b_plat);
    assert_eq!(a_plat.subscriptions.borrow().as_slice(), [HANDSHAKE_CHANNEL]);

    a.update(&a_plat, DT);
    b.update(&b_plat, DT);

    let (a_primary, a_secondary) = a_keys();
    let (b_primary, b_secondary) = b_keys();

    assert!(a.scanner().my_hand(Hand::Right).is_some());

    // A pulls the trigger near B's left hand: A leads and broadcasts one Grab.
    a.on_trigger(&a_plat, Hand::Right, true);
    assert_eq!(state(&a, a_primary, a_secondary), Some(LinkState::Leader));
    assert!(a.registry().find(a_primary, a_secondary).unwrap().is_engaged());
    let payloads = pump(&a_plat, 1, &mut b, &b_plat);
    assert_eq!(payloads.len(), 1);
    let msg = GrabMessage::decode(&payloads[0]).unwrap();
    assert_eq!(msg.kind, MessageKind::Grab);
    assert_eq!(msg.receiver, 2);
    assert_eq!(msg.grabbing_joint, "RightHand");
    assert_eq!(msg.grabbed_joint, "LeftHand");
    assert!(msg.initiator);

    // B acked into Follower holding the inverse of A's offset.
    assert_eq!(state(&b, b_primary, b_secondary), Some(LinkState::Follower));
    let rel_a = *a.registry().find(a_primary, a_secondary).unwrap().rel_xform();
    let rel_b = *b.registry().find(b_primary, b_secondary).unwrap().rel_xform();
    assert_iso_close(&rel_b, &rel_a.inverse());
    // At the grab instant the offset reproduces the leader's controller from
    // the follower's.
    let a_ctrl = a.scanner().my_hand(Hand::Right).unwrap().controller_pose;
    let b_ctrl = a.scanner().joint_info(&a_secondary).unwrap().controller_pose;
    assert_iso_close(&(b_ctrl * rel_a), &a_ctrl);
    assert!(!b.registry().find(b_primary, b_secondary).unwrap().is_initiator());

    // While A leads, ticking A pins B's grabbed joint near its capture pose.
    a.update(&a_plat, DT);
    let pinned = a_plat.pins.borrow()[&(2, JointId::LeftHand as usize)];
    assert_iso_close(&pinned, &iso([0.3, 1.0, 0.0]));

    // Ticking B as Follower pins B's own hand through the IK override context.
    b.update(&b_plat, DT);
    let own_pin = *b.overrides().get(Hand::Left).unwrap();
    assert_iso_close(&own_pin, &iso([0.3, 1.0, 0.0]));

    // B squeezes back: both sides settle into Peer.
    b.on_trigger(&b_plat, Hand::Left, true);
    assert_eq!(state(&b, b_primary, b_secondary), Some(LinkState::Peer));
    let payloads = pump(&b_plat, 2, &mut a, &a_plat);
    assert_eq!(payloads.len(), 1);
    let ack = GrabMessage::decode(&payloads[0]).unwrap();
    assert_eq!(ack.kind, MessageKind::Grab);
    assert_eq!(ack.receiver, 1);
    assert!(!ack.initiator);
    assert_eq!(state(&a, a_primary, a_secondary), Some(LinkState::Peer));

    a.update(&a_plat, DT);
    b.update(&b_plat, DT);

    // A lets go first: A demotes to Follower, B is promoted to Leader and its
    // own hand pin drops.
    a.on_trigger(&a_plat, Hand::Right, false);
    assert_eq!(state(&a, a_primary, a_secondary), Some(LinkState::Follower));
    let payloads = pump(&a_plat, 1, &mut b, &b_plat);
    assert_eq!(
        GrabMessage::decode(&payloads[0]).unwrap().kind,
        MessageKind::Release
    );
    assert_eq!(state(&b, b_primary, b_secondary), Some(LinkState::Leader));
    assert!(b.overrides().get(Hand::Left).is_none());

    // B lets go: both machines decay back to Alone with nothing pinned anywhere.
    b.on_trigger(&b_plat, Hand::Left, false);
    assert_eq!(state(&b, b_primary, b_secondary), Some(LinkState::Alone));
    pump(&b_plat, 2, &mut a, &a_plat);
    assert_eq!(state(&a, a_primary, a_secondary), Some(LinkState::Alone));
    assert!(a.overrides().get(Hand::Right).is_none());
    assert!(b.overrides().get(Hand::Left).is_none());
    assert!(a_plat.pins.borrow().is_empty());
    assert!(b_plat.pins.borrow().is_empty());
    assert!(a.registry().iter().all(|link| !link.is_engaged()));
    assert!(b.registry().iter().all(|link| !link.is_engaged()));
}

#[test]
fn distances_are_runtime_tunable() {
    let mut a = HandshakeSystem::with_defaults(1);
    assert_eq!(a.config().grab_distance, 0.2);

    a.set_distances(0.35, 0.9);
    assert_eq!(a.config().grab_distance, 0.35);
    assert_eq!(a.config().reject_distance, 0.9);
}

#[test]
fn press_out_of_range_creates_no_link_and_sends_nothing() {
    let world = Rc::new(RefCell::new(WorldState::default()));
    world
        .borrow_mut()
        .avatars
        .insert(1, FakeAvatar::standing_at([0.0, 0.0, 0.0]));
    world
        .borrow_mut()
        .avatars
        .insert(2, FakeAvatar::standing_at([3.0, 0.0, 0.0]));
    let a_plat = FakePlatform::new(1, world);
    let mut a = HandshakeSystem::with_defaults(1);
    a.start(&a_plat);
    a.update(&a_plat, DT);

    a.on_trigger(&a_plat, Hand::Right, true);

    assert!(a.registry().is_empty());
    assert!(a_plat.peek_channel(HANDSHAKE_CHANNEL).is_empty());
}

#[test]
fn duplicate_grab_is_a_logged_no_op() {
    let (_world, a_plat, b_plat) = two_avatar_setup();
    let mut a = HandshakeSystem::with_defaults(1);
    let mut b = HandshakeSystem::with_defaults(2);
    a.update(&a_plat, DT);
    b.update(&b_plat, DT);

    a.on_trigger(&a_plat, Hand::Right, true);
    let payloads = a_plat.take_channel(HANDSHAKE_CHANNEL);
    assert_eq!(payloads.len(), 1);

    let (b_primary, b_secondary) = b_keys();
    b.handle_message(&b_plat, 1, &payloads[0]);
    assert_eq!(state(&b, b_primary, b_secondary), Some(LinkState::Follower));
    let rel_before = *b.registry().find(b_primary, b_secondary).unwrap().rel_xform();

    // The same payload again: no transition, no new offset, no reply.
    b.handle_message(&b_plat, 1, &payloads[0]);
    assert_eq!(state(&b, b_primary, b_secondary), Some(LinkState::Follower));
    let rel_after = *b.registry().find(b_primary, b_secondary).unwrap().rel_xform();
    assert_iso_close(&rel_before, &rel_after);
    assert!(b_plat.peek_channel(HANDSHAKE_CHANNEL).is_empty());

    // Same once the link is mutually confirmed.
    b.on_trigger(&b_plat, Hand::Left, true);
    assert_eq!(state(&b, b_primary, b_secondary), Some(LinkState::Peer));
    b_plat.take_channel(HANDSHAKE_CHANNEL);
    b.handle_message(&b_plat, 1, &payloads[0]);
    assert_eq!(state(&b, b_primary, b_secondary), Some(LinkState::Peer));
    assert!(b_plat.peek_channel(HANDSHAKE_CHANNEL).is_empty());
}

#[test]
fn own_echo_and_foreign_receiver_are_ignored() {
    let (_world, a_plat, b_plat) = two_avatar_setup();
    let mut a = HandshakeSystem::with_defaults(1);
    let mut b = HandshakeSystem::with_defaults(2);
    a.update(&a_plat, DT);
    b.update(&b_plat, DT);

    a.on_trigger(&a_plat, Hand::Right, true);
    let payloads = a_plat.take_channel(HANDSHAKE_CHANNEL);

    // The broadcast comes back to its own sender.
    a.handle_message(&a_plat, 1, &payloads[0]);
    let (a_primary, a_secondary) = a_keys();
    assert_eq!(state(&a, a_primary, a_secondary), Some(LinkState::Leader));
    assert_eq!(a.registry().len(), 1);

    // A message addressed to a third machine passes through untouched.
    let mut foreign = GrabMessage::decode(&payloads[0]).unwrap();
    foreign.receiver = 99;
    b.handle_message(&b_plat, 1, &foreign.encode().unwrap());
    assert!(b.registry().is_empty());
}

#[test]
fn same_hand_grabs_capture_a_palm_to_palm_offset() {
    // Both right hands, palms just inside the wrists: the captured offset must
    // land the palms together, not the wrist joints.
    let world = Rc::new(RefCell::new(WorldState::default()));
    let mut me = FakeAvatar::standing_at([0.0, 0.0, 0.0]);
    me.palms.insert(
        Hand::Right,
        (nalgebra::Point3::new(0.25, 1.0, 0.0), nalgebra::UnitQuaternion::identity()),
    );
    world.borrow_mut().avatars.insert(1, me);

    let mut partner = FakeAvatar::standing_at([0.5, 0.0, 0.0]);
    partner.joints.insert(JointId::RightHand, iso([-0.2, 1.0, 0.0]));
    partner.joints.insert(JointId::LeftHand, iso([0.5, 1.0, 0.0]));
    partner.palms.insert(
        Hand::Right,
        (nalgebra::Point3::new(0.27, 1.0, 0.0), nalgebra::UnitQuaternion::identity()),
    );
    world.borrow_mut().avatars.insert(2, partner);

    let a_plat = FakePlatform::new(1, world);
    let mut a = HandshakeSystem::with_defaults(1);
    a.update(&a_plat, DT);

    a.on_trigger(&a_plat, Hand::Right, true);
    let payloads = a_plat.take_channel(HANDSHAKE_CHANNEL);
    let msg = GrabMessage::decode(&payloads[0]).unwrap();
    assert_eq!(msg.grabbing_joint, "RightHand");
    assert_eq!(msg.grabbed_joint, "RightHand");

    // Reconstructing our hand from the partner's wrist lands 0.02 m short of
    // it (the palm separation), not on top of it.
    let rel = msg.rel_xform.to_xform();
    let partner_wrist = iso([0.3, 1.0, 0.0]);
    assert_iso_close(&(partner_wrist * rel), &iso([0.22, 1.0, 0.0]));
}

#[test]
fn release_without_a_prior_press_is_ignored() {
    let (_world, a_plat, _b_plat) = two_avatar_setup();
    let mut a = HandshakeSystem::with_defaults(1);
    a.update(&a_plat, DT);

    a.on_trigger(&a_plat, Hand::Right, false);

    assert!(a.registry().is_empty());
    assert!(a_plat.peek_channel(HANDSHAKE_CHANNEL).is_empty());
}

#[test]
fn dispatcher_announcements_track_the_combined_suppression_set() {
    // Partner posed so each of avatar 1's hands has its own grabbable joint.
    let world = Rc::new(RefCell::new(WorldState::default()));
    world
        .borrow_mut()
        .avatars
        .insert(1, FakeAvatar::standing_at([0.0, 0.0, 0.0]));
    let mut partner = FakeAvatar::standing_at([0.5, 0.0, 0.0]);
    partner.joints.insert(JointId::RightHand, iso([-0.6, 1.0, 0.0]));
    world.borrow_mut().avatars.insert(2, partner);
    let a_plat = FakePlatform::new(1, Rc::clone(&world));

    let mut a = HandshakeSystem::with_defaults(1);
    a.start(&a_plat);
    a.update(&a_plat, DT);

    a.on_trigger(&a_plat, Hand::Right, true);
    assert_eq!(a_plat.take_channel(HAND_DISABLER_CHANNEL), ["right"]);

    a.on_trigger(&a_plat, Hand::Left, true);
    assert_eq!(a_plat.take_channel(HAND_DISABLER_CHANNEL), ["both"]);

    a.on_trigger(&a_plat, Hand::Left, false);
    assert_eq!(a_plat.take_channel(HAND_DISABLER_CHANNEL), ["right"]);

    a.on_trigger(&a_plat, Hand::Right, false);
    assert_eq!(a_plat.take_channel(HAND_DISABLER_CHANNEL), ["none"]);
}

#[test]
fn shutdown_unsubscribes_and_restores_dispatch() {
    let (_world, a_plat, _b_plat) = two_avatar_setup();
    let mut a = HandshakeSystem::with_defaults(1);
    a.start(&a_plat);
    a.update(&a_plat, DT);

    a.on_trigger(&a_plat, Hand::Right, true);
    a_plat.take_channel(HAND_DISABLER_CHANNEL);
    a.update(&a_plat, DT);

    a.shutdown(&a_plat);

    assert!(a_plat.subscriptions.borrow().is_empty());
    assert_eq!(a_plat.take_channel(HAND_DISABLER_CHANNEL), ["none"]);
    assert!(a.overrides().get(Hand::Left).is_none());
    assert!(a.overrides().get(Hand::Right).is_none());
}
