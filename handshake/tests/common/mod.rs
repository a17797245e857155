//! In-memory platform for integration tests: a tiny shared world of posed
//! avatars plus recorders for every host-side effect (messages, pulses, pins,
//! injectors). Two `HandshakeSystem`s each get their own `FakePlatform` view of
//! the same world; tests pump sent messages across by hand so delivery order,
//! duplication and loss stay under test control.

// Each test binary compiles this module separately and uses a different slice.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use nalgebra::{Point3, Translation3, UnitQuaternion, Vector3};
use shared::{AvatarId, Hand, JointId, Xform, HANDSHAKE_CHANNEL};

use handshake::{HandshakeSystem, InjectorId, InjectorOptions, Platform, SoundResource};

pub fn iso(pos: [f32; 3]) -> Xform {
    Xform::from_parts(
        Translation3::new(pos[0], pos[1], pos[2]),
        UnitQuaternion::identity(),
    )
}

pub fn assert_iso_close(a: &Xform, b: &Xform) {
    const EPS: f32 = 1.0e-3;
    assert!(
        (a.translation.vector - b.translation.vector).norm() < EPS,
        "translations differ: {a:?} vs {b:?}"
    );
    assert!(
        a.rotation.angle_to(&b.rotation) < EPS,
        "rotations differ: {a:?} vs {b:?}"
    );
}

pub struct FakeAvatar {
    pub root: Xform,
    /// Joint poses in the avatar root frame.
    pub joints: BTreeMap<JointId, Xform>,
    /// Tracked controller poses in the avatar root frame. Missing entries read
    /// as identity, i.e. untracked.
    pub controllers: BTreeMap<Hand, Xform>,
    /// World-space palm poses.
    pub palms: BTreeMap<Hand, (Point3<f32>, UnitQuaternion<f32>)>,
}

impl FakeAvatar {
    /// An avatar standing at `pos` with hands at fixed offsets: LeftHand at
    /// (-0.2, 1, 0), RightHand at (0.2, 1, 0) in the root frame, controllers
    /// untracked.
    pub fn standing_at(pos: [f32; 3]) -> FakeAvatar {
        let mut joints = BTreeMap::new();
        joints.insert(JointId::LeftHand, iso([-0.2, 1.0, 0.0]));
        joints.insert(JointId::RightHand, iso([0.2, 1.0, 0.0]));
        FakeAvatar {
            root: iso(pos),
            joints,
            controllers: BTreeMap::new(),
            palms: BTreeMap::new(),
        }
    }
}

#[derive(Default)]
pub struct WorldState {
    pub avatars: BTreeMap<AvatarId, FakeAvatar>,
}

pub struct FakePlatform {
    pub local: AvatarId,
    pub world: Rc<RefCell<WorldState>>,
    pub sent: RefCell<Vec<(String, String)>>,
    pub pulses: RefCell<Vec<(f32, f32, Hand)>>,
    pub pins: RefCell<BTreeMap<(AvatarId, usize), Xform>>,
    pub cleared: RefCell<Vec<(AvatarId, usize)>>,
    pub injectors_started: RefCell<Vec<(InjectorId, String)>>,
    pub injectors_restarted: RefCell<Vec<InjectorId>>,
    pub subscriptions: RefCell<Vec<String>>,
    pub sound_ready: Cell<bool>,
    pub hands_tracked: Cell<bool>,
    next_injector: Cell<u64>,
}

impl FakePlatform {
    pub fn new(local: AvatarId, world: Rc<RefCell<WorldState>>) -> FakePlatform {
        FakePlatform {
            local,
            world,
            sent: RefCell::new(Vec::new()),
            pulses: RefCell::new(Vec::new()),
            pins: RefCell::new(BTreeMap::new()),
            cleared: RefCell::new(Vec::new()),
            injectors_started: RefCell::new(Vec::new()),
            injectors_restarted: RefCell::new(Vec::new()),
            subscriptions: RefCell::new(Vec::new()),
            sound_ready: Cell::new(true),
            hands_tracked: Cell::new(true),
            next_injector: Cell::new(1),
        }
    }

    /// Drains and returns payloads sent on one channel, preserving the rest.
    pub fn take_channel(&self, channel: &str) -> Vec<String> {
        let mut sent = self.sent.borrow_mut();
        let (matching, rest): (Vec<_>, Vec<_>) =
            sent.drain(..).partition(|(c, _)| c == channel);
        *sent = rest;
        matching.into_iter().map(|(_, payload)| payload).collect()
    }

    /// Payloads sent on one channel without draining.
    pub fn peek_channel(&self, channel: &str) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

impl Platform for FakePlatform {
    fn local_avatar(&self) -> AvatarId {
        self.local
    }

    fn avatars_in_range(&self, center: Point3<f32>, radius: f32) -> Vec<AvatarId> {
        self.world
            .borrow()
            .avatars
            .iter()
            .filter(|(_, avatar)| {
                (avatar.root.translation.vector - center.coords).norm() <= radius
            })
            .map(|(&id, _)| id)
            .collect()
    }

    fn avatar_root(&self, id: AvatarId) -> Option<Xform> {
        self.world.borrow().avatars.get(&id).map(|a| a.root)
    }

    fn joint_index(&self, id: AvatarId, joint: JointId) -> Option<usize> {
        self.world
            .borrow()
            .avatars
            .get(&id)?
            .joints
            .contains_key(&joint)
            .then_some(joint as usize)
    }

    fn joint_pose_in_avatar_frame(&self, id: AvatarId, index: usize) -> Option<Xform> {
        let world = self.world.borrow();
        let avatar = world.avatars.get(&id)?;
        avatar
            .joints
            .iter()
            .find(|&(&joint, _)| joint as usize == index)
            .map(|(_, pose)| *pose)
    }

    fn controller_pose_in_avatar_frame(&self, id: AvatarId, hand: Hand) -> Option<Xform> {
        let world = self.world.borrow();
        let avatar = world.avatars.get(&id)?;
        Some(
            avatar
                .controllers
                .get(&hand)
                .copied()
                .unwrap_or_else(Xform::identity),
        )
    }

    fn palm_position(&self, id: AvatarId, hand: Hand) -> Option<Point3<f32>> {
        let world = self.world.borrow();
        world.avatars.get(&id)?.palms.get(&hand).map(|(pos, _)| *pos)
    }

    fn palm_rotation(&self, id: AvatarId, hand: Hand) -> Option<UnitQuaternion<f32>> {
        let world = self.world.borrow();
        world.avatars.get(&id)?.palms.get(&hand).map(|(_, rot)| *rot)
    }

    fn hand_pose_valid(&self, _hand: Hand) -> bool {
        self.hands_tracked.get()
    }

    fn pin_joint(&self, id: AvatarId, index: usize, target: &Xform) {
        self.pins.borrow_mut().insert((id, index), *target);
    }

    fn clear_pin_on_joint(&self, id: AvatarId, index: usize) {
        self.pins.borrow_mut().remove(&(id, index));
        self.cleared.borrow_mut().push((id, index));
    }

    fn trigger_haptic_pulse(&self, strength: f32, duration_ms: f32, hand: Hand) {
        self.pulses.borrow_mut().push((strength, duration_ms, hand));
    }

    fn send_message(&self, channel: &str, payload: &str) {
        self.sent
            .borrow_mut()
            .push((channel.to_owned(), payload.to_owned()));
    }

    fn subscribe(&self, channel: &str) {
        self.subscriptions.borrow_mut().push(channel.to_owned());
    }

    fn unsubscribe(&self, channel: &str) {
        self.subscriptions.borrow_mut().retain(|c| c != channel);
    }

    fn sound_loaded(&self, _sound: &SoundResource) -> bool {
        self.sound_ready.get()
    }

    fn play_sound(&self, sound: &SoundResource, _options: &InjectorOptions) -> Option<InjectorId> {
        let id = InjectorId(self.next_injector.get());
        self.next_injector.set(id.0 + 1);
        self.injectors_started
            .borrow_mut()
            .push((id, sound.url.clone()));
        Some(id)
    }

    fn restart_injector(&self, injector: InjectorId, _options: &InjectorOptions) {
        self.injectors_restarted.borrow_mut().push(injector);
    }

    fn request_show_hand_controllers(&self) {}

    fn request_hide_hand_controllers(&self) {}
}

/// Two avatars facing the grab tests: 1 at the origin, 2 half a meter along +X.
/// Avatar 1's RightHand sits 0.1 m from avatar 2's LeftHand.
pub fn two_avatar_setup() -> (Rc<RefCell<WorldState>>, FakePlatform, FakePlatform) {
    let world = Rc::new(RefCell::new(WorldState::default()));
    world
        .borrow_mut()
        .avatars
        .insert(1, FakeAvatar::standing_at([0.0, 0.0, 0.0]));
    world
        .borrow_mut()
        .avatars
        .insert(2, FakeAvatar::standing_at([0.5, 0.0, 0.0]));
    let a = FakePlatform::new(1, Rc::clone(&world));
    let b = FakePlatform::new(2, Rc::clone(&world));
    (world, a, b)
}

pub fn move_avatar(world: &Rc<RefCell<WorldState>>, id: AvatarId, delta: Vector3<f32>) {
    let mut world = world.borrow_mut();
    if let Some(avatar) = world.avatars.get_mut(&id) {
        avatar.root.translation.vector += delta;
    }
}

/// Delivers everything `from` sent on the coordination channel into `to`.
pub fn pump(
    from: &FakePlatform,
    from_id: AvatarId,
    to_sys: &mut HandshakeSystem,
    to_plat: &FakePlatform,
) -> Vec<String> {
    let payloads = from.take_channel(HANDSHAKE_CHANNEL);
    for payload in &payloads {
        to_sys.handle_message(to_plat, from_id, payload);
    }
    payloads
}
