//! One canonical map of live links.
//!
//! Links are keyed by the ordered (primary, secondary) joint-key pair. Whether
//! a link is rooted at the local avatar is a predicate on its primary key, not
//! a second map, so one logical link can never drift into two entries.

use std::collections::BTreeMap;

use shared::{AvatarId, JointKey};

use crate::context::GrabContext;
use crate::link::GrabLink;

#[derive(Default)]
pub struct GrabLinkRegistry {
    links: BTreeMap<(JointKey, JointKey), GrabLink>,
}

impl GrabLinkRegistry {
    pub fn new() -> GrabLinkRegistry {
        GrabLinkRegistry {
            links: BTreeMap::new(),
        }
    }

    /// Existing link for the pair, or a fresh one in the Alone state. Links are
    /// never removed; a finished link decays to Alone and is reused here.
    pub fn find_or_create(&mut self, primary: JointKey, secondary: JointKey) -> &mut GrabLink {
        self.links.entry((primary, secondary)).or_insert_with(|| {
            log::debug!("new GrabLink({primary:?} -> {secondary:?})");
            GrabLink::new(primary, secondary)
        })
    }

    pub fn find_mut(&mut self, primary: JointKey, secondary: JointKey) -> Option<&mut GrabLink> {
        self.links.get_mut(&(primary, secondary))
    }

    pub fn find(&self, primary: JointKey, secondary: JointKey) -> Option<&GrabLink> {
        self.links.get(&(primary, secondary))
    }

    /// Whether a link acts for the local avatar's side.
    pub fn is_rooted_locally(link: &GrabLink, local: AvatarId) -> bool {
        link.primary().avatar_id == local
    }

    /// Drives every live link once. Deterministic key order.
    pub fn process(&mut self, ctx: &mut GrabContext, dt: f32) {
        for link in self.links.values_mut() {
            link.process(ctx, dt);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &GrabLink> {
        self.links.values()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
