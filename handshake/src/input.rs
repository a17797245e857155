//! Per-hand trigger input driving press/release on the owning link.

use shared::{Hand, JointKey};

use crate::context::GrabContext;
use crate::registry::GrabLinkRegistry;

/// Active grab bookkeeping for the two physical trigger actions. A hand issues
/// at most one press at a time; the release always routes back to the link the
/// press latched onto, even if a closer joint has since appeared.
#[derive(Default)]
pub struct HandTriggers {
    left_active: Option<(JointKey, JointKey)>,
    right_active: Option<(JointKey, JointKey)>,
}

impl HandTriggers {
    pub fn new() -> HandTriggers {
        HandTriggers::default()
    }

    pub fn is_active(&self, hand: Hand) -> bool {
        self.slot_ref(hand).is_some()
    }

    /// Trigger edge for one hand. `pressed` is the pull edge, `!pressed` the
    /// release edge.
    pub fn on_trigger(
        &mut self,
        registry: &mut GrabLinkRegistry,
        ctx: &mut GrabContext,
        hand: Hand,
        pressed: bool,
    ) {
        if pressed {
            self.press(registry, ctx, hand);
        } else {
            self.release(registry, ctx, hand);
        }
    }

    fn press(&mut self, registry: &mut GrabLinkRegistry, ctx: &mut GrabContext, hand: Hand) {
        if self.is_active(hand) {
            log::debug!("{hand:?} trigger pressed while already engaged, ignoring");
            return;
        }
        let Some(secondary) = ctx
            .scanner
            .find_grabbable_joint(hand, ctx.config.grab_distance)
        else {
            return;
        };
        let primary = JointKey::new(ctx.local_avatar(), hand.joint());
        registry.find_or_create(primary, secondary).trigger_press(ctx);
        *self.slot_mut(hand) = Some((primary, secondary));
    }

    fn release(&mut self, registry: &mut GrabLinkRegistry, ctx: &mut GrabContext, hand: Hand) {
        let Some((primary, secondary)) = self.slot_mut(hand).take() else {
            return;
        };
        match registry.find_mut(primary, secondary) {
            Some(link) => link.trigger_release(ctx),
            None => log::warn!("{hand:?} released but no link for {primary:?}/{secondary:?}"),
        }
    }

    fn slot_ref(&self, hand: Hand) -> &Option<(JointKey, JointKey)> {
        match hand {
            Hand::Left => &self.left_active,
            Hand::Right => &self.right_active,
        }
    }

    fn slot_mut(&mut self, hand: Hand) -> &mut Option<(JointKey, JointKey)> {
        match hand {
            Hand::Left => &mut self.left_active,
            Hand::Right => &mut self.right_active,
        }
    }
}
