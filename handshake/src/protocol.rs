//! Inbound message handling for the grab coordination channel.
//!
//! The sender frames a message from its own point of view: `grabbingJoint` is
//! the sender's joint, `grabbedJoint` is ours. Locally the roles swap: the
//! named grabbed joint becomes our primary key and the sender's grabbing joint
//! becomes our secondary. Nothing in here is fatal: malformed payloads, unknown
//! joints and missing links are logged and dropped.

use shared::{AvatarId, GrabMessage, JointId, JointKey, MessageKind};

use crate::context::GrabContext;
use crate::registry::GrabLinkRegistry;

/// Reconstructs the local (primary, secondary) pair from the sender's framing.
pub fn link_keys_from_wire(
    local: AvatarId,
    sender: AvatarId,
    grabbing_joint: JointId,
    grabbed_joint: JointId,
) -> (JointKey, JointKey) {
    (
        JointKey::new(local, grabbed_joint),
        JointKey::new(sender, grabbing_joint),
    )
}

/// Applies one raw channel payload to the registry. Called between ticks; the
/// single-threaded model makes the resulting transition atomic with respect to
/// the next `process()`.
pub fn dispatch_message(
    registry: &mut GrabLinkRegistry,
    ctx: &mut GrabContext,
    sender: AvatarId,
    payload: &str,
) {
    let local = ctx.local_avatar();
    if sender == local {
        // Our own broadcast echoing back.
        return;
    }

    let msg = match GrabMessage::decode(payload) {
        Ok(msg) => msg,
        Err(err) => {
            log::warn!("dropping malformed grab message from {sender}: {err}");
            return;
        }
    };
    if msg.receiver != local {
        // Addressed to someone else; chains of three or more avatars are out
        // of scope.
        log::debug!(
            "ignoring {:?} from {sender} addressed to {}",
            msg.kind,
            msg.receiver
        );
        return;
    }

    let (Some(grabbing), Some(grabbed)) = (
        JointId::from_name(&msg.grabbing_joint),
        JointId::from_name(&msg.grabbed_joint),
    ) else {
        log::warn!(
            "dropping grab message from {sender} with unknown joints {:?}/{:?}",
            msg.grabbing_joint,
            msg.grabbed_joint
        );
        return;
    };

    let (primary, secondary) = link_keys_from_wire(local, sender, grabbing, grabbed);

    match msg.kind {
        MessageKind::Grab => {
            // The sender computed rel_xform in its framing; ours is the inverse.
            let rel = msg.rel_xform.to_xform().inverse();
            registry
                .find_or_create(primary, secondary)
                .received_grab(ctx, rel);
        }
        MessageKind::Release => match registry.find_mut(primary, secondary) {
            Some(link) => link.received_release(ctx),
            None => log::warn!("Release from {sender} for unknown link {primary:?}/{secondary:?}"),
        },
        MessageKind::Reject => match registry.find_mut(primary, secondary) {
            Some(link) => link.reject(ctx),
            None => log::warn!("Reject from {sender} for unknown link {primary:?}/{secondary:?}"),
        },
    }
}
