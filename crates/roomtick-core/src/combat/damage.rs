use std::borrow::Cow;

use super::DamageEvent;
use crate::death::{dispatch_death, DeathOptions};
use crate::{
    damage_body, ObjectFate, ObjectPatch, RoomEntity, RoomEvent, RoomObject,
    RoomProcessorContext,
};

/// Applies one damage event. Hits only go down and stop at zero; several
/// events on one target coalesce into a single patch. Returns whether the
/// event destroyed its target.
///
/// A target that is already dead, removed or gone from the room is left
/// alone, which is what keeps a second lethal hit from dispatching twice.
pub fn apply_damage(ctx: &mut RoomProcessorContext<'_>, event: &DamageEvent) -> bool {
    let id = &event.target;
    if ctx.buffer.fate(id).is_gone() {
        tracing::debug!(target = %id, "Damage to resolved object ignored");
        return false;
    }
    let Some(target) = ctx.view().object(id).map(Cow::into_owned) else {
        return false;
    };
    let Some(hits) = target.hits() else {
        return false;
    };
    if event.amount == 0 || hits == 0 {
        return false;
    }

    let dealt = event.amount.min(hits);
    let remaining = hits - dealt;
    let mut patch = ObjectPatch::hits(remaining);
    if let RoomObject::Creep(creep) = &target {
        patch.body = Some(damage_body(&creep.body, dealt));
    }
    ctx.buffer.patch(id, patch);
    ctx.buffer.transition(id, ObjectFate::Damaged);

    if let Some(attacker) = &event.attacker {
        ctx.events.push(RoomEvent::Attack {
            object_id: attacker.clone(),
            target_id: id.clone(),
            damage: dealt,
            attack_type: event.kind,
        });
    }
    notify_owner(ctx, &target, event);

    if remaining > 0 {
        return false;
    }
    if target.is_creep_like() {
        let Some(dead) = ctx.view().object(id).map(Cow::into_owned) else {
            return false;
        };
        dispatch_death(ctx, &dead, DeathOptions { violent: true })
    } else {
        if !ctx.buffer.remove(id) {
            return false;
        }
        ctx.events.push(RoomEvent::ObjectDestroyed {
            object_id: id.clone(),
            object_type: target.type_name().to_string(),
        });
        tracing::debug!(object = %id, kind = target.type_name(), "Structure destroyed");
        true
    }
}

fn notify_owner(ctx: &mut RoomProcessorContext<'_>, target: &RoomObject, event: &DamageEvent) {
    if !ctx.config.notify_attacks || !target.notify_when_attacked() {
        return;
    }
    let Some(owner) = target.owner() else {
        return;
    };
    let attacker_owner = event
        .attacker
        .as_ref()
        .and_then(|a| ctx.state.object(a))
        .and_then(|a| a.owner().cloned());
    if attacker_owner.as_ref() == Some(owner) {
        return;
    }
    ctx.notifications.notify_attacked(
        owner,
        target.id(),
        target.type_name(),
        &ctx.state.room,
        target.pos(),
        attacker_owner.as_ref(),
    );
}
