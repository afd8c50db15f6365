use std::borrow::Cow;

use super::DamageEvent;
use crate::{
    active_parts, ActionKind, ActionLog, AttackType, BodyPartType, CancelToken, EngineError,
    ObjectId, ObjectIntent, ObjectPatch, Position, RoomEntity, RoomObject, RoomProcessorContext,
    RoomStep, StepPhase, StructureKind, UserId, RESOURCE_ENERGY,
};

const MELEE_RANGE: i32 = 1;
const RANGED_RANGE: i32 = 3;

/// Derives damage from `attack`, `rangedAttack` and `rangedMassAttack`
/// intents. Every record is applied, so an object issuing two attacks in one
/// tick deals damage twice.
#[derive(Clone, Copy, Debug, Default)]
pub struct AttackStep;

impl RoomStep for AttackStep {
    fn name(&self) -> &'static str {
        "attack"
    }

    fn phase(&self) -> StepPhase {
        StepPhase::Damage
    }

    fn run(
        &self,
        ctx: &mut RoomProcessorContext<'_>,
        cancel: &CancelToken,
    ) -> Result<(), EngineError> {
        let state = ctx.state;
        for (user, id, intent) in state.intents.object_intents() {
            cancel.check()?;
            let Some(attacker) = ctx.view().object(id).map(Cow::into_owned) else {
                continue;
            };
            if attacker.owner() != Some(user) {
                tracing::debug!(object = %id, user = %user, "Ignoring intent for foreign object");
                continue;
            }
            match intent {
                ObjectIntent::Attack { id: target } => match &attacker {
                    RoomObject::Structure(s) if matches!(s.kind, StructureKind::Tower) => {
                        tower_attack(ctx, &attacker, &target)
                    }
                    _ => melee_attack(ctx, &attacker, &target),
                },
                ObjectIntent::RangedAttack { id: target } => ranged_attack(ctx, &attacker, &target),
                ObjectIntent::RangedMassAttack => mass_attack(ctx, &attacker, user),
                ObjectIntent::Other => {}
            }
        }
        Ok(())
    }
}

fn parts(object: &RoomObject, kind: BodyPartType) -> u32 {
    object.body().map_or(0, |body| active_parts(body, kind))
}

/// Live damageable target within `range`, or `None`.
fn target_in_range(
    ctx: &RoomProcessorContext<'_>,
    from: Position,
    target: &ObjectId,
    range: i32,
) -> Option<RoomObject> {
    let object = ctx.view().object(target)?.into_owned();
    object.hits()?;
    (from.range_to(object.pos()) <= range).then_some(object)
}

fn is_rampart(object: &RoomObject) -> bool {
    matches!(
        object,
        RoomObject::Structure(s) if matches!(s.kind, StructureKind::Rampart { .. })
    )
}

/// Damage aimed at an object standing under a rampart hits the rampart.
fn shielded_target(ctx: &RoomProcessorContext<'_>, target: &RoomObject) -> ObjectId {
    if is_rampart(target) {
        return target.id().clone();
    }
    ctx.view()
        .objects_at(target.pos())
        .find(|o| is_rampart(o))
        .map(|rampart| rampart.id().clone())
        .unwrap_or_else(|| target.id().clone())
}

fn queue(
    ctx: &mut RoomProcessorContext<'_>,
    attacker: &RoomObject,
    target: &RoomObject,
    amount: u32,
    kind: AttackType,
) {
    if amount == 0 {
        return;
    }
    let hit = shielded_target(ctx, target);
    ctx.damage
        .push(DamageEvent::new(Some(attacker.id().clone()), hit, amount, kind));
}

fn log_action(ctx: &mut RoomProcessorContext<'_>, id: &ObjectId, kind: ActionKind, at: Position) {
    ctx.buffer
        .patch(id, ObjectPatch::action(ActionLog::single(kind, at)));
}

fn melee_attack(ctx: &mut RoomProcessorContext<'_>, attacker: &RoomObject, target: &ObjectId) {
    let power = parts(attacker, BodyPartType::Attack);
    if power == 0 {
        return;
    }
    let Some(target) = target_in_range(ctx, attacker.pos(), target, MELEE_RANGE) else {
        return;
    };
    let damage = power * ctx.config.combat.attack_power;
    queue(ctx, attacker, &target, damage, AttackType::Melee);
    log_action(ctx, attacker.id(), ActionKind::Attack, target.pos());
    log_action(ctx, target.id(), ActionKind::Attacked, attacker.pos());

    // Defenders with ATTACK parts strike back at melee attackers.
    if target.is_creep_like() && target.owner() != attacker.owner() {
        let retaliation = parts(&target, BodyPartType::Attack) * ctx.config.combat.attack_power;
        queue(ctx, &target, attacker, retaliation, AttackType::HitBack);
    }
}

fn ranged_attack(ctx: &mut RoomProcessorContext<'_>, attacker: &RoomObject, target: &ObjectId) {
    let power = parts(attacker, BodyPartType::RangedAttack);
    if power == 0 {
        return;
    }
    let Some(target) = target_in_range(ctx, attacker.pos(), target, RANGED_RANGE) else {
        return;
    };
    let damage = power * ctx.config.combat.ranged_attack_power;
    queue(ctx, attacker, &target, damage, AttackType::Ranged);
    log_action(ctx, attacker.id(), ActionKind::RangedAttack, target.pos());
    log_action(ctx, target.id(), ActionKind::Attacked, attacker.pos());
}

/// Hits every hostile owned object within range 3, weaker with distance.
fn mass_attack(ctx: &mut RoomProcessorContext<'_>, attacker: &RoomObject, user: &UserId) {
    let power = parts(attacker, BodyPartType::RangedAttack);
    if power == 0 {
        return;
    }
    let from = attacker.pos();
    let targets: Vec<RoomObject> = ctx
        .view()
        .objects()
        .filter(|o| o.hits().is_some())
        .filter(|o| o.owner().is_some_and(|owner| owner != user))
        .filter(|o| from.range_to(o.pos()) <= RANGED_RANGE)
        .map(Cow::into_owned)
        .collect();

    for target in &targets {
        let range = from.range_to(target.pos());
        let damage = power * ctx.config.combat.mass_attack_damage(range);
        queue(ctx, attacker, target, damage, AttackType::RangedMass);
    }
    log_action(ctx, attacker.id(), ActionKind::RangedMassAttack, from);
}

/// Towers pay energy per shot and lose power with distance.
fn tower_attack(ctx: &mut RoomProcessorContext<'_>, tower: &RoomObject, target: &ObjectId) {
    let cost = ctx.config.combat.tower_energy_cost;
    let Some(mut store) = tower.store().cloned() else {
        return;
    };
    if store.energy() < cost {
        tracing::debug!(tower = %tower.id(), "Tower lacks energy to attack");
        return;
    }
    let Some(target) = target_in_range(ctx, tower.pos(), target, i32::MAX) else {
        return;
    };

    store.set(RESOURCE_ENERGY, store.energy() - cost);
    ctx.buffer.patch(
        tower.id(),
        ObjectPatch {
            store: Some(store),
            ..ObjectPatch::default()
        },
    );
    let damage = ctx.config.combat.tower_damage(tower.pos().range_to(target.pos()));
    queue(ctx, tower, &target, damage, AttackType::Tower);
    log_action(ctx, tower.id(), ActionKind::Attack, target.pos());
}
