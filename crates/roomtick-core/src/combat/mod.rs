//! Combat: damage derivation and application.
//!
//! [`AttackStep`] turns attack intents into [`DamageEvent`]s using the
//! positions movement left behind; [`CombatStep`] applies them to hit points
//! and dispatches at most one death or removal per object.

mod attack;
mod damage;

use serde::{Deserialize, Serialize};

pub use attack::AttackStep;
pub use damage::apply_damage;

use crate::{
    AttackType, CancelToken, EngineError, ObjectId, RoomProcessorContext, RoomStep, StepPhase,
};

/// Already-computed damage against one target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attacker: Option<ObjectId>,
    pub target: ObjectId,
    pub amount: u32,
    pub kind: AttackType,
}

impl DamageEvent {
    pub fn new(attacker: Option<ObjectId>, target: ObjectId, amount: u32, kind: AttackType) -> Self {
        Self {
            attacker,
            target,
            amount,
            kind,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CombatStep;

impl RoomStep for CombatStep {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn phase(&self) -> StepPhase {
        StepPhase::Combat
    }

    fn run(
        &self,
        ctx: &mut RoomProcessorContext<'_>,
        cancel: &CancelToken,
    ) -> Result<(), EngineError> {
        let events = std::mem::take(&mut ctx.damage);
        let mut deaths = 0;
        for event in &events {
            cancel.check()?;
            if apply_damage(ctx, event) {
                deaths += 1;
            }
        }
        tracing::debug!(
            room = %ctx.state.room,
            events = events.len(),
            deaths,
            "Combat resolved"
        );
        Ok(())
    }
}
