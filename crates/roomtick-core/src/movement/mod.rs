//! Movement step: resolves every creep's move for the tick at once.

mod claims;
mod resolve;
mod transit;

use std::borrow::Cow;

use crate::death::{dispatch_death, DeathOptions};
use crate::{
    CancelToken, EngineError, ObjectFate, ObjectId, ObjectPatch, PendingView, RoomObject,
    RoomProcessorContext, RoomStep, StepPhase,
};
use claims::MovePlan;
use resolve::{resolve, Outcomes};
use transit::{Board, Outcome};

#[derive(Clone, Copy, Debug, Default)]
pub struct MovementStep;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct MovementSummary {
    moved: usize,
    crashed: usize,
    transferred: usize,
}

impl RoomStep for MovementStep {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn phase(&self) -> StepPhase {
        StepPhase::Movement
    }

    fn run(
        &self,
        ctx: &mut RoomProcessorContext<'_>,
        cancel: &CancelToken,
    ) -> Result<(), EngineError> {
        let state = ctx.state;
        let exits = ctx.exits;
        let config = ctx.config;

        let outcomes = {
            let view = ctx.view();
            let plan = MovePlan::collect(state, &view);
            let board = Board::build(&view, &state.terrain, exits, config);
            let mut outcomes = resolve(&plan, &board, cancel)?;
            add_idle_portal_transfers(&view, &board, &mut outcomes);
            outcomes
        };

        let mut summary = MovementSummary::default();
        for (id, outcome) in outcomes {
            cancel.check()?;
            apply(ctx, &id, outcome, &mut summary);
        }
        tracing::debug!(
            room = %state.room,
            moved = summary.moved,
            crashed = summary.crashed,
            transferred = summary.transferred,
            "Movement resolved"
        );
        Ok(())
    }
}

/// Creeps left standing on a portal are carried through it.
fn add_idle_portal_transfers(
    view: &PendingView<'_>,
    board: &Board<'_>,
    outcomes: &mut Outcomes,
) {
    for object in view.objects() {
        let RoomObject::Creep(creep) = &*object else {
            continue;
        };
        let idle = matches!(outcomes.get(&creep.id), None | Some(Outcome::Stay));
        if !idle {
            continue;
        }
        if let Some(portal) = board.portal_at(creep.pos) {
            outcomes.insert(creep.id.clone(), Outcome::Transfer(portal.clone()));
        }
    }
}

fn apply(
    ctx: &mut RoomProcessorContext<'_>,
    id: &ObjectId,
    outcome: Outcome,
    summary: &mut MovementSummary,
) {
    let Some(object) = ctx.view().object(id).map(Cow::into_owned) else {
        return;
    };
    let fatigue = matches!(object, RoomObject::Creep(_)).then_some(0);

    match outcome {
        Outcome::Stay => {}
        Outcome::Move(to) => {
            ctx.buffer.patch(
                id,
                ObjectPatch {
                    pos: Some(to),
                    fatigue,
                    ..ObjectPatch::default()
                },
            );
            ctx.buffer.transition(id, ObjectFate::Moved);
            summary.moved += 1;
        }
        Outcome::Crash => {
            if dispatch_death(ctx, &object, DeathOptions { violent: false }) {
                summary.crashed += 1;
            }
        }
        Outcome::Transfer(target) => {
            tracing::debug!(object = %id, room = %target.room, "Object leaves the room");
            ctx.global.patch_room_object(
                id.clone(),
                ObjectPatch {
                    pos: Some(target.pos),
                    room: Some(target.room),
                    shard: target.shard,
                    fatigue,
                    ..ObjectPatch::default()
                },
            );
            ctx.buffer.transition(id, ObjectFate::Transferred);
            summary.transferred += 1;
        }
    }
}
