use crate::{
    ActionLog, CancelToken, EngineError, ObjectPatch, RoomInfoPatch,
    RoomProcessorContext, RoomStep, StepPhase,
};

/// End-of-tick bookkeeping: clears action logs left over from the previous
/// tick, stores the event log and records the room info patch.
#[derive(Clone, Copy, Debug, Default)]
pub struct CleanupStep;

impl RoomStep for CleanupStep {
    fn name(&self) -> &'static str {
        "cleanup"
    }

    fn phase(&self) -> StepPhase {
        StepPhase::Cleanup
    }

    fn run(
        &self,
        ctx: &mut RoomProcessorContext<'_>,
        cancel: &CancelToken,
    ) -> Result<(), EngineError> {
        let state = ctx.state;
        for (id, object) in &state.objects {
            let stale = object.action_log().is_some_and(|log| !log.is_empty());
            if !stale || ctx.buffer.fate(id).is_gone() {
                continue;
            }
            let logged_this_tick = ctx
                .buffer
                .pending_patch(id)
                .is_some_and(|patch| patch.action_log.is_some());
            if !logged_this_tick {
                ctx.buffer.patch(id, ObjectPatch::action(ActionLog::new()));
            }
        }
        cancel.check()?;

        let events = std::mem::take(&mut ctx.events);
        ctx.buffer.set_event_log(events);

        let active = ctx.view().objects().any(|o| o.is_creep_like());
        ctx.buffer.set_room_info_patch(RoomInfoPatch {
            last_tick: state.tick,
            active,
        });
        Ok(())
    }
}
