use crate::{CancelToken, EngineError, RoomProcessorContext};

/// Coarse position of a step in the tick. A pipeline must list its steps
/// in non-decreasing phase order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepPhase {
    /// Settles positions; everything after it sees post-movement state.
    Movement,
    /// Derives damage from intents against post-movement positions.
    Damage,
    /// Applies damage and dispatches deaths.
    Combat,
    /// Room-level bookkeeping once every object effect is in.
    Cleanup,
    /// Read-only summaries of the finished tick.
    Summary,
}

impl StepPhase {
    pub fn name(self) -> &'static str {
        match self {
            StepPhase::Movement => "movement",
            StepPhase::Damage => "damage",
            StepPhase::Combat => "combat",
            StepPhase::Cleanup => "cleanup",
            StepPhase::Summary => "summary",
        }
    }
}

/// One stage of the per-room tick.
///
/// Steps read the snapshot and the pending view and write only through the
/// context. Long loops should call `cancel.check()` between iterations.
pub trait RoomStep: Send + Sync {
    fn name(&self) -> &'static str;

    fn phase(&self) -> StepPhase;

    fn run(
        &self,
        ctx: &mut RoomProcessorContext<'_>,
        cancel: &CancelToken,
    ) -> Result<(), EngineError>;
}
