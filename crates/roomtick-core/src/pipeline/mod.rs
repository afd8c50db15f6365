//! The ordered per-room step pipeline.

mod cleanup;
mod context;
mod map_view;
mod step;

pub use cleanup::CleanupStep;
pub use context::RoomProcessorContext;
pub use map_view::MapViewStep;
pub use step::{RoomStep, StepPhase};

use crate::combat::{AttackStep, CombatStep};
use crate::movement::MovementStep;
use crate::{CancelToken, EngineError};

/// Phases every pipeline must contain.
const REQUIRED_PHASES: [StepPhase; 3] = [StepPhase::Movement, StepPhase::Combat, StepPhase::Cleanup];

/// Fixed sequence of steps run for one room per tick.
///
/// Construction checks the order: steps must be listed in phase order, and
/// movement, combat and cleanup must all be present. Combat reads the
/// positions movement wrote, so reordering them changes game results.
pub struct Pipeline {
    steps: Vec<Box<dyn RoomStep>>,
}

impl Pipeline {
    pub fn new(steps: Vec<Box<dyn RoomStep>>) -> Result<Self, EngineError> {
        Self::validate(&steps)?;
        Ok(Self { steps })
    }

    /// Movement, attack, combat, cleanup, map view.
    pub fn standard() -> Self {
        let steps: Vec<Box<dyn RoomStep>> = vec![
            Box::new(MovementStep),
            Box::new(AttackStep),
            Box::new(CombatStep),
            Box::new(CleanupStep),
            Box::new(MapViewStep),
        ];
        debug_assert!(Self::validate(&steps).is_ok());
        Self { steps }
    }

    fn validate(steps: &[Box<dyn RoomStep>]) -> Result<(), EngineError> {
        for pair in steps.windows(2) {
            if pair[1].phase() < pair[0].phase() {
                return Err(EngineError::StepOrder {
                    earlier: pair[1].name(),
                    later: pair[0].name(),
                });
            }
        }
        for phase in REQUIRED_PHASES {
            if !steps.iter().any(|s| s.phase() == phase) {
                return Err(EngineError::MissingStep(phase.name()));
            }
        }
        Ok(())
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Runs every step in order. Cancellation is checked before each step;
    /// a cancelled run has written nothing outside the context.
    pub fn execute(
        &self,
        ctx: &mut RoomProcessorContext<'_>,
        cancel: &CancelToken,
    ) -> Result<(), EngineError> {
        for step in &self.steps {
            if cancel.is_cancelled() {
                tracing::warn!(room = %ctx.state.room, step = step.name(), "Tick cancelled");
                return Err(EngineError::Cancelled);
            }
            let _span = tracing::debug_span!("step", name = step.name()).entered();
            step.run(ctx, cancel)?;
        }
        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.step_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_order_is_valid() {
        let pipeline = Pipeline::standard();
        assert!(Pipeline::validate(&pipeline.steps).is_ok());
        assert_eq!(
            pipeline.step_names(),
            vec!["movement", "attack", "combat", "cleanup", "mapView"]
        );
    }

    #[test]
    fn combat_before_movement_is_rejected() {
        let steps: Vec<Box<dyn RoomStep>> = vec![
            Box::new(CombatStep),
            Box::new(MovementStep),
            Box::new(CleanupStep),
        ];
        match Pipeline::new(steps) {
            Err(EngineError::StepOrder { earlier, later }) => {
                assert_eq!(earlier, "movement");
                assert_eq!(later, "combat");
            }
            other => panic!("expected order error, got {other:?}"),
        }
    }

    #[test]
    fn missing_cleanup_is_rejected() {
        let steps: Vec<Box<dyn RoomStep>> = vec![Box::new(MovementStep), Box::new(CombatStep)];
        assert!(matches!(
            Pipeline::new(steps),
            Err(EngineError::MissingStep("cleanup"))
        ));
    }
}
