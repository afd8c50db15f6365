use crate::{
    CancelToken, EngineError, MapView, RoomEntity, RoomObject, RoomProcessorContext, RoomStep,
    StepPhase, StructureKind,
};

/// Builds the coarse world-map picture of the room as it ends the tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct MapViewStep;

impl RoomStep for MapViewStep {
    fn name(&self) -> &'static str {
        "mapView"
    }

    fn phase(&self) -> StepPhase {
        StepPhase::Summary
    }

    fn run(
        &self,
        ctx: &mut RoomProcessorContext<'_>,
        _cancel: &CancelToken,
    ) -> Result<(), EngineError> {
        let mut view = MapView::default();
        for object in ctx.view().objects() {
            let pos = object.pos();
            match &*object {
                RoomObject::Structure(s) if matches!(s.kind, StructureKind::ConstructedWall) => {
                    view.walls.push(pos)
                }
                RoomObject::Structure(s) if matches!(s.kind, StructureKind::Road) => {
                    view.roads.push(pos)
                }
                RoomObject::Portal(_) => view.portals.push(pos),
                RoomObject::Source(_) => view.sources.push(pos),
                RoomObject::Mineral(_) => view.minerals.push(pos),
                RoomObject::Controller(_) => view.controllers.push(pos),
                owned => {
                    if let Some(owner) = owned.owner() {
                        view.users.entry(owner.clone()).or_default().push(pos);
                    }
                }
            }
        }
        ctx.buffer.set_map_view(view);
        Ok(())
    }
}
