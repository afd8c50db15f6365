use std::collections::BTreeMap;

use super::{
    MapView, MutationStore, ObjectChange, ObjectFate, ObjectPatch, PendingChange, RoomBatch,
    RoomEvent, RoomInfoPatch,
};
use crate::{CancelToken, EngineError, ObjectId, RoomEntity, RoomName, RoomObject};

/// Staging area for everything one room tick produces.
///
/// Each object id maps to at most one pending change: patches coalesce field
/// by field, a patch issued after an upsert is folded into the upserted
/// document, and a removal is terminal. Nothing reaches storage until
/// [`MutationBuffer::flush`], so dropping the buffer discards the tick.
#[derive(Clone, Debug)]
pub struct MutationBuffer {
    room: RoomName,
    tick: u64,
    changes: BTreeMap<ObjectId, PendingChange>,
    fates: BTreeMap<ObjectId, ObjectFate>,
    room_info: Option<RoomInfoPatch>,
    event_log: Option<Vec<RoomEvent>>,
    map_view: Option<MapView>,
}

impl MutationBuffer {
    pub fn new(room: RoomName, tick: u64) -> Self {
        Self {
            room,
            tick,
            changes: BTreeMap::new(),
            fates: BTreeMap::new(),
            room_info: None,
            event_log: None,
            map_view: None,
        }
    }

    pub fn room(&self) -> &RoomName {
        &self.room
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn upsert(&mut self, object: RoomObject) {
        let id = object.id().clone();
        if self.is_marked_for_removal(&id) {
            tracing::debug!(object = %id, "Upsert after removal ignored");
            return;
        }
        self.changes.insert(id, PendingChange::Upsert { object });
    }

    pub fn patch(&mut self, id: &ObjectId, patch: ObjectPatch) {
        if patch.is_empty() {
            return;
        }
        match self.changes.get_mut(id) {
            Some(PendingChange::Remove) => {
                tracing::debug!(object = %id, "Patch after removal ignored");
            }
            Some(PendingChange::Upsert { object }) => patch.apply_to(object),
            Some(PendingChange::Patch { patch: pending }) => pending.merge(patch),
            None => {
                self.changes
                    .insert(id.clone(), PendingChange::Patch { patch });
            }
        }
    }

    /// Marks `id` for deletion. Returns false when it already was.
    pub fn remove(&mut self, id: &ObjectId) -> bool {
        if self.is_marked_for_removal(id) {
            return false;
        }
        self.transition(id, ObjectFate::Removed);
        self.changes.insert(id.clone(), PendingChange::Remove);
        true
    }

    pub fn set_room_info_patch(&mut self, info: RoomInfoPatch) {
        self.room_info = Some(info);
    }

    pub fn set_event_log(&mut self, events: Vec<RoomEvent>) {
        self.event_log = Some(events);
    }

    pub fn set_map_view(&mut self, view: MapView) {
        self.map_view = Some(view);
    }

    pub fn pending(&self, id: &ObjectId) -> Option<&PendingChange> {
        self.changes.get(id)
    }

    pub fn pending_patch(&self, id: &ObjectId) -> Option<&ObjectPatch> {
        match self.changes.get(id) {
            Some(PendingChange::Patch { patch }) => Some(patch),
            _ => None,
        }
    }

    pub fn is_marked_for_removal(&self, id: &ObjectId) -> bool {
        matches!(self.changes.get(id), Some(PendingChange::Remove))
    }

    pub fn fate(&self, id: &ObjectId) -> ObjectFate {
        if self.is_marked_for_removal(id) {
            return ObjectFate::Removed;
        }
        self.fates.get(id).copied().unwrap_or_default()
    }

    /// Advances the tick state of `id`. Returns false, leaving the state
    /// unchanged, when the transition would move backwards.
    pub fn transition(&mut self, id: &ObjectId, next: ObjectFate) -> bool {
        let current = self.fate(id);
        if !current.can_become(next) {
            return false;
        }
        self.fates.insert(id.clone(), next);
        true
    }

    pub(crate) fn upserted_ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.changes
            .iter()
            .filter(|(_, change)| matches!(change, PendingChange::Upsert { .. }))
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
            && self.room_info.is_none()
            && self.event_log.is_none()
            && self.map_view.is_none()
    }

    /// Copy of everything staged so far, in object id order.
    pub fn batch(&self) -> RoomBatch {
        RoomBatch {
            room: self.room.clone(),
            tick: self.tick,
            changes: self
                .changes
                .iter()
                .map(|(id, change)| ObjectChange {
                    id: id.clone(),
                    change: change.clone(),
                })
                .collect(),
            room_info: self.room_info.clone(),
            event_log: self.event_log.clone(),
            map_view: self.map_view.clone(),
        }
    }

    /// Commits the staged batch in one store call and clears the buffer.
    /// A cancelled token leaves both the store and the buffer untouched.
    pub async fn flush(
        &mut self,
        store: &dyn MutationStore,
        cancel: &CancelToken,
    ) -> Result<RoomBatch, EngineError> {
        cancel.check()?;
        let batch = self.batch();
        store.commit_room(batch.clone()).await?;
        tracing::debug!(
            room = %self.room,
            tick = self.tick,
            changes = batch.changes.len(),
            "Flushed room batch"
        );
        self.reset();
        Ok(batch)
    }

    pub fn reset(&mut self) {
        self.changes.clear();
        self.fates.clear();
        self.room_info = None;
        self.event_log = None;
        self.map_view = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Position, Structure, StructureKind};

    fn wall(id: &str) -> RoomObject {
        RoomObject::Structure(Structure {
            id: ObjectId::from(id),
            pos: Position::new(3, 3),
            hits: 100,
            hits_max: 100,
            owner: None,
            store: Default::default(),
            notify_when_attacked: false,
            action_log: Default::default(),
            kind: StructureKind::ConstructedWall,
        })
    }

    #[test]
    fn patches_on_same_object_coalesce() {
        let mut buffer = MutationBuffer::new(RoomName::from("W1N1"), 7);
        let id = ObjectId::from("a");
        buffer.patch(&id, ObjectPatch::hits(90));
        buffer.patch(&id, ObjectPatch::hits(40));

        let batch = buffer.batch();
        assert_eq!(batch.changes.len(), 1);
        assert_eq!(buffer.pending_patch(&id).and_then(|p| p.hits), Some(40));
    }

    #[test]
    fn patch_after_upsert_folds_into_document() {
        let mut buffer = MutationBuffer::new(RoomName::from("W1N1"), 7);
        let id = ObjectId::from("w");
        buffer.upsert(wall("w"));
        buffer.patch(&id, ObjectPatch::hits(10));

        match buffer.pending(&id) {
            Some(PendingChange::Upsert { object }) => assert_eq!(object.hits(), Some(10)),
            other => panic!("unexpected pending change {other:?}"),
        }
    }

    #[test]
    fn removal_is_terminal() {
        let mut buffer = MutationBuffer::new(RoomName::from("W1N1"), 7);
        let id = ObjectId::from("w");
        assert!(buffer.remove(&id));
        assert!(!buffer.remove(&id));
        buffer.patch(&id, ObjectPatch::hits(10));
        buffer.upsert(wall("w"));

        assert!(buffer.is_marked_for_removal(&id));
        assert_eq!(buffer.pending(&id), Some(&PendingChange::Remove));
        assert_eq!(buffer.fate(&id), ObjectFate::Removed);
    }

    #[test]
    fn fate_never_moves_backwards() {
        let mut buffer = MutationBuffer::new(RoomName::from("W1N1"), 7);
        let id = ObjectId::from("c");
        assert!(buffer.transition(&id, ObjectFate::Moved));
        assert!(buffer.transition(&id, ObjectFate::Killed));
        assert!(!buffer.transition(&id, ObjectFate::Moved));
        assert!(!buffer.transition(&id, ObjectFate::Killed));
        assert_eq!(buffer.fate(&id), ObjectFate::Killed);
    }

    #[test]
    fn cancelled_flush_keeps_buffer() {
        let store = crate::MemoryStore::new();
        let source = crate::CancelSource::new();
        let token = source.token();
        source.cancel();

        let mut buffer = MutationBuffer::new(RoomName::from("W1N1"), 7);
        buffer.patch(&ObjectId::from("a"), ObjectPatch::hits(1));

        let result = tokio_test::block_on(buffer.flush(&store, &token));
        assert!(matches!(result, Err(EngineError::Cancelled)));
        assert_eq!(buffer.len(), 1);
        assert!(tokio_test::block_on(store.room(&RoomName::from("W1N1"))).is_none());
    }

    #[test]
    fn flush_commits_and_resets() {
        let store = crate::MemoryStore::new();
        let mut state = crate::RoomState::new(RoomName::from("W1N1"), 7, crate::Terrain::plain(10));
        state.insert(wall("w"));
        tokio_test::block_on(store.seed(&state));

        let mut buffer = MutationBuffer::new(RoomName::from("W1N1"), 7);
        buffer.patch(&ObjectId::from("w"), ObjectPatch::hits(55));
        let batch = tokio_test::block_on(buffer.flush(&store, &CancelToken::never())).unwrap();

        assert_eq!(batch.changes.len(), 1);
        assert!(buffer.is_empty());
        let stored = tokio_test::block_on(store.object(&state.room, &ObjectId::from("w")));
        assert_eq!(stored.and_then(|o| o.hits()), Some(55));
    }
}
