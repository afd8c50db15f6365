use std::borrow::Cow;

use super::{MutationBuffer, PendingChange};
use crate::{ObjectId, Position, RoomEntity, RoomObject, RoomState};

/// Read-only picture of the room as it stands after the changes buffered so
/// far: the snapshot with pending patches applied, upserts added, and
/// removed, dead or departed objects hidden.
#[derive(Clone, Copy)]
pub struct PendingView<'a> {
    state: &'a RoomState,
    buffer: &'a MutationBuffer,
}

impl<'a> PendingView<'a> {
    pub fn new(state: &'a RoomState, buffer: &'a MutationBuffer) -> Self {
        Self { state, buffer }
    }

    pub fn object(&self, id: &ObjectId) -> Option<Cow<'a, RoomObject>> {
        if self.buffer.fate(id).is_gone() {
            return None;
        }
        match self.buffer.pending(id) {
            Some(PendingChange::Remove) => None,
            Some(PendingChange::Upsert { object }) => Some(Cow::Borrowed(object)),
            Some(PendingChange::Patch { patch }) => {
                let mut object = self.state.object(id)?.clone();
                patch.apply_to(&mut object);
                Some(Cow::Owned(object))
            }
            None => self.state.object(id).map(Cow::Borrowed),
        }
    }

    pub fn is_alive(&self, id: &ObjectId) -> bool {
        self.object(id).is_some()
    }

    pub fn position(&self, id: &ObjectId) -> Option<Position> {
        self.object(id).map(|o| o.pos())
    }

    pub fn hits(&self, id: &ObjectId) -> Option<u32> {
        self.object(id).and_then(|o| o.hits())
    }

    /// Live objects in id order.
    pub fn objects(&self) -> impl Iterator<Item = Cow<'a, RoomObject>> + 'a {
        let view = *self;
        let upserted = view
            .buffer
            .upserted_ids()
            .filter(move |id| view.state.object(id).is_none());
        view.state
            .objects
            .keys()
            .chain(upserted)
            .filter_map(move |id| view.object(id))
    }

    pub fn objects_at(&self, pos: Position) -> impl Iterator<Item = Cow<'a, RoomObject>> + 'a {
        self.objects().filter(move |o| o.pos() == pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ObjectFate, ObjectPatch, RoomName, Structure, StructureKind, Terrain};

    fn room() -> RoomState {
        let mut state = RoomState::new(RoomName::from("W1N1"), 1, Terrain::plain(10));
        state.insert(RoomObject::Structure(Structure {
            id: ObjectId::from("s"),
            pos: Position::new(2, 2),
            hits: 100,
            hits_max: 100,
            owner: None,
            store: Default::default(),
            notify_when_attacked: false,
            action_log: Default::default(),
            kind: StructureKind::Tower,
        }));
        state
    }

    #[test]
    fn view_reflects_pending_patches_but_not_snapshot_mutation() {
        let state = room();
        let mut buffer = MutationBuffer::new(state.room.clone(), 1);
        let id = ObjectId::from("s");
        buffer.patch(&id, ObjectPatch::hits(30));

        let view = PendingView::new(&state, &buffer);
        assert_eq!(view.hits(&id), Some(30));
        assert_eq!(state.object(&id).and_then(|o| o.hits()), Some(100));
    }

    #[test]
    fn removed_and_departed_objects_are_hidden() {
        let state = room();
        let mut buffer = MutationBuffer::new(state.room.clone(), 1);
        let id = ObjectId::from("s");

        buffer.transition(&id, ObjectFate::Transferred);
        assert!(!PendingView::new(&state, &buffer).is_alive(&id));

        buffer.reset();
        buffer.remove(&id);
        let view = PendingView::new(&state, &buffer);
        assert!(!view.is_alive(&id));
        assert_eq!(view.objects().count(), 0);
    }
}
