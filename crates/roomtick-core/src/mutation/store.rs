use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{GlobalEnvelope, GlobalMutation, MapView, ObjectPatch, RoomEvent, RoomInfoPatch};
use crate::{ObjectId, RoomEntity, RoomName, RoomObject, RoomState, StoreError, UserId};

/// Buffered effect on one object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PendingChange {
    Upsert { object: RoomObject },
    Patch { patch: ObjectPatch },
    Remove,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectChange {
    pub id: ObjectId,
    #[serde(flatten)]
    pub change: PendingChange,
}

/// Everything one room tick hands to durable storage, in one piece.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomBatch {
    pub room: RoomName,
    pub tick: u64,
    pub changes: Vec<ObjectChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_info: Option<RoomInfoPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_log: Option<Vec<RoomEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_view: Option<MapView>,
}

/// Durable storage for committed ticks. A batch is applied whole or not at
/// all.
#[async_trait]
pub trait MutationStore: Send + Sync {
    async fn commit_room(&self, batch: RoomBatch) -> Result<(), StoreError>;

    /// Applies the drained cross-room queue, in the order given.
    async fn apply_global(&self, envelopes: &[GlobalEnvelope]) -> Result<(), StoreError>;
}

#[derive(Clone, Debug, Default)]
pub struct StoredRoom {
    pub objects: BTreeMap<ObjectId, RoomObject>,
    pub info: Option<RoomInfoPatch>,
    pub event_log: Vec<RoomEvent>,
    pub map_view: Option<MapView>,
    pub last_tick: Option<u64>,
}

/// In-process store used by the CLI and tests. Rooms must be seeded before
/// their first commit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rooms: Mutex<BTreeMap<RoomName, StoredRoom>>,
    money: Mutex<BTreeMap<UserId, i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, state: &RoomState) {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.entry(state.room.clone()).or_default();
        room.objects = state.objects.clone();
    }

    pub async fn room(&self, name: &RoomName) -> Option<StoredRoom> {
        self.rooms.lock().await.get(name).cloned()
    }

    pub async fn object(&self, name: &RoomName, id: &ObjectId) -> Option<RoomObject> {
        let rooms = self.rooms.lock().await;
        rooms.get(name).and_then(|r| r.objects.get(id)).cloned()
    }

    pub async fn user_money(&self, user: &UserId) -> i64 {
        self.money.lock().await.get(user).copied().unwrap_or(0)
    }
}

#[async_trait]
impl MutationStore for MemoryStore {
    async fn commit_room(&self, batch: RoomBatch) -> Result<(), StoreError> {
        let mut rooms = self.rooms.lock().await;
        let Some(room) = rooms.get_mut(&batch.room) else {
            return Err(StoreError::UnknownRoom(batch.room));
        };

        for ObjectChange { id, change } in batch.changes {
            match change {
                PendingChange::Upsert { object } => {
                    room.objects.insert(id, object);
                }
                PendingChange::Patch { patch } => {
                    if let Some(object) = room.objects.get_mut(&id) {
                        patch.apply_to(object);
                    }
                }
                PendingChange::Remove => {
                    room.objects.remove(&id);
                }
            }
        }

        if let Some(info) = batch.room_info {
            room.info = Some(info);
        }
        if let Some(log) = batch.event_log {
            room.event_log = log;
        }
        if let Some(view) = batch.map_view {
            room.map_view = Some(view);
        }
        room.last_tick = Some(batch.tick);
        Ok(())
    }

    /// Applies cross-room mutations in queue order. Objects patched with a
    /// new room are moved into that room's document set.
    async fn apply_global(&self, envelopes: &[GlobalEnvelope]) -> Result<(), StoreError> {
        let mut rooms = self.rooms.lock().await;
        for envelope in envelopes {
            match &envelope.mutation {
                GlobalMutation::PatchRoomObject { id, patch } => {
                    let Some(current_room) = rooms
                        .iter()
                        .find(|(_, r)| r.objects.contains_key(id))
                        .map(|(name, _)| name.clone())
                    else {
                        tracing::debug!(object = %id, "Global patch for unknown object");
                        continue;
                    };
                    let Some(mut object) = rooms
                        .get_mut(&current_room)
                        .and_then(|r| r.objects.remove(id))
                    else {
                        continue;
                    };
                    patch.apply_to(&mut object);
                    let target = patch.room.clone().unwrap_or(current_room);
                    rooms
                        .entry(target)
                        .or_default()
                        .objects
                        .insert(id.clone(), object);
                }
                GlobalMutation::UpsertRoomObject { room, object } => {
                    rooms
                        .entry(room.clone())
                        .or_default()
                        .objects
                        .insert(object.id().clone(), object.clone());
                }
                GlobalMutation::RemoveRoomObject { id } => {
                    for room in rooms.values_mut() {
                        room.objects.remove(id);
                    }
                }
                GlobalMutation::AdjustUserMoney { user, delta } => {
                    *self.money.lock().await.entry(user.clone()).or_default() += delta;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GlobalMutationQueue, ObjectPatch, Position, Terrain};

    #[tokio::test]
    async fn commit_to_unknown_room_fails() {
        let store = MemoryStore::new();
        let batch = RoomBatch {
            room: RoomName::from("W9N9"),
            tick: 1,
            changes: Vec::new(),
            room_info: None,
            event_log: None,
            map_view: None,
        };
        assert!(matches!(
            store.commit_room(batch).await,
            Err(StoreError::UnknownRoom(_))
        ));
    }

    #[tokio::test]
    async fn global_patch_moves_object_between_rooms() {
        let store = MemoryStore::new();
        let mut state = RoomState::new(RoomName::from("E0S0"), 3, Terrain::plain(50));
        let resource = crate::ResourceDrop {
            id: ObjectId::from("r1"),
            pos: Position::new(0, 0),
            resource_type: "energy".to_string(),
            amount: 5,
        };
        state.insert(RoomObject::Resource(resource.clone()));
        store.seed(&state).await;

        let mut queue = GlobalMutationQueue::new();
        let mut sink = queue.sink(state.room.clone());
        sink.patch_room_object(
            ObjectId::from("r1"),
            ObjectPatch {
                room: Some(RoomName::from("W0S0")),
                ..ObjectPatch::default()
            },
        );
        sink.adjust_user_money(UserId::from("alice"), -25);
        store.apply_global(&queue.drain()).await.unwrap();

        assert!(store.object(&state.room, &resource.id).await.is_none());
        assert_eq!(
            store.object(&RoomName::from("W0S0"), &resource.id).await,
            Some(RoomObject::Resource(resource))
        );
        assert_eq!(store.user_money(&UserId::from("alice")).await, -25);
    }
}
