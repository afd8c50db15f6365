use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{IntentSnapshot, ObjectId, Position, RoomEntity, RoomName, RoomObject, Terrain, UserId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoomKind {
    #[default]
    Normal,
    Keeper,
    Neutral,
    Highway,
    Center,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    #[serde(default)]
    pub owner: Option<UserId>,
    #[serde(default)]
    pub controller_level: u8,
    #[serde(default)]
    pub kind: RoomKind,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    pub username: String,
    #[serde(default)]
    pub money: i64,
    #[serde(default)]
    pub gcl: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub name: String,
    pub user: UserId,
    pub pos: Position,
    #[serde(default)]
    pub color: u8,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("object stored under key {key} carries id {id}")]
    KeyMismatch { key: ObjectId, id: ObjectId },
    #[error("object {id} at ({x},{y}) lies outside the {size}x{size} room")]
    OutOfBounds { id: ObjectId, x: i32, y: i32, size: i32 },
}

/// Everything one tick of one room reads. Never mutated while the tick runs;
/// all effects go through the mutation buffer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    pub room: RoomName,
    pub tick: u64,
    #[serde(default)]
    pub info: RoomInfo,
    #[serde(default)]
    pub objects: BTreeMap<ObjectId, RoomObject>,
    #[serde(default)]
    pub users: BTreeMap<UserId, UserState>,
    #[serde(default)]
    pub intents: IntentSnapshot,
    #[serde(default)]
    pub terrain: Terrain,
    #[serde(default)]
    pub flags: Vec<Flag>,
}

impl RoomState {
    pub fn new(room: RoomName, tick: u64, terrain: Terrain) -> Self {
        Self {
            room,
            tick,
            info: RoomInfo::default(),
            objects: BTreeMap::new(),
            users: BTreeMap::new(),
            intents: IntentSnapshot::default(),
            terrain,
            flags: Vec::new(),
        }
    }

    pub fn size(&self) -> i32 {
        self.terrain.size()
    }

    pub fn insert(&mut self, object: RoomObject) {
        self.objects.insert(object.id().clone(), object);
    }

    pub fn object(&self, id: &ObjectId) -> Option<&RoomObject> {
        self.objects.get(id)
    }

    /// Objects on `pos`, in id order.
    pub fn objects_at(&self, pos: Position) -> impl Iterator<Item = &RoomObject> {
        self.objects.values().filter(move |o| o.pos() == pos)
    }

    /// Checks the invariants a loader must guarantee before a tick runs.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let size = self.size();
        for (key, object) in &self.objects {
            if key != object.id() {
                return Err(SnapshotError::KeyMismatch {
                    key: key.clone(),
                    id: object.id().clone(),
                });
            }
            let pos = object.pos();
            if !pos.in_bounds(size) {
                return Err(SnapshotError::OutOfBounds {
                    id: key.clone(),
                    x: pos.x,
                    y: pos.y,
                    size,
                });
            }
        }
        Ok(())
    }
}
