use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ObjectId, Position, UserId};

/// Room-level fields written once per tick.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfoPatch {
    pub last_tick: u64,
    /// Whether any creep remains in the room after this tick.
    pub active: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttackType {
    Melee,
    Ranged,
    RangedMass,
    HitBack,
    Tower,
}

/// Entry in the per-tick room event log shown to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum RoomEvent {
    #[serde(rename_all = "camelCase")]
    Attack {
        object_id: ObjectId,
        target_id: ObjectId,
        damage: u32,
        attack_type: AttackType,
    },
    #[serde(rename_all = "camelCase")]
    ObjectDestroyed {
        object_id: ObjectId,
        object_type: String,
    },
}

/// Coarse end-of-tick picture of the room for the world map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapView {
    #[serde(default)]
    pub users: BTreeMap<UserId, Vec<Position>>,
    #[serde(default)]
    pub walls: Vec<Position>,
    #[serde(default)]
    pub roads: Vec<Position>,
    #[serde(default)]
    pub portals: Vec<Position>,
    #[serde(default)]
    pub sources: Vec<Position>,
    #[serde(default)]
    pub minerals: Vec<Position>,
    #[serde(default)]
    pub controllers: Vec<Position>,
}
