//! Immutable per-tick room snapshot: objects, terrain, users and flags.

mod action_log;
mod body;
mod object;
mod room;
mod store;

pub use action_log::{ActionKind, ActionLog};
pub use body::{active_parts, body_hits, damage_body, BodyPart, BodyPartType, BODY_PART_HITS};
pub use object::{
    Controller, Creep, Mineral, Nuke, Portal, PortalDestination, PowerCreep, ResourceDrop,
    RoomEntity, RoomObject, Ruin, Source, Structure, StructureKind, Tombstone,
};
pub use room::{Flag, RoomInfo, RoomKind, RoomState, SnapshotError, UserState};
pub use store::{Store, RESOURCE_ENERGY};
