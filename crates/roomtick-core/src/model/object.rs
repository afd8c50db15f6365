use serde::{Deserialize, Serialize};

use crate::{ActionLog, BodyPart, ObjectId, Position, RoomName, Store, UserId};

fn default_true() -> bool {
    true
}

/// Shared shape of every room entity: identity, location and (optionally)
/// ownership and hit points.
pub trait RoomEntity {
    fn id(&self) -> &ObjectId;
    fn pos(&self) -> Position;

    fn owner(&self) -> Option<&UserId> {
        None
    }

    fn hits(&self) -> Option<u32> {
        None
    }
}

macro_rules! impl_entity {
    ($($ty:ty),* $(,)?) => {
        $(
            impl RoomEntity for $ty {
                fn id(&self) -> &ObjectId {
                    &self.id
                }

                fn pos(&self) -> Position {
                    self.pos
                }
            }
        )*
    };
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creep {
    pub id: ObjectId,
    pub name: String,
    pub owner: UserId,
    pub pos: Position,
    pub hits: u32,
    pub hits_max: u32,
    #[serde(default)]
    pub fatigue: u32,
    #[serde(default)]
    pub body: Vec<BodyPart>,
    #[serde(default)]
    pub store: Store,
    #[serde(default)]
    pub ticks_to_live: Option<u32>,
    #[serde(default)]
    pub spawning: bool,
    #[serde(default = "default_true")]
    pub notify_when_attacked: bool,
    #[serde(default)]
    pub action_log: ActionLog,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerCreep {
    pub id: ObjectId,
    pub name: String,
    pub owner: UserId,
    pub pos: Position,
    pub hits: u32,
    pub hits_max: u32,
    #[serde(default)]
    pub store: Store,
    #[serde(default = "default_true")]
    pub notify_when_attacked: bool,
    #[serde(default)]
    pub action_log: ActionLog,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "structureType", rename_all = "camelCase")]
pub enum StructureKind {
    Spawn,
    Extension,
    Road,
    ConstructedWall,
    Rampart {
        #[serde(default, rename = "isPublic")]
        is_public: bool,
    },
    Link,
    Storage,
    Tower,
    Observer,
    PowerSpawn,
    Extractor,
    Lab,
    Terminal,
    Container,
    Nuker,
    Factory,
    KeeperLair,
    InvaderCore,
    PowerBank,
}

impl StructureKind {
    /// Name used in configuration and in event logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            StructureKind::Spawn => "spawn",
            StructureKind::Extension => "extension",
            StructureKind::Road => "road",
            StructureKind::ConstructedWall => "constructedWall",
            StructureKind::Rampart { .. } => "rampart",
            StructureKind::Link => "link",
            StructureKind::Storage => "storage",
            StructureKind::Tower => "tower",
            StructureKind::Observer => "observer",
            StructureKind::PowerSpawn => "powerSpawn",
            StructureKind::Extractor => "extractor",
            StructureKind::Lab => "lab",
            StructureKind::Terminal => "terminal",
            StructureKind::Container => "container",
            StructureKind::Nuker => "nuker",
            StructureKind::Factory => "factory",
            StructureKind::KeeperLair => "keeperLair",
            StructureKind::InvaderCore => "invaderCore",
            StructureKind::PowerBank => "powerBank",
        }
    }

    /// Whether no creep may ever stand on this structure. Ramparts are
    /// judged per mover (owner / public flag), roads and containers are
    /// walkable.
    pub fn is_obstacle(&self) -> bool {
        !matches!(
            self,
            StructureKind::Road
                | StructureKind::Rampart { .. }
                | StructureKind::Container
                | StructureKind::Extractor
                | StructureKind::KeeperLair
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Structure {
    pub id: ObjectId,
    pub pos: Position,
    pub hits: u32,
    pub hits_max: u32,
    #[serde(default)]
    pub owner: Option<UserId>,
    #[serde(default)]
    pub store: Store,
    #[serde(default = "default_true")]
    pub notify_when_attacked: bool,
    #[serde(default)]
    pub action_log: ActionLog,
    #[serde(flatten)]
    pub kind: StructureKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Controller {
    pub id: ObjectId,
    pub pos: Position,
    #[serde(default)]
    pub owner: Option<UserId>,
    #[serde(default)]
    pub level: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDrop {
    pub id: ObjectId,
    pub pos: Position,
    pub resource_type: String,
    pub amount: u32,
}

/// Where a portal leads. Inter-shard portals name a shard and usually no
/// exact tile, in which case the traveller keeps its coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalDestination {
    pub room: RoomName,
    #[serde(default)]
    pub pos: Option<Position>,
    #[serde(default)]
    pub shard: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portal {
    pub id: ObjectId,
    pub pos: Position,
    pub destination: PortalDestination,
    #[serde(default)]
    pub decay_time: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nuke {
    pub id: ObjectId,
    pub pos: Position,
    pub launch_room: RoomName,
    pub land_time: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ruin {
    pub id: ObjectId,
    pub pos: Position,
    pub structure_type: String,
    #[serde(default)]
    pub store: Store,
    pub destroy_time: u64,
    pub decay_time: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tombstone {
    pub id: ObjectId,
    pub pos: Position,
    pub creep_id: ObjectId,
    pub creep_name: String,
    #[serde(default)]
    pub owner: Option<UserId>,
    #[serde(default)]
    pub store: Store,
    pub death_time: u64,
    pub decay_time: u64,
    #[serde(default)]
    pub killed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: ObjectId,
    pub pos: Position,
    pub energy: u32,
    pub energy_capacity: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mineral {
    pub id: ObjectId,
    pub pos: Position,
    pub mineral_type: String,
    pub amount: u32,
}

impl_entity!(
    Controller,
    ResourceDrop,
    Portal,
    Nuke,
    Ruin,
    Tombstone,
    Source,
    Mineral,
);

impl RoomEntity for Creep {
    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn pos(&self) -> Position {
        self.pos
    }

    fn owner(&self) -> Option<&UserId> {
        Some(&self.owner)
    }

    fn hits(&self) -> Option<u32> {
        Some(self.hits)
    }
}

impl RoomEntity for PowerCreep {
    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn pos(&self) -> Position {
        self.pos
    }

    fn owner(&self) -> Option<&UserId> {
        Some(&self.owner)
    }

    fn hits(&self) -> Option<u32> {
        Some(self.hits)
    }
}

impl RoomEntity for Structure {
    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn pos(&self) -> Position {
        self.pos
    }

    fn owner(&self) -> Option<&UserId> {
        self.owner.as_ref()
    }

    fn hits(&self) -> Option<u32> {
        Some(self.hits)
    }
}

/// Every kind of entity a room can hold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RoomObject {
    Creep(Creep),
    PowerCreep(PowerCreep),
    Structure(Structure),
    Controller(Controller),
    Resource(ResourceDrop),
    Portal(Portal),
    Nuke(Nuke),
    Ruin(Ruin),
    Tombstone(Tombstone),
    Source(Source),
    Mineral(Mineral),
}

impl RoomObject {
    fn entity(&self) -> &dyn RoomEntity {
        match self {
            RoomObject::Creep(o) => o,
            RoomObject::PowerCreep(o) => o,
            RoomObject::Structure(o) => o,
            RoomObject::Controller(o) => o,
            RoomObject::Resource(o) => o,
            RoomObject::Portal(o) => o,
            RoomObject::Nuke(o) => o,
            RoomObject::Ruin(o) => o,
            RoomObject::Tombstone(o) => o,
            RoomObject::Source(o) => o,
            RoomObject::Mineral(o) => o,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            RoomObject::Creep(_) => "creep",
            RoomObject::PowerCreep(_) => "powerCreep",
            RoomObject::Structure(s) => s.kind.type_name(),
            RoomObject::Controller(_) => "controller",
            RoomObject::Resource(_) => "resource",
            RoomObject::Portal(_) => "portal",
            RoomObject::Nuke(_) => "nuke",
            RoomObject::Ruin(_) => "ruin",
            RoomObject::Tombstone(_) => "tombstone",
            RoomObject::Source(_) => "source",
            RoomObject::Mineral(_) => "mineral",
        }
    }

    /// Creeps and power creeps: the objects that move and that die through
    /// the death processor rather than by plain removal.
    pub fn is_creep_like(&self) -> bool {
        matches!(self, RoomObject::Creep(_) | RoomObject::PowerCreep(_))
    }

    pub fn as_creep(&self) -> Option<&Creep> {
        match self {
            RoomObject::Creep(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_structure(&self) -> Option<&Structure> {
        match self {
            RoomObject::Structure(s) => Some(s),
            _ => None,
        }
    }

    pub fn store(&self) -> Option<&Store> {
        match self {
            RoomObject::Creep(c) => Some(&c.store),
            RoomObject::PowerCreep(c) => Some(&c.store),
            RoomObject::Structure(s) => Some(&s.store),
            RoomObject::Ruin(r) => Some(&r.store),
            RoomObject::Tombstone(t) => Some(&t.store),
            _ => None,
        }
    }

    pub fn action_log(&self) -> Option<&ActionLog> {
        match self {
            RoomObject::Creep(c) => Some(&c.action_log),
            RoomObject::PowerCreep(c) => Some(&c.action_log),
            RoomObject::Structure(s) => Some(&s.action_log),
            _ => None,
        }
    }

    pub fn notify_when_attacked(&self) -> bool {
        match self {
            RoomObject::Creep(c) => c.notify_when_attacked,
            RoomObject::PowerCreep(c) => c.notify_when_attacked,
            RoomObject::Structure(s) => s.notify_when_attacked,
            _ => false,
        }
    }

    pub fn body(&self) -> Option<&[BodyPart]> {
        match self {
            RoomObject::Creep(c) => Some(&c.body),
            _ => None,
        }
    }
}

impl RoomEntity for RoomObject {
    fn id(&self) -> &ObjectId {
        self.entity().id()
    }

    fn pos(&self) -> Position {
        self.entity().pos()
    }

    fn owner(&self) -> Option<&UserId> {
        self.entity().owner()
    }

    fn hits(&self) -> Option<u32> {
        self.entity().hits()
    }
}
