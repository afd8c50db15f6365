//! Static tile rules: terrain, structures, portals and room edges.

use std::collections::BTreeMap;

use super::claims::{Mover, Target};
use crate::{
    EngineConfig, ExitTarget, ExitTopology, ObjectId, PendingView, Portal, Position, RoomEntity,
    RoomObject, StructureKind, Terrain, UserId,
};

/// Result of one mover's claim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Move(Position),
    Stay,
    Crash,
    /// Leaves the room through an edge or a portal.
    Transfer(ExitTarget),
}

impl Outcome {
    /// Whether the mover's current tile is free for others afterwards.
    pub fn vacates(&self) -> bool {
        matches!(self, Outcome::Move(_) | Outcome::Transfer(_))
    }
}

#[derive(Clone, Debug, Default)]
struct Tile {
    obstacle: bool,
    /// (owner, public)
    ramparts: Vec<(Option<UserId>, bool)>,
    fatal: bool,
    portal: Option<ExitTarget>,
    occupants: Vec<ObjectId>,
}

impl Tile {
    fn blocks(&self, owner: Option<&UserId>) -> bool {
        self.obstacle
            || self
                .ramparts
                .iter()
                .any(|(rampart_owner, public)| {
                    !public && (owner.is_none() || rampart_owner.as_ref() != owner)
                })
    }
}

/// Per-tile facts about the room as the movement step finds it.
pub(crate) struct Board<'a> {
    size: i32,
    terrain: &'a Terrain,
    exits: &'a ExitTopology,
    tiles: BTreeMap<Position, Tile>,
}

impl<'a> Board<'a> {
    pub fn build(
        view: &PendingView<'_>,
        terrain: &'a Terrain,
        exits: &'a ExitTopology,
        config: &EngineConfig,
    ) -> Self {
        let mut tiles: BTreeMap<Position, Tile> = BTreeMap::new();
        for object in view.objects() {
            let tile = tiles.entry(object.pos()).or_default();
            match &*object {
                RoomObject::Creep(_) | RoomObject::PowerCreep(_) => {
                    tile.occupants.push(object.id().clone());
                }
                RoomObject::Structure(structure) => {
                    if config.is_fatal_structure(structure.kind.type_name()) {
                        tile.fatal = true;
                    }
                    match &structure.kind {
                        StructureKind::Rampart { is_public } => {
                            tile.ramparts.push((structure.owner.clone(), *is_public));
                        }
                        kind if kind.is_obstacle() => tile.obstacle = true,
                        _ => {}
                    }
                }
                RoomObject::Portal(portal) => tile.portal = Some(portal_target(portal)),
                // Sources, minerals and controllers are impassable too.
                RoomObject::Source(_) | RoomObject::Mineral(_) | RoomObject::Controller(_) => {
                    tile.obstacle = true;
                }
                _ => {}
            }
        }
        Self {
            size: terrain.size(),
            terrain,
            exits,
            tiles,
        }
    }

    pub fn occupants(&self, pos: Position) -> &[ObjectId] {
        self.tiles
            .get(&pos)
            .map(|t| t.occupants.as_slice())
            .unwrap_or_default()
    }

    pub fn portal_at(&self, pos: Position) -> Option<&ExitTarget> {
        self.tiles.get(&pos).and_then(|t| t.portal.as_ref())
    }

    /// Outcome of `target` ignoring other movers: edges, fatal tiles,
    /// blocking terrain or structures, portals.
    pub fn classify(&self, mover: &Mover, target: Target) -> Outcome {
        if !target.to.in_bounds(self.size) {
            return match self.exits.resolve(target.to, self.size) {
                Some(exit) => Outcome::Transfer(exit),
                None => Outcome::Crash,
            };
        }

        let tile = self.tiles.get(&target.to);
        if tile.is_some_and(|t| t.fatal) {
            return Outcome::Crash;
        }

        let blocked = self.terrain.is_wall(target.to)
            || tile.is_some_and(|t| t.blocks(mover.owner.as_ref()));
        if blocked {
            return if target.direct {
                Outcome::Crash
            } else {
                Outcome::Stay
            };
        }

        if let Some(portal) = tile.and_then(|t| t.portal.as_ref()) {
            return if mover.power_creep {
                Outcome::Crash
            } else {
                Outcome::Transfer(portal.clone())
            };
        }

        Outcome::Move(target.to)
    }
}

fn portal_target(portal: &Portal) -> ExitTarget {
    ExitTarget {
        room: portal.destination.room.clone(),
        shard: portal.destination.shard.clone(),
        pos: portal.destination.pos.unwrap_or(portal.pos),
    }
}
