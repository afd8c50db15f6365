//! Neighbouring rooms, one per edge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Edge, Position, RoomName, Terrain};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitDescriptor {
    pub room: RoomName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard: Option<String>,
    #[serde(default)]
    pub accessible: bool,
}

impl ExitDescriptor {
    pub fn open(room: impl Into<RoomName>) -> Self {
        Self {
            room: room.into(),
            shard: None,
            accessible: true,
        }
    }
}

/// Where a boundary crossing lands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExitTarget {
    pub room: RoomName,
    pub shard: Option<String>,
    pub pos: Position,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExitTopology {
    edges: BTreeMap<Edge, ExitDescriptor>,
}

impl ExitTopology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, edge: Edge, exit: ExitDescriptor) -> Self {
        self.edges.insert(edge, exit);
        self
    }

    pub fn get(&self, edge: Edge) -> Option<&ExitDescriptor> {
        self.edges.get(&edge)
    }

    /// Neighbours derived from a world-grid name such as `W3N7`. An edge is
    /// accessible when at least one of its tiles is not a wall.
    pub fn from_grid(room: &RoomName, terrain: &Terrain) -> Self {
        let Some(coord) = GridCoord::parse(room.as_str()) else {
            return Self::default();
        };
        let size = terrain.size();
        let mut topology = Self::default();
        for edge in [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left] {
            let accessible = (0..size).any(|i| {
                let pos = match edge {
                    Edge::Top => Position::new(i, 0),
                    Edge::Bottom => Position::new(i, size - 1),
                    Edge::Left => Position::new(0, i),
                    Edge::Right => Position::new(size - 1, i),
                };
                !terrain.is_wall(pos)
            });
            topology.edges.insert(
                edge,
                ExitDescriptor {
                    room: RoomName::new(coord.neighbour(edge).to_string()),
                    shard: None,
                    accessible,
                },
            );
        }
        topology
    }

    /// Resolves an out-of-bounds destination. `None` means the crossing is
    /// impossible: a corner overshoot, an unknown edge or a closed exit.
    pub fn resolve(&self, pos: Position, size: i32) -> Option<ExitTarget> {
        let edge = Edge::crossed_by(pos, size)?;
        let exit = self.edges.get(&edge).filter(|exit| exit.accessible)?;
        Some(ExitTarget {
            room: exit.room.clone(),
            shard: exit.shard.clone(),
            pos: edge.mirror(pos, size),
        })
    }
}

/// World-grid coordinate. West and north count from zero away from the
/// origin, so `W0` sits next to `E0` and `N0` next to `S0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct GridCoord {
    x: i64,
    y: i64,
}

impl GridCoord {
    fn parse(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        let split = bytes.iter().skip(1).position(|b| matches!(b, b'N' | b'S'))? + 1;
        let (horizontal, vertical) = name.split_at(split);
        let x = axis(horizontal, 'W', 'E')?;
        let y = axis(vertical, 'N', 'S')?;
        Some(Self { x, y })
    }

    fn neighbour(self, edge: Edge) -> Self {
        match edge {
            Edge::Top => Self { y: self.y - 1, ..self },
            Edge::Bottom => Self { y: self.y + 1, ..self },
            Edge::Left => Self { x: self.x - 1, ..self },
            Edge::Right => Self { x: self.x + 1, ..self },
        }
    }
}

fn axis(part: &str, negative: char, positive: char) -> Option<i64> {
    let mut chars = part.chars();
    let dir = chars.next()?;
    let digits = chars.as_str();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n = i64::from(digits.parse::<u32>().ok()?);
    if dir == negative {
        Some(-n - 1)
    } else if dir == positive {
        Some(n)
    } else {
        None
    }
}

impl std::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (h, x) = if self.x < 0 { ('W', -self.x - 1) } else { ('E', self.x) };
        let (v, y) = if self.y < 0 { ('N', -self.y - 1) } else { ('S', self.y) };
        write!(f, "{h}{x}{v}{y}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TerrainKind;

    #[test]
    fn resolve_mirrors_across_open_edge() {
        let topology = ExitTopology::new().with(Edge::Left, ExitDescriptor::open("W0S0"));
        let target = topology.resolve(Position::new(-1, 0), 50).unwrap();
        assert_eq!(target.room, RoomName::from("W0S0"));
        assert_eq!(target.pos, Position::new(49, 0));
        assert_eq!(target.shard, None);
    }

    #[test]
    fn closed_unknown_and_corner_crossings_fail() {
        let mut closed = ExitDescriptor::open("E1S0");
        closed.accessible = false;
        let topology = ExitTopology::new().with(Edge::Right, closed);

        assert!(topology.resolve(Position::new(50, 3), 50).is_none());
        assert!(topology.resolve(Position::new(3, -1), 50).is_none());
        assert!(topology.resolve(Position::new(-1, -1), 50).is_none());
    }

    #[test]
    fn grid_neighbours_cross_the_origin() {
        let mut terrain = Terrain::plain(3);
        for i in 0..3 {
            terrain.set(Position::new(i, 0), TerrainKind::Wall);
        }
        let topology = ExitTopology::from_grid(&RoomName::from("E0N0"), &terrain);

        assert_eq!(topology.get(Edge::Left).unwrap().room, RoomName::from("W0N0"));
        assert_eq!(topology.get(Edge::Bottom).unwrap().room, RoomName::from("E0S0"));
        assert_eq!(topology.get(Edge::Top).unwrap().room, RoomName::from("E0N1"));
        assert_eq!(topology.get(Edge::Right).unwrap().room, RoomName::from("E1N0"));
        assert!(!topology.get(Edge::Top).unwrap().accessible);
        assert!(topology.get(Edge::Left).unwrap().accessible);
    }

    #[test]
    fn unparseable_names_have_no_exits() {
        for name in [
            "sim",
            "W-5N0",
            "W+5N0",
            "W-9223372036854775808N0",
            "E99999999999S0",
            "WN0",
        ] {
            let topology = ExitTopology::from_grid(&RoomName::from(name), &Terrain::plain(5));
            assert!(topology.get(Edge::Left).is_none(), "{name} should not parse");
        }
    }
}
