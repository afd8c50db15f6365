use serde::{Deserialize, Serialize};

/// Tile coordinate inside a room. Signed so that a step off the edge can be
/// represented before it is resolved against the exit topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn in_bounds(self, size: i32) -> bool {
        self.x >= 0 && self.y >= 0 && self.x < size && self.y < size
    }

    /// Chebyshev distance, the range metric for every ranged check.
    #[inline]
    pub fn range_to(self, other: Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    #[inline]
    pub fn is_adjacent(self, other: Position) -> bool {
        self != other && self.range_to(other) <= 1
    }

    #[inline]
    pub fn step(self, direction: Direction) -> Position {
        let (dx, dy) = direction.delta();
        Position {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// The eight compass directions, numbered clockwise from the top like the
/// player API does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Direction {
    Top = 1,
    TopRight = 2,
    Right = 3,
    BottomRight = 4,
    Bottom = 5,
    BottomLeft = 6,
    Left = 7,
    TopLeft = 8,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Top,
        Direction::TopRight,
        Direction::Right,
        Direction::BottomRight,
        Direction::Bottom,
        Direction::BottomLeft,
        Direction::Left,
        Direction::TopLeft,
    ];

    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Top => (0, -1),
            Direction::TopRight => (1, -1),
            Direction::Right => (1, 0),
            Direction::BottomRight => (1, 1),
            Direction::Bottom => (0, 1),
            Direction::BottomLeft => (-1, 1),
            Direction::Left => (-1, 0),
            Direction::TopLeft => (-1, -1),
        }
    }

    /// Direction that moves `from` onto the adjacent tile `to`.
    pub fn between(from: Position, to: Position) -> Option<Direction> {
        if !from.is_adjacent(to) {
            return None;
        }
        let delta = (to.x - from.x, to.y - from.y);
        Self::ALL.into_iter().find(|d| d.delta() == delta)
    }
}

impl TryFrom<u8> for Direction {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(Direction::Top),
            2 => Ok(Direction::TopRight),
            3 => Ok(Direction::Right),
            4 => Ok(Direction::BottomRight),
            5 => Ok(Direction::Bottom),
            6 => Ok(Direction::BottomLeft),
            7 => Ok(Direction::Left),
            8 => Ok(Direction::TopLeft),
            other => Err(format!("invalid direction {other}")),
        }
    }
}

impl From<Direction> for u8 {
    fn from(direction: Direction) -> u8 {
        direction as u8
    }
}

/// Room edge crossed by an out-of-bounds step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    /// Edge crossed by `pos`, if it lies outside a `size` x `size` room.
    /// Corner overshoots cross two edges at once and have no single answer.
    pub fn crossed_by(pos: Position, size: i32) -> Option<Edge> {
        let horizontal = if pos.x < 0 {
            Some(Edge::Left)
        } else if pos.x >= size {
            Some(Edge::Right)
        } else {
            None
        };
        let vertical = if pos.y < 0 {
            Some(Edge::Top)
        } else if pos.y >= size {
            Some(Edge::Bottom)
        } else {
            None
        };
        match (horizontal, vertical) {
            (Some(edge), None) | (None, Some(edge)) => Some(edge),
            _ => None,
        }
    }

    /// Entry tile in the neighbouring room: the coordinate is mirrored across
    /// the crossed edge, the other axis is kept.
    pub fn mirror(self, pos: Position, size: i32) -> Position {
        match self {
            Edge::Left => Position::new(size - 1, pos.y),
            Edge::Right => Position::new(0, pos.y),
            Edge::Top => Position::new(pos.x, size - 1),
            Edge::Bottom => Position::new(pos.x, 0),
        }
    }
}
