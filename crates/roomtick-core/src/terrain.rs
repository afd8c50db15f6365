use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Position;

pub const DEFAULT_ROOM_SIZE: i32 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TerrainKind {
    Plain,
    Swamp,
    Wall,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TerrainError {
    #[error("terrain length {0} is not a square grid")]
    NotSquare(usize),
    #[error("invalid terrain digit {digit:?} at index {index}")]
    InvalidDigit { index: usize, digit: char },
}

/// Row-major terrain grid. Serialized as one digit per tile:
/// `0` plain, `1` wall, `2` swamp, `3` wall (swamp under wall).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Terrain {
    size: i32,
    tiles: Vec<TerrainKind>,
}

impl Terrain {
    pub fn plain(size: i32) -> Self {
        let size = size.max(1);
        Self {
            size,
            tiles: vec![TerrainKind::Plain; (size * size) as usize],
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn get(&self, pos: Position) -> Option<TerrainKind> {
        self.index(pos).map(|i| self.tiles[i])
    }

    pub fn set(&mut self, pos: Position, kind: TerrainKind) {
        if let Some(i) = self.index(pos) {
            self.tiles[i] = kind;
        }
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        matches!(self.get(pos), Some(TerrainKind::Wall))
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if !pos.in_bounds(self.size) {
            return None;
        }
        Some((pos.y * self.size + pos.x) as usize)
    }
}

impl Default for Terrain {
    fn default() -> Self {
        Self::plain(DEFAULT_ROOM_SIZE)
    }
}

impl TryFrom<String> for Terrain {
    type Error = TerrainError;

    fn try_from(encoded: String) -> Result<Self, Self::Error> {
        let len = encoded.chars().count();
        let size = (len as f64).sqrt() as usize;
        if size == 0 || size * size != len {
            return Err(TerrainError::NotSquare(len));
        }

        let mut tiles = Vec::with_capacity(len);
        for (index, digit) in encoded.chars().enumerate() {
            let kind = match digit {
                '0' => TerrainKind::Plain,
                '1' | '3' => TerrainKind::Wall,
                '2' => TerrainKind::Swamp,
                _ => return Err(TerrainError::InvalidDigit { index, digit }),
            };
            tiles.push(kind);
        }

        Ok(Self {
            size: size as i32,
            tiles,
        })
    }
}

impl From<Terrain> for String {
    fn from(terrain: Terrain) -> String {
        terrain
            .tiles
            .iter()
            .map(|kind| match kind {
                TerrainKind::Plain => '0',
                TerrainKind::Wall => '1',
                TerrainKind::Swamp => '2',
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_square_grid() {
        let terrain = Terrain::try_from("0120".to_string()).unwrap();
        assert_eq!(terrain.size(), 2);
        assert_eq!(terrain.get(Position::new(1, 0)), Some(TerrainKind::Wall));
        assert_eq!(terrain.get(Position::new(0, 1)), Some(TerrainKind::Swamp));
        assert_eq!(terrain.get(Position::new(2, 0)), None);
        assert_eq!(String::from(terrain), "0120");
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            Terrain::try_from("012".to_string()),
            Err(TerrainError::NotSquare(3))
        );
        assert!(matches!(
            Terrain::try_from("0x00".to_string()),
            Err(TerrainError::InvalidDigit { index: 1, .. })
        ));
    }
}
