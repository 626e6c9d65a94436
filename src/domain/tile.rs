//! One grid cell of the maze.

use crate::description::TileWalls;

use super::Direction;

/// Distance value of a tile the breadth-first pass never reached.
pub const UNREACHED: i32 = -1;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Tile {
    x: i32,
    y: i32,
    walls: [bool; 4],
    distance: i32,
}

impl Tile {
    pub(crate) fn new(x: i32, y: i32, walls: TileWalls) -> Self {
        Self {
            x,
            y,
            // Indexed by Direction's declaration order.
            walls: [
                walls.is_wall(Direction::North),
                walls.is_wall(Direction::East),
                walls.is_wall(Direction::South),
                walls.is_wall(Direction::West),
            ],
            distance: UNREACHED,
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn is_wall(&self, direction: Direction) -> bool {
        self.walls[direction as usize]
    }

    /// Open-path hops from the nearest center tile, or [`UNREACHED`].
    pub fn distance(&self) -> i32 {
        self.distance
    }

    pub(crate) fn set_distance(&mut self, distance: i32) {
        self.distance = distance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_walls() {
        let tile = Tile::new(
            2,
            3,
            TileWalls {
                north: true,
                east: false,
                south: false,
                west: true,
            },
        );
        assert_eq!(tile.x(), 2);
        assert_eq!(tile.y(), 3);
        assert!(tile.is_wall(Direction::North));
        assert!(!tile.is_wall(Direction::East));
        assert!(!tile.is_wall(Direction::South));
        assert!(tile.is_wall(Direction::West));
        assert_eq!(tile.distance(), UNREACHED);
    }
}
