//! Maze graph with a breadth-first distance field.

use std::collections::VecDeque;

use log::{debug, warn};
use nalgebra::Point2;
use thiserror::Error;

use crate::config::SimConfig;
use crate::description::WallDescription;

use super::tile::UNREACHED;
use super::{Angle, Direction, LineSegment, Tile};

/// Classification produced by the external structural checker.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum MazeValidity {
    Unexplorable,
    Explorable,
    Official,
}

#[derive(Error, Debug)]
pub enum MazeError {
    #[error("maze description is empty")]
    Empty,
    #[error("maze is not rectangular: column {column} has height {actual}, expected {expected}")]
    NotRectangular {
        column: usize,
        expected: usize,
        actual: usize,
    },
    #[error("maze is not explorable")]
    Unexplorable,
}

/// An immutable maze: tiles with wall flags and the distance field computed
/// at construction. Safe to share across threads without locking.
#[derive(Clone, Debug)]
pub struct Maze {
    tiles: Vec<Vec<Tile>>,
    is_valid: bool,
    is_official: bool,
    wall_segments: Vec<LineSegment>,
    config: SimConfig,
}

impl Maze {
    pub fn new(
        description: &WallDescription,
        validity: MazeValidity,
        config: SimConfig,
    ) -> Result<Maze, MazeError> {
        let maze = Self::build(description, validity, config);
        if let Err(error) = &maze {
            warn!("unable to build maze: {error}");
        }
        maze
    }

    fn build(
        description: &WallDescription,
        validity: MazeValidity,
        config: SimConfig,
    ) -> Result<Maze, MazeError> {
        if description.is_empty() || description[0].is_empty() {
            return Err(MazeError::Empty);
        }
        let height = description[0].len();
        for (column, walls) in description.iter().enumerate() {
            if walls.len() != height {
                return Err(MazeError::NotRectangular {
                    column,
                    expected: height,
                    actual: walls.len(),
                });
            }
        }
        if validity == MazeValidity::Unexplorable {
            return Err(MazeError::Unexplorable);
        }

        let mut tiles: Vec<Vec<Tile>> = description
            .iter()
            .enumerate()
            .map(|(x, column)| {
                column
                    .iter()
                    .enumerate()
                    .map(|(y, &walls)| Tile::new(x as i32, y as i32, walls))
                    .collect()
            })
            .collect();
        set_tile_distances(&mut tiles);
        let wall_segments = collect_wall_segments(&tiles, config.tile_length());

        debug!(
            "built {}x{} maze with {} wall segments",
            tiles.len(),
            height,
            wall_segments.len()
        );

        Ok(Maze {
            tiles,
            is_valid: true,
            is_official: validity == MazeValidity::Official,
            wall_segments,
            config,
        })
    }

    pub fn width(&self) -> i32 {
        self.tiles.len() as i32
    }

    pub fn height(&self) -> i32 {
        self.tiles.first().map_or(0, |column| column.len() as i32)
    }

    pub fn within_maze(&self, x: i32, y: i32) -> bool {
        0 <= x && x < self.width() && 0 <= y && y < self.height()
    }

    /// Precondition: `(x, y)` is within the maze; callers bounds-check first.
    pub fn tile(&self, x: i32, y: i32) -> &Tile {
        assert!(self.within_maze(x, y), "tile ({x}, {y}) is out of bounds");
        &self.tiles[x as usize][y as usize]
    }

    pub fn maximum_distance(&self) -> i32 {
        self.tiles
            .iter()
            .flatten()
            .map(Tile::distance)
            .max()
            .unwrap_or(0)
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn is_official(&self) -> bool {
        self.is_official
    }

    pub fn is_center_tile(&self, x: i32, y: i32) -> bool {
        center_positions(self.width(), self.height()).contains(&(x, y))
    }

    /// North unless the start tile is walled to the north but open to the
    /// east.
    pub fn optimal_starting_direction(&self) -> Direction {
        if self.height() == 0 {
            return Direction::North;
        }
        if self.tile(0, 0).is_wall(Direction::North) && !self.tile(0, 0).is_wall(Direction::East) {
            return Direction::East;
        }
        Direction::North
    }

    pub fn tile_length(&self) -> f64 {
        self.config.tile_length()
    }

    /// Center-line segments of every present wall, in world coordinates.
    /// Shared walls are recorded by both adjacent tiles.
    pub fn wall_segments(&self) -> &[LineSegment] {
        &self.wall_segments
    }

    /// Distance from `position` along `heading` to the first wall hit, if any.
    pub fn distance_to_next_wall(&self, position: Point2<f64>, heading: Angle) -> Option<f64> {
        self.wall_segments
            .iter()
            .filter_map(|segment| {
                segment
                    .intersect_with_ray(position, heading)
                    .map(|intersection| (intersection - position).norm())
            })
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// Center cells in the original's fixed seeding order: the low midpoint
/// first, then the extra cells an even dimension splits onto.
fn center_positions(width: i32, height: i32) -> Vec<(i32, i32)> {
    let (low_x, low_y) = ((width - 1) / 2, (height - 1) / 2);
    let mut positions = vec![(low_x, low_y)];
    if width % 2 == 0 {
        positions.push((width / 2, low_y));
        if height % 2 == 0 {
            positions.push((low_x, height / 2));
            positions.push((width / 2, height / 2));
        }
    } else if height % 2 == 0 {
        positions.push((low_x, height / 2));
    }
    positions
}

fn neighbor_position(x: i32, y: i32, direction: Direction) -> (i32, i32) {
    match direction {
        Direction::North => (x, y + 1),
        Direction::East => (x + 1, y),
        Direction::South => (x, y - 1),
        Direction::West => (x - 1, y),
    }
}

/// Multi-source BFS from the center cells through open walls. Wall symmetry
/// between adjacent tiles is trusted input, so the hop counts are shortest
/// open-path distances.
fn set_tile_distances(tiles: &mut [Vec<Tile>]) {
    let width = tiles.len() as i32;
    let height = tiles[0].len() as i32;

    let mut discovered = VecDeque::new();
    for (x, y) in center_positions(width, height) {
        tiles[x as usize][y as usize].set_distance(0);
        discovered.push_back((x, y));
    }

    while let Some((x, y)) = discovered.pop_front() {
        for &direction in Direction::iter() {
            if tiles[x as usize][y as usize].is_wall(direction) {
                continue;
            }
            let (nx, ny) = neighbor_position(x, y, direction);
            if nx < 0 || nx >= width || ny < 0 || ny >= height {
                continue;
            }
            if tiles[nx as usize][ny as usize].distance() == UNREACHED {
                let distance = tiles[x as usize][y as usize].distance() + 1;
                tiles[nx as usize][ny as usize].set_distance(distance);
                discovered.push_back((nx, ny));
            }
        }
    }
}

fn collect_wall_segments(tiles: &[Vec<Tile>], tile_length: f64) -> Vec<LineSegment> {
    let mut segments = Vec::new();
    for column in tiles {
        for tile in column {
            let x0 = tile.x() as f64 * tile_length;
            let y0 = tile.y() as f64 * tile_length;
            let x1 = x0 + tile_length;
            let y1 = y0 + tile_length;
            for &direction in Direction::iter() {
                if !tile.is_wall(direction) {
                    continue;
                }
                segments.push(match direction {
                    Direction::North => {
                        LineSegment::new(Point2::new(x0, y1), Point2::new(x1, y1))
                    }
                    Direction::East => LineSegment::new(Point2::new(x1, y0), Point2::new(x1, y1)),
                    Direction::South => {
                        LineSegment::new(Point2::new(x0, y0), Point2::new(x1, y0))
                    }
                    Direction::West => LineSegment::new(Point2::new(x0, y0), Point2::new(x0, y1)),
                });
            }
        }
    }
    segments
}
