//! Plain-data descriptions consumed by maze and mouse construction.
//!
//! Parsing files or bytes into these structures is the job of external
//! collaborators; everything here arrives already structured. The maze
//! transforms at the bottom operate on wall descriptions before a maze is
//! built from them.

use serde::{Deserialize, Serialize};

use crate::domain::{Direction, EncoderType};

/// Per-direction wall flags of one cell, the raw material a maze is built
/// from. Opposing flags of adjacent cells are expected to agree; a structural
/// checker enforces that before construction.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TileWalls {
    pub north: bool,
    pub east: bool,
    pub south: bool,
    pub west: bool,
}

impl TileWalls {
    pub fn is_wall(&self, direction: Direction) -> bool {
        match direction {
            Direction::North => self.north,
            Direction::East => self.east,
            Direction::South => self.south,
            Direction::West => self.west,
        }
    }
}

/// Column-major wall flags, indexed `[x][y]`.
pub type WallDescription = Vec<Vec<TileWalls>>;

/// Mouse geometry in the body frame: the origin is the center of mass and
/// the positive x-axis is the forward axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MouseDescription {
    pub body: Vec<(f64, f64)>,
    pub wheels: Vec<WheelDescription>,
    pub sensors: Vec<SensorDescription>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WheelDescription {
    pub name: String,
    /// Wheel center, body frame.
    pub position: (f64, f64),
    /// Rolling direction in radians, relative to the forward axis.
    pub direction: f64,
    pub radius: f64,
    pub width: f64,
    /// Radians per second.
    pub max_angular_speed: f64,
    pub encoder_type: EncoderType,
    pub encoder_ticks_per_revolution: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorDescription {
    pub name: String,
    /// Lens center, body frame.
    pub position: (f64, f64),
    /// View direction in radians, relative to the forward axis.
    pub direction: f64,
    /// Lens radius, for the drawable polygon.
    pub radius: f64,
    /// Maximum sensing distance in meters.
    pub range: f64,
    /// Half-angle of the view cone, radians.
    pub half_width: f64,
}

/// Mirror a wall description across the vertical axis.
pub fn mirror_across_vertical(description: &WallDescription) -> WallDescription {
    let width = description.len();
    (0..width)
        .map(|x| {
            description[width - 1 - x]
                .iter()
                .map(|walls| TileWalls {
                    north: walls.north,
                    east: walls.west,
                    south: walls.south,
                    west: walls.east,
                })
                .collect()
        })
        .collect()
}

/// Rotate a wall description a quarter turn counterclockwise. The result has
/// transposed dimensions.
pub fn rotate_counterclockwise(description: &WallDescription) -> WallDescription {
    let height = description.first().map_or(0, Vec::len);
    let mut rotated: Vec<Vec<TileWalls>> = vec![Vec::with_capacity(description.len()); height];
    for column in description {
        for y in (0..height).rev() {
            let walls = column[y];
            rotated[height - 1 - y].push(TileWalls {
                north: walls.east,
                east: walls.south,
                south: walls.west,
                west: walls.north,
            });
        }
    }
    rotated
}
