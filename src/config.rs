//! Explicit simulation configuration, threaded through constructors.

use serde::{Deserialize, Serialize};

/// Physical maze dimensions in meters.
///
/// Defaults follow the official micromouse specification: 168 mm wall
/// segments separated by 12 mm posts, so tiles are 180 mm on a side.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub wall_length: f64,
    pub wall_width: f64,
}

impl SimConfig {
    pub fn tile_length(&self) -> f64 {
        self.wall_length + self.wall_width
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            wall_length: 0.168,
            wall_width: 0.012,
        }
    }
}
