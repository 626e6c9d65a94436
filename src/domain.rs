//! Simulation domain: the maze, the mouse, and the physics between them.

mod basis;
mod geometry;
mod kinematics;
mod maze;
mod mouse;
mod sensor;
mod tile;
mod wheel;

pub use basis::{Angle, Direction};
pub use geometry::{LineSegment, Polygon, Triangle};
pub use kinematics::{speed_adjustment_factors, CurveTurnFactorCalculator, SpeedAdjustmentFactors};
pub use maze::{Maze, MazeError, MazeValidity};
pub use mouse::{Mouse, MouseLoadError};
pub use sensor::Sensor;
pub use tile::{Tile, UNREACHED};
pub use wheel::{EncoderType, Wheel, WheelEffect};
