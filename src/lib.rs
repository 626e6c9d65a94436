//! Physics core of a micromouse simulator.
//!
//! A [`Maze`] is built from a wall description and annotated with a
//! breadth-first distance field from the center tiles. A [`Mouse`] sits in
//! the maze's starting tile and integrates its pose from per-wheel angular
//! speeds; high-level maneuvers (move forward, curve along a radius) are
//! translated into those speeds through factors derived from the wheel
//! layout. Sensors cast ray fans against the maze walls, and a crash flag
//! set by an external collision check freezes the physics until a reset.
//!
//! The crate draws no pixels and runs no event loop; it is meant to be
//! driven by a host that owns the clock and the screen. One actor calls
//! [`Mouse::update`] on simulation ticks while another issues commands and
//! reads encoders, sensors, and the gyro; the API is safe for that split.

pub mod config;
pub mod description;
pub mod domain;

pub use config::SimConfig;
pub use description::{
    mirror_across_vertical, rotate_counterclockwise, MouseDescription, SensorDescription,
    TileWalls, WallDescription, WheelDescription,
};
pub use domain::{
    Angle, CurveTurnFactorCalculator, Direction, EncoderType, LineSegment, Maze, MazeError,
    MazeValidity, Mouse, MouseLoadError, Polygon, Sensor, Tile, Triangle, Wheel, WheelEffect,
    UNREACHED,
};
