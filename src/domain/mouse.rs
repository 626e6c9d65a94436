//! The mouse: pose integration, command translation, and polygon transforms.
//!
//! A simulation-tick actor drives [`Mouse::update`] while a control actor
//! issues commands and reads encoders and sensors. Wheel and sensor state
//! sit behind short-scoped mutexes; the pose is touched only by the tick
//! actor and by explicit teleports, which callers issue only while the
//! simulation is paused.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use log::{debug, warn};
use nalgebra::{Point2, Rotation2, Vector2};
use parking_lot::Mutex;
use thiserror::Error;

use crate::config::SimConfig;
use crate::description::MouseDescription;

use super::{
    kinematics::{speed_adjustment_factors, CurveTurnFactorCalculator, SpeedAdjustmentFactors},
    Angle, Direction, EncoderType, Maze, Polygon, Sensor, Wheel,
};

#[derive(Error, Debug)]
pub enum MouseLoadError {
    #[error("body polygon has {0} vertices; at least 3 required")]
    DegenerateBody(usize),
    #[error("no wheels defined")]
    NoWheels,
    #[error("duplicate wheel name {0:?}")]
    DuplicateWheel(String),
    #[error("wheel {0:?} has a non-positive radius")]
    BadWheelRadius(String),
    #[error("wheel {0:?} has a non-positive maximum speed")]
    BadWheelSpeed(String),
    #[error("wheel {0:?} has a non-positive encoder resolution")]
    BadEncoderResolution(String),
    #[error("duplicate sensor name {0:?}")]
    DuplicateSensor(String),
    #[error("sensor {0:?} has a non-positive range")]
    BadSensorRange(String),
    #[error("sensor {0:?} has a non-positive view half-width")]
    BadSensorHalfWidth(String),
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Pose {
    translation: Point2<f64>,
    rotation: Angle,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct StartDirections {
    /// Direction the next reset will face.
    starting: Direction,
    /// Direction the mouse faced after the last reset.
    started: Direction,
}

pub struct Mouse {
    maze: Arc<Maze>,
    tile_length: f64,
    initial_translation: Point2<f64>,
    initial_rotation: Angle,
    pose: Mutex<Pose>,
    start: Mutex<StartDirections>,
    crashed: AtomicBool,
    /// Radians per second, refreshed by every update.
    gyro: Mutex<f64>,
    wheels: Mutex<BTreeMap<String, Wheel>>,
    sensors: Mutex<BTreeMap<String, Sensor>>,
    speed_adjustment_factors: SpeedAdjustmentFactors,
    curve_turn_factor_calculator: CurveTurnFactorCalculator,
    initial_body_polygon: Polygon,
    initial_collision_polygon: Polygon,
    initial_center_of_mass_polygon: Polygon,
}

impl Mouse {
    /// Build a mouse in the starting tile of `maze`. Fails as a unit: a bad
    /// body, wheel, or sensor description leaves no partial state behind.
    pub fn new(
        maze: Arc<Maze>,
        config: SimConfig,
        description: &MouseDescription,
    ) -> Result<Mouse, MouseLoadError> {
        let mouse = Self::load(maze, config, description);
        if let Err(error) = &mouse {
            warn!("unable to load mouse description: {error}");
        }
        mouse
    }

    fn load(
        maze: Arc<Maze>,
        config: SimConfig,
        description: &MouseDescription,
    ) -> Result<Mouse, MouseLoadError> {
        // The initial translation is the center of the starting tile; the
        // initial rotation comes from the starting tile's walls.
        let half_tile = config.tile_length() / 2.0;
        let initial_translation = Point2::new(half_tile, half_tile);
        let starting_direction = maze.optimal_starting_direction();
        let initial_rotation = starting_direction.to_angle();

        let initial_body_polygon = load_body(description, initial_translation, initial_rotation)?;
        let wheels = load_wheels(description, initial_translation, initial_rotation)?;
        let sensors = load_sensors(description, initial_translation, initial_rotation, &maze)?;

        let adjustment_factors = speed_adjustment_factors(&wheels);
        let curve_turn_factor_calculator =
            CurveTurnFactorCalculator::new(&wheels, &adjustment_factors);

        // The collision polygon is the convex hull rather than the union of
        // the part polygons. The hull over-approximates the true footprint;
        // a known, intentional inaccuracy.
        let mut hull_parts = vec![initial_body_polygon.clone()];
        hull_parts.extend(wheels.values().map(|wheel| wheel.initial_polygon().clone()));
        hull_parts.extend(sensors.values().map(|sensor| sensor.initial_polygon().clone()));
        let initial_collision_polygon = Polygon::convex_hull(&hull_parts);

        let initial_center_of_mass_polygon = Polygon::circle(initial_translation, 0.005, 8);

        // Triangulate every drawable polygon now, once, instead of on first
        // draw.
        initial_body_polygon.triangles();
        initial_collision_polygon.triangles();
        initial_center_of_mass_polygon.triangles();
        for wheel in wheels.values() {
            wheel.initial_polygon().triangles();
        }
        for sensor in sensors.values() {
            sensor.initial_polygon().triangles();
            sensor.initial_view_polygon().triangles();
        }

        debug!(
            "loaded mouse with {} wheels and {} sensors, starting {starting_direction:?}",
            wheels.len(),
            sensors.len()
        );

        Ok(Mouse {
            maze,
            tile_length: config.tile_length(),
            initial_translation,
            initial_rotation,
            pose: Mutex::new(Pose {
                translation: initial_translation,
                rotation: initial_rotation,
            }),
            start: Mutex::new(StartDirections {
                starting: starting_direction,
                started: starting_direction,
            }),
            crashed: AtomicBool::new(false),
            gyro: Mutex::new(0.0),
            wheels: Mutex::new(wheels),
            sensors: Mutex::new(sensors),
            speed_adjustment_factors: adjustment_factors,
            curve_turn_factor_calculator,
            initial_body_polygon,
            initial_collision_polygon,
            initial_center_of_mass_polygon,
        })
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn did_crash(&self) -> bool {
        self.crashed.load(Ordering::Relaxed)
    }

    /// One-way transition to the crashed state, set by the external
    /// collision detector. Physics freezes until [`Mouse::reset`].
    pub fn set_crashed(&self) {
        self.crashed.store(true, Ordering::Relaxed);
    }

    /// Teleport back to the starting tile and clear the crashed state.
    pub fn reset(&self) {
        let starting = {
            let mut start = self.start.lock();
            start.started = start.starting;
            start.starting
        };
        self.teleport(self.initial_translation, starting.to_angle());
        self.crashed.store(false, Ordering::Relaxed);
    }

    /// Not safe to call concurrently with an in-flight update; callers
    /// teleport only while the simulation is paused.
    pub fn teleport(&self, translation: Point2<f64>, rotation: Angle) {
        let mut pose = self.pose.lock();
        pose.translation = translation;
        pose.rotation = rotation;
    }

    pub fn started_direction(&self) -> Direction {
        self.start.lock().started
    }

    pub fn set_starting_direction(&self, direction: Direction) {
        self.start.lock().starting = direction;
    }

    pub fn initial_translation(&self) -> Point2<f64> {
        self.initial_translation
    }

    pub fn current_translation(&self) -> Point2<f64> {
        self.pose.lock().translation
    }

    pub fn current_rotation(&self) -> Angle {
        self.pose.lock().rotation
    }

    pub fn current_pose(&self) -> (Point2<f64>, Angle) {
        let pose = self.pose.lock();
        (pose.translation, pose.rotation)
    }

    /// The tile coordinate containing the current translation.
    pub fn current_discretized_translation(&self) -> (i32, i32) {
        let translation = self.current_translation();
        (
            (translation.x / self.tile_length).floor() as i32,
            (translation.y / self.tile_length).floor() as i32,
        )
    }

    /// The nearest cardinal direction to the current rotation. Quadrants of
    /// the rotation shifted by 45 degrees map 0..3 onto east, north, west,
    /// south.
    pub fn current_discretized_rotation(&self) -> Direction {
        let rotation = self.current_rotation();
        let quadrant = ((rotation + Angle::from_degrees(45.0)).radians_zero_to_2pi()
            / std::f64::consts::FRAC_PI_2)
            .floor() as i32;
        // Quadrant 4 exists: for a heading a hair below -45 degrees the
        // shifted angle is a tiny negative whose normalization rounds up to
        // exactly 2π. That heading is east all the same.
        match quadrant {
            0 | 4 => Direction::East,
            1 => Direction::North,
            2 => Direction::West,
            3 => Direction::South,
            _ => unreachable!("rotation quadrant {quadrant} out of range"),
        }
    }

    /// Advance the simulation by `elapsed`. A no-op while crashed.
    ///
    /// Performance critical: this runs once per simulation tick.
    pub fn update(&self, elapsed: Duration) {
        if self.did_crash() {
            return;
        }

        let (_, rotation) = self.current_pose();
        let (cos, sin) = (rotation.cos(), rotation.sin());

        let mut sum_dx = 0.0;
        let mut sum_dy = 0.0;
        let mut sum_dr = 0.0;
        let wheel_count;
        {
            let mut wheels = self.wheels.lock();
            wheel_count = wheels.len();
            for wheel in wheels.values_mut() {
                let effect = wheel.update(elapsed);
                // Forward effect projects onto the heading, sideways effect
                // onto its clockwise perpendicular.
                sum_dx += effect.forward * cos + effect.sideways * sin;
                sum_dy += effect.forward * sin - effect.sideways * cos;
                sum_dr += effect.turn;
            }
        }

        // Loading rejects wheel-less mice, so the count is at least one.
        let count = wheel_count as f64;
        let (ave_dx, ave_dy, ave_dr) = (sum_dx / count, sum_dy / count, sum_dr / count);
        let dt = elapsed.as_secs_f64();

        *self.gyro.lock() = ave_dr;
        let (translation, rotation) = {
            let mut pose = self.pose.lock();
            pose.rotation = pose.rotation + Angle::new(ave_dr * dt);
            pose.translation += Vector2::new(ave_dx * dt, ave_dy * dt);
            (pose.translation, pose.rotation)
        };

        // Refresh every sensor reading at the new pose.
        let mut sensors = self.sensors.lock();
        for sensor in sensors.values_mut() {
            let (position, direction) =
                self.current_sensor_position_and_direction(sensor, translation, rotation);
            sensor.update_reading(position, direction, &self.maze);
        }
    }

    pub fn current_body_polygon(&self, translation: Point2<f64>, rotation: Angle) -> Polygon {
        self.current_polygon(&self.initial_body_polygon, translation, rotation)
    }

    pub fn current_collision_polygon(&self, translation: Point2<f64>, rotation: Angle) -> Polygon {
        self.current_polygon(&self.initial_collision_polygon, translation, rotation)
    }

    pub fn current_center_of_mass_polygon(
        &self,
        translation: Point2<f64>,
        rotation: Angle,
    ) -> Polygon {
        self.current_polygon(&self.initial_center_of_mass_polygon, translation, rotation)
    }

    pub fn current_wheel_polygons(&self, translation: Point2<f64>, rotation: Angle) -> Vec<Polygon> {
        self.wheels
            .lock()
            .values()
            .map(|wheel| self.current_polygon(wheel.initial_polygon(), translation, rotation))
            .collect()
    }

    pub fn current_sensor_polygons(
        &self,
        translation: Point2<f64>,
        rotation: Angle,
    ) -> Vec<Polygon> {
        self.sensors
            .lock()
            .values()
            .map(|sensor| self.current_polygon(sensor.initial_polygon(), translation, rotation))
            .collect()
    }

    pub fn current_sensor_view_polygons(
        &self,
        translation: Point2<f64>,
        rotation: Angle,
    ) -> Vec<Polygon> {
        self.sensors
            .lock()
            .values()
            .map(|sensor| {
                let (position, direction) =
                    self.current_sensor_position_and_direction(sensor, translation, rotation);
                sensor.current_view_polygon(position, direction, &self.maze)
            })
            .collect()
    }

    pub fn has_wheel(&self, name: &str) -> bool {
        self.wheels.lock().contains_key(name)
    }

    /// Precondition for this and every other name-keyed query: the wheel
    /// exists; callers check [`Mouse::has_wheel`] first.
    pub fn wheel_max_speed(&self, name: &str) -> f64 {
        let wheels = self.wheels.lock();
        assert!(wheels.contains_key(name), "no wheel named {name:?}");
        wheels[name].max_angular_speed()
    }

    pub fn wheel_encoder_type(&self, name: &str) -> EncoderType {
        let wheels = self.wheels.lock();
        assert!(wheels.contains_key(name), "no wheel named {name:?}");
        wheels[name].encoder_type()
    }

    pub fn wheel_encoder_ticks_per_revolution(&self, name: &str) -> f64 {
        let wheels = self.wheels.lock();
        assert!(wheels.contains_key(name), "no wheel named {name:?}");
        wheels[name].encoder_ticks_per_revolution()
    }

    pub fn read_wheel_absolute_encoder(&self, name: &str) -> i32 {
        let wheels = self.wheels.lock();
        assert!(wheels.contains_key(name), "no wheel named {name:?}");
        wheels[name].read_absolute_encoder()
    }

    pub fn read_wheel_relative_encoder(&self, name: &str) -> i32 {
        let wheels = self.wheels.lock();
        assert!(wheels.contains_key(name), "no wheel named {name:?}");
        wheels[name].read_relative_encoder()
    }

    pub fn reset_wheel_relative_encoder(&self, name: &str) {
        let mut wheels = self.wheels.lock();
        match wheels.get_mut(name) {
            Some(wheel) => wheel.reset_relative_encoder(),
            None => panic!("no wheel named {name:?}"),
        }
    }

    pub fn has_sensor(&self, name: &str) -> bool {
        self.sensors.lock().contains_key(name)
    }

    pub fn read_sensor(&self, name: &str) -> f64 {
        let sensors = self.sensors.lock();
        assert!(sensors.contains_key(name), "no sensor named {name:?}");
        sensors[name].read()
    }

    /// The body's angular velocity from the last update, rad/s.
    pub fn read_gyro(&self) -> f64 {
        *self.gyro.lock()
    }

    pub fn set_wheel_speeds(&self, speeds: &BTreeMap<String, f64>) {
        let mut wheels = self.wheels.lock();
        for (name, &speed) in speeds {
            match wheels.get_mut(name) {
                Some(wheel) => wheel.set_angular_speed(speed),
                None => panic!("no wheel named {name:?}"),
            }
        }
    }

    pub fn set_wheel_speeds_for_move_forward(&self, fraction_of_max_speed: f64) {
        self.set_wheel_speeds_for_movement(fraction_of_max_speed, 1.0, 0.0);
    }

    pub fn set_wheel_speeds_for_curve_left(&self, fraction_of_max_speed: f64, radius: f64) {
        let (forward_factor, turn_factor) =
            self.curve_turn_factor_calculator.curve_turn_factors(radius);
        self.set_wheel_speeds_for_movement(fraction_of_max_speed, forward_factor, turn_factor);
    }

    pub fn set_wheel_speeds_for_curve_right(&self, fraction_of_max_speed: f64, radius: f64) {
        let (forward_factor, turn_factor) =
            self.curve_turn_factor_calculator.curve_turn_factors(radius);
        self.set_wheel_speeds_for_movement(fraction_of_max_speed, forward_factor, -turn_factor);
    }

    pub fn stop_all_wheels(&self) {
        let speeds = self
            .wheels
            .lock()
            .keys()
            .map(|name| (name.clone(), 0.0))
            .collect();
        self.set_wheel_speeds(&speeds);
    }

    /// Every maneuver is a linear blend of a pure-forward basis and a
    /// pure-turn basis in wheel-speed space. The factors are normalized so
    /// their magnitudes sum to one, which keeps every blended wheel speed
    /// within its maximum.
    fn set_wheel_speeds_for_movement(
        &self,
        fraction_of_max_speed: f64,
        forward_factor: f64,
        turn_factor: f64,
    ) {
        let factor_magnitude = forward_factor.abs() + turn_factor.abs();
        assert!(
            factor_magnitude > 0.0,
            "movement factors must not both be zero"
        );
        let normalized_forward_factor = forward_factor / factor_magnitude;
        let normalized_turn_factor = turn_factor / factor_magnitude;

        let normalized_magnitude =
            normalized_forward_factor.abs() + normalized_turn_factor.abs();
        assert!(
            (0.0..=1.0 + f64::EPSILON).contains(&normalized_magnitude),
            "normalized factor magnitude {normalized_magnitude} out of range"
        );

        let speeds = {
            let wheels = self.wheels.lock();
            wheels
                .iter()
                .map(|(name, wheel)| {
                    let (adjust_forward, adjust_turn) = self.speed_adjustment_factors[name];
                    (
                        name.clone(),
                        wheel.max_angular_speed()
                            * fraction_of_max_speed
                            * (normalized_forward_factor * adjust_forward
                                + normalized_turn_factor * adjust_turn),
                    )
                })
                .collect()
        };
        self.set_wheel_speeds(&speeds);
    }

    /// The single rigid-transform rule: translate by the accumulated
    /// translation delta, then rotate by the accumulated rotation delta
    /// about the current translation.
    fn current_polygon(
        &self,
        initial: &Polygon,
        translation: Point2<f64>,
        rotation: Angle,
    ) -> Polygon {
        initial
            .translated(translation - self.initial_translation)
            .rotated_around(rotation - self.initial_rotation, translation)
    }

    fn current_sensor_position_and_direction(
        &self,
        sensor: &Sensor,
        translation: Point2<f64>,
        rotation: Angle,
    ) -> (Point2<f64>, Angle) {
        let translation_delta = translation - self.initial_translation;
        let rotation_delta = rotation - self.initial_rotation;
        let moved = sensor.initial_position() + translation_delta;
        let position = translation + Rotation2::new(rotation_delta.radians()) * (moved - translation);
        (position, sensor.initial_direction() + rotation_delta)
    }
}

fn load_body(
    description: &MouseDescription,
    initial_translation: Point2<f64>,
    initial_rotation: Angle,
) -> Result<Polygon, MouseLoadError> {
    if description.body.len() < 3 {
        return Err(MouseLoadError::DegenerateBody(description.body.len()));
    }
    Ok(Polygon::new(
        description
            .body
            .iter()
            .map(|&(x, y)| Point2::new(x, y))
            .collect(),
    )
    .rotated_around(initial_rotation, Point2::origin())
    .translated(initial_translation.coords))
}

fn load_wheels(
    description: &MouseDescription,
    initial_translation: Point2<f64>,
    initial_rotation: Angle,
) -> Result<BTreeMap<String, Wheel>, MouseLoadError> {
    if description.wheels.is_empty() {
        return Err(MouseLoadError::NoWheels);
    }
    let mut wheels = BTreeMap::new();
    for wheel in &description.wheels {
        if wheel.radius <= 0.0 {
            return Err(MouseLoadError::BadWheelRadius(wheel.name.clone()));
        }
        if wheel.max_angular_speed <= 0.0 {
            return Err(MouseLoadError::BadWheelSpeed(wheel.name.clone()));
        }
        if wheel.encoder_ticks_per_revolution <= 0.0 {
            return Err(MouseLoadError::BadEncoderResolution(wheel.name.clone()));
        }
        let loaded = Wheel::new(
            Vector2::new(wheel.position.0, wheel.position.1),
            Angle::new(wheel.direction),
            wheel.radius,
            wheel.width,
            wheel.max_angular_speed,
            wheel.encoder_type,
            wheel.encoder_ticks_per_revolution,
            initial_translation,
            initial_rotation,
        );
        if wheels.insert(wheel.name.clone(), loaded).is_some() {
            return Err(MouseLoadError::DuplicateWheel(wheel.name.clone()));
        }
    }
    Ok(wheels)
}

fn load_sensors(
    description: &MouseDescription,
    initial_translation: Point2<f64>,
    initial_rotation: Angle,
    maze: &Maze,
) -> Result<BTreeMap<String, Sensor>, MouseLoadError> {
    let mut sensors = BTreeMap::new();
    for sensor in &description.sensors {
        if sensor.range <= 0.0 {
            return Err(MouseLoadError::BadSensorRange(sensor.name.clone()));
        }
        if sensor.half_width <= 0.0 {
            return Err(MouseLoadError::BadSensorHalfWidth(sensor.name.clone()));
        }
        let loaded = Sensor::new(
            Vector2::new(sensor.position.0, sensor.position.1),
            Angle::new(sensor.direction),
            sensor.radius,
            sensor.range,
            Angle::new(sensor.half_width),
            initial_translation,
            initial_rotation,
            maze,
        );
        if sensors.insert(sensor.name.clone(), loaded).is_some() {
            return Err(MouseLoadError::DuplicateSensor(sensor.name.clone()));
        }
    }
    Ok(sensors)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::description::{SensorDescription, WheelDescription};
    use crate::domain::maze::tests::{open_description, open_maze};
    use crate::domain::MazeValidity;

    use super::*;

    const EPSILON: f64 = 1e-9;

    fn wheel_description(name: &str, y: f64) -> WheelDescription {
        WheelDescription {
            name: name.to_string(),
            position: (0.0, y),
            direction: 0.0,
            radius: 0.01,
            width: 0.005,
            max_angular_speed: 10.0,
            encoder_type: EncoderType::Relative,
            encoder_ticks_per_revolution: 360.0,
        }
    }

    /// Symmetric two-wheel differential-drive mouse with one front sensor.
    fn differential_description() -> MouseDescription {
        MouseDescription {
            body: vec![(-0.04, -0.03), (0.04, -0.03), (0.04, 0.03), (-0.04, 0.03)],
            wheels: vec![
                wheel_description("left", 0.03),
                wheel_description("right", -0.03),
            ],
            sensors: vec![SensorDescription {
                name: "front".to_string(),
                position: (0.04, 0.0),
                direction: 0.0,
                radius: 0.003,
                range: 0.1,
                half_width: PI / 18.0,
            }],
        }
    }

    fn differential_mouse() -> Mouse {
        Mouse::new(
            Arc::new(open_maze(3, 3)),
            SimConfig::default(),
            &differential_description(),
        )
        .unwrap()
    }

    #[test]
    fn test_initial_pose_is_center_of_starting_tile() {
        let mouse = differential_mouse();
        // An open starting tile means a northward heading.
        assert_abs_diff_eq!(mouse.current_translation(), Point2::new(0.09, 0.09));
        assert_abs_diff_eq!(mouse.current_rotation(), Angle::new(0.5 * PI));
        assert_eq!(mouse.started_direction(), Direction::North);
    }

    #[test]
    fn test_load_fails_as_a_unit() {
        let maze = Arc::new(open_maze(3, 3));

        let mut description = differential_description();
        description.body.truncate(2);
        assert!(matches!(
            Mouse::new(maze.clone(), SimConfig::default(), &description),
            Err(MouseLoadError::DegenerateBody(2))
        ));

        let mut description = differential_description();
        description.wheels[1].name = "left".to_string();
        assert!(matches!(
            Mouse::new(maze.clone(), SimConfig::default(), &description),
            Err(MouseLoadError::DuplicateWheel(_))
        ));

        let mut description = differential_description();
        description.wheels.clear();
        assert!(matches!(
            Mouse::new(maze.clone(), SimConfig::default(), &description),
            Err(MouseLoadError::NoWheels)
        ));

        let mut description = differential_description();
        description.sensors[0].range = 0.0;
        assert!(matches!(
            Mouse::new(maze, SimConfig::default(), &description),
            Err(MouseLoadError::BadSensorRange(_))
        ));
    }

    #[test]
    fn test_body_polygon_transform_is_identity_at_initial_pose() {
        let mouse = differential_mouse();
        let current =
            mouse.current_body_polygon(mouse.initial_translation, mouse.initial_rotation);
        for (current, initial) in current
            .vertices()
            .iter()
            .zip(mouse.initial_body_polygon.vertices())
        {
            assert_abs_diff_eq!(current, initial, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_collision_polygon_is_a_convex_over_approximation() {
        let mouse = differential_mouse();
        let (translation, rotation) = mouse.current_pose();
        let collision = mouse.current_collision_polygon(translation, rotation);
        // Every body vertex lies inside or on the hull's bounding box.
        let body = mouse.current_body_polygon(translation, rotation);
        let min_x = collision.vertices().iter().map(|p| p.x).fold(f64::MAX, f64::min);
        let max_x = collision.vertices().iter().map(|p| p.x).fold(f64::MIN, f64::max);
        for vertex in body.vertices() {
            assert!(vertex.x >= min_x - EPSILON && vertex.x <= max_x + EPSILON);
        }
    }

    #[test]
    fn test_polygons_are_triangulated_at_load() {
        let mouse = differential_mouse();
        assert!(!mouse.initial_body_polygon.triangles().is_empty());
        assert!(!mouse.initial_collision_polygon.triangles().is_empty());
        assert!(!mouse.initial_center_of_mass_polygon.triangles().is_empty());
    }

    #[test]
    fn test_move_forward_drives_symmetric_wheels_equally() {
        let mouse = differential_mouse();
        mouse.set_wheel_speeds_for_move_forward(1.0);
        let wheels = mouse.wheels.lock();
        let left = wheels["left"].angular_speed();
        let right = wheels["right"].angular_speed();
        assert_abs_diff_eq!(left, right, epsilon = EPSILON);
        assert_abs_diff_eq!(left, 10.0, epsilon = EPSILON);
    }

    #[rstest]
    #[case::forward(1.0)]
    #[case::half_forward(0.5)]
    fn test_move_forward_respects_max_speed(#[case] fraction: f64) {
        let mouse = differential_mouse();
        mouse.set_wheel_speeds_for_move_forward(fraction);
        let wheels = mouse.wheels.lock();
        for wheel in wheels.values() {
            assert!(wheel.angular_speed().abs() <= wheel.max_angular_speed() + EPSILON);
        }
    }

    #[rstest]
    #[case::tight_left(true, 0.05)]
    #[case::wide_left(true, 0.5)]
    #[case::tight_right(false, 0.05)]
    #[case::wide_right(false, 0.5)]
    fn test_curves_respect_max_speed(#[case] left: bool, #[case] radius: f64) {
        let mouse = differential_mouse();
        if left {
            mouse.set_wheel_speeds_for_curve_left(1.0, radius);
        } else {
            mouse.set_wheel_speeds_for_curve_right(1.0, radius);
        }
        let wheels = mouse.wheels.lock();
        for wheel in wheels.values() {
            assert!(wheel.angular_speed().abs() <= wheel.max_angular_speed() + EPSILON);
        }
    }

    #[test]
    fn test_curve_left_and_right_mirror_each_other() {
        let mouse = differential_mouse();
        mouse.set_wheel_speeds_for_curve_left(1.0, 0.1);
        let (left_a, right_a) = {
            let wheels = mouse.wheels.lock();
            (
                wheels["left"].angular_speed(),
                wheels["right"].angular_speed(),
            )
        };
        mouse.set_wheel_speeds_for_curve_right(1.0, 0.1);
        let wheels = mouse.wheels.lock();
        assert_abs_diff_eq!(wheels["left"].angular_speed(), right_a, epsilon = EPSILON);
        assert_abs_diff_eq!(wheels["right"].angular_speed(), left_a, epsilon = EPSILON);
    }

    #[test]
    fn test_stop_all_wheels() {
        let mouse = differential_mouse();
        mouse.set_wheel_speeds_for_move_forward(1.0);
        mouse.stop_all_wheels();
        let wheels = mouse.wheels.lock();
        for wheel in wheels.values() {
            assert_abs_diff_eq!(wheel.angular_speed(), 0.0);
        }
    }

    #[test]
    fn test_update_moves_forward_along_heading() {
        let mouse = differential_mouse();
        mouse.set_wheel_speeds_for_move_forward(1.0);
        mouse.update(Duration::from_secs(1));
        // Heading north at 10 rad/s on 1 cm wheels: 0.1 m/s straight up.
        let translation = mouse.current_translation();
        assert_abs_diff_eq!(translation.x, 0.09, epsilon = EPSILON);
        assert_abs_diff_eq!(translation.y, 0.19, epsilon = EPSILON);
        assert_abs_diff_eq!(mouse.current_rotation(), Angle::new(0.5 * PI));
        assert_abs_diff_eq!(mouse.read_gyro(), 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_update_turns_with_differential_speeds() {
        let mouse = differential_mouse();
        // Right wheel forward, left wheel backward: a counterclockwise spin.
        mouse.set_wheel_speeds(&BTreeMap::from([
            ("left".to_string(), -10.0),
            ("right".to_string(), 10.0),
        ]));
        mouse.update(Duration::from_millis(100));
        assert!(mouse.read_gyro() > 0.0);
        assert!(mouse.current_rotation().radians() > 0.5 * PI);
        // A pure spin leaves the translation in place.
        assert_abs_diff_eq!(mouse.current_translation().x, 0.09, epsilon = EPSILON);
        assert_abs_diff_eq!(mouse.current_translation().y, 0.09, epsilon = EPSILON);
    }

    #[test]
    fn test_update_while_crashed_is_a_no_op() {
        let mouse = differential_mouse();
        mouse.set_wheel_speeds_for_move_forward(1.0);
        mouse.set_crashed();
        let translation = mouse.current_translation();
        let rotation = mouse.current_rotation();
        let encoder = mouse.read_wheel_relative_encoder("left");

        mouse.update(Duration::from_secs(1));

        assert!(mouse.did_crash());
        assert_abs_diff_eq!(mouse.current_translation(), translation);
        assert_abs_diff_eq!(mouse.current_rotation(), rotation);
        assert_eq!(mouse.read_wheel_relative_encoder("left"), encoder);
    }

    #[test]
    fn test_reset_restores_pose_and_clears_crash() {
        let mouse = differential_mouse();
        mouse.teleport(Point2::new(0.4, 0.4), Angle::new(PI));
        mouse.set_crashed();
        mouse.reset();
        assert!(!mouse.did_crash());
        assert_abs_diff_eq!(mouse.current_translation(), Point2::new(0.09, 0.09));
        assert_abs_diff_eq!(mouse.current_rotation(), Angle::new(0.5 * PI));
    }

    #[test]
    fn test_reset_honors_a_new_starting_direction() {
        let mouse = differential_mouse();
        mouse.set_starting_direction(Direction::East);
        mouse.reset();
        assert_eq!(mouse.started_direction(), Direction::East);
        assert_abs_diff_eq!(mouse.current_rotation(), Angle::new(0.0));
    }

    #[rstest]
    #[case::east(0.0, Direction::East)]
    #[case::north(0.5 * PI, Direction::North)]
    #[case::west(PI, Direction::West)]
    #[case::south(1.5 * PI, Direction::South)]
    #[case::almost_north(0.5 * PI - 0.1, Direction::North)]
    #[case::wrapped_east(2.0 * PI - 0.1, Direction::East)]
    // The shifted angle here normalizes to exactly 2π through rounding.
    #[case::just_below_minus_forty_five(-(1.0 + f64::EPSILON) * 0.25 * PI, Direction::East)]
    fn test_discretized_rotation(#[case] rotation: f64, #[case] expected: Direction) {
        let mouse = differential_mouse();
        mouse.teleport(mouse.initial_translation(), Angle::new(rotation));
        assert_eq!(mouse.current_discretized_rotation(), expected);
    }

    #[test]
    fn test_discretized_translation() {
        let mouse = differential_mouse();
        assert_eq!(mouse.current_discretized_translation(), (0, 0));
        mouse.teleport(Point2::new(0.19, 0.37), Angle::new(0.0));
        assert_eq!(mouse.current_discretized_translation(), (1, 2));
    }

    #[test]
    fn test_update_refreshes_sensor_readings() {
        let mouse = differential_mouse();
        assert_abs_diff_eq!(mouse.read_sensor("front"), 0.0);

        // Park just south of the top border wall, still facing north; the
        // front sensor ends up 20 mm from the wall.
        mouse.teleport(Point2::new(0.09, 0.48), Angle::new(0.5 * PI));
        mouse.update(Duration::from_millis(1));
        let reading = mouse.read_sensor("front");
        assert!(reading > 0.5, "reading {reading} should be close to a wall");
        assert!(reading <= 1.0);
    }

    #[test]
    fn test_wheel_and_sensor_queries() {
        let mouse = differential_mouse();
        assert!(mouse.has_wheel("left"));
        assert!(!mouse.has_wheel("middle"));
        assert!(mouse.has_sensor("front"));
        assert!(!mouse.has_sensor("rear"));
        assert_abs_diff_eq!(mouse.wheel_max_speed("left"), 10.0);
        assert_eq!(mouse.wheel_encoder_type("left"), EncoderType::Relative);
        assert_abs_diff_eq!(mouse.wheel_encoder_ticks_per_revolution("left"), 360.0);
    }

    #[test]
    fn test_encoder_read_and_reset() {
        let mouse = differential_mouse();
        mouse.set_wheel_speeds_for_move_forward(1.0);
        mouse.update(Duration::from_secs(1));
        let ticks = mouse.read_wheel_relative_encoder("left");
        assert_eq!(ticks, (10.0 / (2.0 * PI) * 360.0).floor() as i32);
        mouse.reset_wheel_relative_encoder("left");
        assert_eq!(mouse.read_wheel_relative_encoder("left"), 0);
        // The absolute encoder is unaffected by relative resets.
        assert_eq!(
            mouse.read_wheel_absolute_encoder("left"),
            (10.0f64.rem_euclid(2.0 * PI) / (2.0 * PI) * 360.0).floor() as i32
        );
    }

    #[test]
    #[should_panic(expected = "no wheel named")]
    fn test_unknown_wheel_name_panics() {
        differential_mouse().wheel_max_speed("middle");
    }

    #[test]
    #[should_panic(expected = "no sensor named")]
    fn test_unknown_sensor_name_panics() {
        differential_mouse().read_sensor("rear");
    }

    #[test]
    fn test_starting_direction_follows_walled_start_tile() {
        // Start tile walled to the north but open to the east: heading east.
        let mut description = open_description(3, 3);
        description[0][0].north = true;
        description[0][1].south = true;
        let maze = Arc::new(
            Maze::new(&description, MazeValidity::Explorable, SimConfig::default()).unwrap(),
        );
        let mouse = Mouse::new(maze, SimConfig::default(), &differential_description()).unwrap();
        assert_eq!(mouse.started_direction(), Direction::East);
        assert_abs_diff_eq!(mouse.current_rotation(), Angle::new(0.0));
    }

    #[test]
    fn test_sensor_view_polygons_track_the_pose() {
        let maze = Arc::new(open_maze(3, 3));
        let mouse =
            Mouse::new(maze, SimConfig::default(), &differential_description()).unwrap();
        let (translation, rotation) = mouse.current_pose();
        let views = mouse.current_sensor_view_polygons(translation, rotation);
        assert_eq!(views.len(), 1);
        // The fan's apex is the sensor lens, 40 mm ahead of the body center.
        assert_abs_diff_eq!(
            views[0].vertices()[0],
            Point2::new(0.09, 0.13),
            epsilon = EPSILON
        );
    }
}
