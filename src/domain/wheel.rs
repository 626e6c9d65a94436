//! A wheel and its contribution to the body's rigid-body velocity.

use std::f64::consts::TAU;
use std::time::Duration;

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use super::{Angle, Polygon};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum EncoderType {
    Absolute,
    Relative,
}

/// A wheel's instantaneous contribution to forward, sideways, and rotational
/// body velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WheelEffect {
    /// Meters per second along the body's heading.
    pub forward: f64,
    /// Meters per second perpendicular to the heading.
    pub sideways: f64,
    /// Radians per second about the body center.
    pub turn: f64,
}

#[derive(Clone, Debug)]
pub struct Wheel {
    position_in_body: Vector2<f64>,
    direction_in_body: Angle,
    radius: f64,
    max_angular_speed: f64,
    angular_speed: f64,
    encoder_type: EncoderType,
    encoder_ticks_per_revolution: f64,
    absolute_rotation: f64,
    relative_rotation: f64,
    initial_polygon: Polygon,
}

impl Wheel {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        position_in_body: Vector2<f64>,
        direction_in_body: Angle,
        radius: f64,
        width: f64,
        max_angular_speed: f64,
        encoder_type: EncoderType,
        encoder_ticks_per_revolution: f64,
        initial_translation: Point2<f64>,
        initial_rotation: Angle,
    ) -> Self {
        // Rectangle in the wheel frame, rolling direction along +x, anchored
        // at the loaded world pose.
        let initial_polygon = Polygon::new(vec![
            Point2::new(-radius, -width / 2.0),
            Point2::new(radius, -width / 2.0),
            Point2::new(radius, width / 2.0),
            Point2::new(-radius, width / 2.0),
        ])
        .rotated_around(direction_in_body, Point2::origin())
        .translated(position_in_body)
        .rotated_around(initial_rotation, Point2::origin())
        .translated(initial_translation.coords);

        Self {
            position_in_body,
            direction_in_body,
            radius,
            max_angular_speed,
            angular_speed: 0.0,
            encoder_type,
            encoder_ticks_per_revolution,
            absolute_rotation: 0.0,
            relative_rotation: 0.0,
            initial_polygon,
        }
    }

    pub fn max_angular_speed(&self) -> f64 {
        self.max_angular_speed
    }

    pub fn angular_speed(&self) -> f64 {
        self.angular_speed
    }

    /// Precondition: `|angular_speed|` does not exceed the wheel's maximum.
    pub fn set_angular_speed(&mut self, angular_speed: f64) {
        debug_assert!(
            angular_speed.abs() <= self.max_angular_speed * (1.0 + 1e-9),
            "wheel speed {angular_speed} exceeds maximum {}",
            self.max_angular_speed
        );
        self.angular_speed = angular_speed;
    }

    pub fn encoder_type(&self) -> EncoderType {
        self.encoder_type
    }

    pub fn encoder_ticks_per_revolution(&self) -> f64 {
        self.encoder_ticks_per_revolution
    }

    pub fn initial_polygon(&self) -> &Polygon {
        &self.initial_polygon
    }

    /// Advance the encoders for the elapsed slice and report the effect at
    /// the current speed.
    pub fn update(&mut self, elapsed: Duration) -> WheelEffect {
        let rotation = self.angular_speed * elapsed.as_secs_f64();
        self.absolute_rotation += rotation;
        self.relative_rotation += rotation;
        self.effect_at(self.angular_speed)
    }

    /// The effect at full commanded speed.
    pub fn maximum_effect(&self) -> WheelEffect {
        self.effect_at(self.max_angular_speed)
    }

    pub(crate) fn effect_at(&self, angular_speed: f64) -> WheelEffect {
        let linear_speed = angular_speed * self.radius;
        let cos = self.direction_in_body.cos();
        let sin = self.direction_in_body.sin();
        let lever = self.position_in_body;
        let lever_norm_squared = lever.norm_squared();
        // A wheel at the body center cannot turn the body.
        let turn = if lever_norm_squared < f64::EPSILON {
            0.0
        } else {
            linear_speed * (lever.x * sin - lever.y * cos) / lever_norm_squared
        };
        WheelEffect {
            forward: linear_speed * cos,
            sideways: linear_speed * sin,
            turn,
        }
    }

    pub fn read_absolute_encoder(&self) -> i32 {
        (self.absolute_rotation.rem_euclid(TAU) / TAU * self.encoder_ticks_per_revolution).floor()
            as i32
    }

    pub fn read_relative_encoder(&self) -> i32 {
        (self.relative_rotation / TAU * self.encoder_ticks_per_revolution).floor() as i32
    }

    pub fn reset_relative_encoder(&mut self) {
        self.relative_rotation = 0.0;
    }
}
