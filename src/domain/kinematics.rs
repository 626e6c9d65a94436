//! Wheel-speed blending: per-wheel adjustment factors and curve turn factors.

use std::collections::BTreeMap;

use super::Wheel;

/// Per-wheel `(forward, turn)` blend weights, keyed by wheel name.
pub type SpeedAdjustmentFactors = BTreeMap<String, (f64, f64)>;

/// How much each wheel should contribute to a pure-forward versus a
/// pure-turn command.
///
/// A wheel that strongly moves the body forward at full speed gets a forward
/// factor near one; a wheel mounted sideways gets nearly none. Each wheel's
/// maximum effect is normalized against the largest magnitude observed
/// across all wheels, so every factor lands in `[-1, 1]`.
pub fn speed_adjustment_factors(wheels: &BTreeMap<String, Wheel>) -> SpeedAdjustmentFactors {
    let effects: Vec<(&String, f64, f64)> = wheels
        .iter()
        .map(|(name, wheel)| {
            let effect = wheel.maximum_effect();
            (name, effect.forward, effect.turn)
        })
        .collect();

    let max_forward_magnitude = effects
        .iter()
        .map(|&(_, forward, _)| forward.abs())
        .fold(0.0, f64::max);
    let max_turn_magnitude = effects
        .iter()
        .map(|&(_, _, turn)| turn.abs())
        .fold(0.0, f64::max);

    effects
        .into_iter()
        .map(|(name, forward, turn)| {
            let forward_factor = if max_forward_magnitude > 0.0 {
                forward / max_forward_magnitude
            } else {
                0.0
            };
            let turn_factor = if max_turn_magnitude > 0.0 {
                turn / max_turn_magnitude
            } else {
                0.0
            };
            assert!(
                (-1.0..=1.0).contains(&forward_factor) && (-1.0..=1.0).contains(&turn_factor),
                "adjustment factors for wheel {name:?} out of range: \
                 ({forward_factor}, {turn_factor})"
            );
            (name.clone(), (forward_factor, turn_factor))
        })
        .collect()
}

/// Maps a desired turning radius to a forward/turn blend pair.
#[derive(Clone, Debug)]
pub struct CurveTurnFactorCalculator {
    /// Body linear speed when the forward factor alone is 1.0, m/s.
    unit_forward_effect: f64,
    /// Body angular speed when the turn factor alone is 1.0, rad/s.
    unit_turn_effect: f64,
}

impl CurveTurnFactorCalculator {
    pub fn new(wheels: &BTreeMap<String, Wheel>, factors: &SpeedAdjustmentFactors) -> Self {
        let mut sum_forward = 0.0;
        let mut sum_turn = 0.0;
        for (name, wheel) in wheels {
            let (adjust_forward, adjust_turn) = factors[name];
            sum_forward += wheel
                .effect_at(wheel.max_angular_speed() * adjust_forward)
                .forward;
            sum_turn += wheel.effect_at(wheel.max_angular_speed() * adjust_turn).turn;
        }
        let count = wheels.len().max(1) as f64;
        Self {
            unit_forward_effect: sum_forward / count,
            unit_turn_effect: sum_turn / count,
        }
    }

    /// A `(forward, turn)` pair whose ratio produces the requested turning
    /// radius. The pair is unnormalized; command translation rescales it so
    /// the magnitudes sum to one.
    pub fn curve_turn_factors(&self, radius: f64) -> (f64, f64) {
        (
            radius * self.unit_turn_effect.abs(),
            self.unit_forward_effect.abs(),
        )
    }
}
