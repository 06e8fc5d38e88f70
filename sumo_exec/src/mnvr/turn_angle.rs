//! Turn on the spot manouvre

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use serde::Serialize;

use super::{limit_rate, reached, short_of, Params};
use crate::{
    ctrl::PController,
    encoder::{Calibration, EncoderSample}
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Spin the robot in place by a given angle.
///
/// A single controller drives the left wheel and the right wheel is given the
/// negated command, producing a symmetric spin. Positive angles (and zero)
/// are clockwise.
#[derive(Debug, Clone, Serialize)]
pub struct TurnAngle {
    /// Target position of the left wheel
    ///
    /// Units: ticks
    target_ticks: f64,

    clockwise: bool,

    fix_overshoot: bool,

    max_rate: Option<f64>,

    ctrl: PController,

    calib: Calibration,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TurnAngle {
    /// Create a new turn of the given angle in degrees.
    ///
    /// A turn of exactly 0 degrees is clockwise with a zero target, it is
    /// complete as soon as it is started.
    pub fn new(
        degrees: f64, 
        fix_overshoot: bool, 
        params: &Params, 
        calib: &Calibration
    ) -> Self {
        let target_ticks = calib.deg_to_ticks(degrees);
        let clockwise = degrees >= 0.0;

        debug!(
            "New turn of {} deg ({:.0} ticks), clockwise: {}", 
            degrees, target_ticks, clockwise
        );

        Self {
            target_ticks,
            clockwise,
            fix_overshoot,
            max_rate: params.turn_max_rate,
            ctrl: PController::new(params.turn_k_p, target_ticks),
            calib: *calib,
        }
    }

    /// Calculate the `(left, right)` wheel speeds from the left wheel
    /// position.
    pub fn step(&mut self, left: &EncoderSample) -> (f64, f64) {
        let ticks = left.ticks as f64;

        let speed = if self.fix_overshoot 
            || short_of(ticks, self.target_ticks, self.clockwise) 
        {
            limit_rate(self.ctrl.get(ticks), self.max_rate)
        }
        else {
            0.0
        };

        (speed, -speed)
    }

    /// Complete once the left wheel reaches the target in the direction of
    /// the turn.
    pub fn complete(&self, left: &EncoderSample) -> bool {
        reached(left.ticks as f64, self.target_ticks, self.clockwise)
    }

    /// Angle remaining.
    ///
    /// Units: degrees
    pub fn dist_remaining_deg(&self, left: &EncoderSample) -> f64 {
        self.calib.ticks_to_deg(self.target_ticks - left.ticks as f64)
    }

    pub fn target_ticks(&self) -> f64 {
        self.target_ticks
    }

    pub fn is_clockwise(&self) -> bool {
        self.clockwise
    }
}
