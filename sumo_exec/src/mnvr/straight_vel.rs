//! Cruise velocity manouvre with steering bias

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::Params;
use crate::{
    ctrl::PiController,
    encoder::{Calibration, EncoderSample}
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Hold both wheels at a cruise velocity, optionally steering towards a
/// target by slowing one wheel.
///
/// This is the default advance/pursue manouvre. It has no completion
/// condition and runs until it is replaced.
#[derive(Debug, Clone, Serialize)]
pub struct StraightVelocity {
    /// Common setpoint of both wheels
    ///
    /// Units: ticks/ms
    base_vel: f64,

    /// Setpoint drop per unit of seek demand
    ///
    /// Units: ticks/ms
    seek_gain: f64,

    /// Current seek demand, if any
    seek: Option<f64>,

    left_ctrl: PiController,
    right_ctrl: PiController,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StraightVelocity {
    /// Create a new cruise manouvre at the given speed.
    ///
    /// Units: inches/ms, negative speeds drive backwards.
    pub fn new(vel_in_ms: f64, params: &Params, calib: &Calibration) -> Self {
        let base_vel = calib.in_to_ticks(vel_in_ms);

        Self {
            base_vel,
            seek_gain: params.seek_gain,
            seek: None,
            left_ctrl: PiController::new(params.vel_k_p, params.vel_k_i, base_vel),
            right_ctrl: PiController::new(params.vel_k_p, params.vel_k_i, base_vel),
        }
    }

    /// Calculate the `(left, right)` wheel duty cycles from the measured
    /// wheel velocities.
    pub fn step(&mut self, left: &EncoderSample, right: &EncoderSample) -> (f64, f64) {
        (
            self.left_ctrl.get(left.vel_ticks_ms, left.dt_ms),
            self.right_ctrl.get(right.vel_ticks_ms, right.dt_ms)
        )
    }

    /// Steer towards a target.
    ///
    /// A negative `amount` slows the left wheel, curving towards a target on
    /// the left, a positive `amount` slows the right wheel. The slowed wheel's
    /// setpoint is `seek_gain * min(|amount|, 1)` below the base, so the bias
    /// never exceeds `seek_gain`. `None` (or a zero or NaN amount) removes any
    /// bias.
    pub fn seek(&mut self, amount: Option<f64>) {
        let amount = amount.filter(|a| a.is_finite() && *a != 0.0);
        self.seek = amount;

        let (left_vel, right_vel) = match amount {
            Some(a) => {
                let slowed = self.base_vel - self.seek_gain * a.abs().min(1.0);
                if a < 0.0 {
                    (slowed, self.base_vel)
                }
                else {
                    (self.base_vel, slowed)
                }
            },
            None => (self.base_vel, self.base_vel)
        };

        self.left_ctrl.set_vel(left_vel);
        self.right_ctrl.set_vel(right_vel);
    }

    /// Current `(left, right)` velocity setpoints.
    ///
    /// Units: ticks/ms
    pub fn setpoints(&self) -> (f64, f64) {
        (self.left_ctrl.vel(), self.right_ctrl.vel())
    }

    /// Units: ticks/ms
    pub fn base_vel(&self) -> f64 {
        self.base_vel
    }

    pub fn seek_amount(&self) -> Option<f64> {
        self.seek
    }

    /// True if either wheel's integral was bled on the last step.
    pub fn windup_bled(&self) -> bool {
        self.left_ctrl.windup_bled() || self.right_ctrl.windup_bled()
    }
}
