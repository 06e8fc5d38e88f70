//! Proportional-integral cruise controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use serde::Serialize;
use util::maths::saturate;

use super::{sanitise_gain, DUTY_MAX, WINDUP_BLEED};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PI velocity controller with duty cycle saturation.
///
/// The integral accumulator is seeded with the initial setpoint rather than
/// zero so that a cruise command starts near its steady state duty.
///
/// Anti-windup scales the accumulator by [`WINDUP_BLEED`] whenever the
/// integral term would exceed [`DUTY_MAX`]. The accumulator keeps tracking
/// the error but decays back towards a non-saturating magnitude instead of
/// being frozen.
#[derive(Debug, Clone, Serialize)]
pub struct PiController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Target velocity
    setpoint: f64,

    /// The integral accumulation
    integral: f64,

    /// True if the last call to `get` bled the accumulator
    #[serde(skip)]
    bled: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PiController {

    /// Create a new controller with the given gains and target velocity.
    pub fn new(k_p: f64, k_i: f64, vel: f64) -> Self {
        let mut ctrl = Self {
            k_p: 0.0,
            k_i: 0.0,
            setpoint: vel,
            integral: vel,
            bled: false,
        };
        ctrl.set_k_p(k_p);
        ctrl.set_k_i(k_i);
        ctrl
    }

    /// Get the saturated actuator command for the measured velocity.
    ///
    /// `dt` is the time since the previous measurement, in the same time
    /// units as the velocity.
    pub fn get(&mut self, measurement: f64, dt: f64) -> f64 {
        let error = self.setpoint - measurement;

        let p_term = self.k_p * error;

        self.integral += error;
        let mut i_term = self.k_i * self.integral * dt;

        self.bled = false;
        if i_term.abs() > DUTY_MAX {
            self.integral *= WINDUP_BLEED;
            i_term = self.k_i * self.integral * dt;
            self.bled = true;

            debug!(
                "PI integral term saturated, accumulator bled to {:.3}", 
                self.integral
            );
        }

        saturate(p_term + i_term, DUTY_MAX)
    }

    /// Set the proportional gain, negative values are set to zero.
    pub fn set_k_p(&mut self, k_p: f64) {
        self.k_p = sanitise_gain(k_p);
    }

    /// Set the integral gain, negative values are set to zero.
    pub fn set_k_i(&mut self, k_i: f64) {
        self.k_i = sanitise_gain(k_i);
    }

    /// Set the target velocity.
    pub fn set_vel(&mut self, vel: f64) {
        self.setpoint = vel;
    }

    pub fn vel(&self) -> f64 {
        self.setpoint
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn k_p(&self) -> f64 {
        self.k_p
    }

    pub fn k_i(&self) -> f64 {
        self.k_i
    }

    /// Returns true if the last evaluation triggered the anti-windup bleed.
    pub fn windup_bled(&self) -> bool {
        self.bled
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_warm_start() {
        let mut c = PiController::new(2.0, 1.0, 3.0);
        assert_eq!(c.integral(), 3.0);

        // At the setpoint the output is the warm start integral alone
        let out = c.get(3.0, 10.0);
        assert!((out - 30.0).abs() < 1e-12);
        assert_eq!(c.integral(), 3.0);
        assert!(!c.windup_bled());
    }

    #[test]
    fn test_p_and_i_terms() {
        let mut c = PiController::new(2.0, 0.5, 1.0);

        // error = 1, integral = 1 + 1 = 2, p = 2, i = 0.5 * 2 * 4 = 4
        let out = c.get(0.0, 4.0);
        assert!((out - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_anti_windup_bleeds_accumulator() {
        let mut c = PiController::new(0.0, 1.0, 10.0);

        // Unclamped the accumulator would reach 10 + 10 = 20, giving an
        // integral term of 200.
        let unclamped = 20.0;
        let out = c.get(0.0, 10.0);

        assert!(c.windup_bled());
        assert!(c.integral() < unclamped);
        assert!((c.integral() - unclamped * WINDUP_BLEED).abs() < 1e-12);
        assert!((out - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_anti_windup_negative() {
        let mut c = PiController::new(0.0, 1.0, -10.0);
        let out = c.get(0.0, 10.0);

        assert!(c.windup_bled());
        assert!((c.integral() + 5.0).abs() < 1e-12);
        assert!((out + 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_output_always_saturated() {
        let mut c = PiController::new(50.0, 3.0, 5.0);

        // Simple LCG so the sequence is deterministic
        let mut seed: u64 = 12345;
        let mut next = || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((seed >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
        };

        for i in 0..10_000 {
            if i % 500 == 0 {
                c.set_vel(next() * 1e4);
            }
            let meas = next() * 1e6;
            let dt = (next() + 1.0) * 20.0;
            let out = c.get(meas, dt);
            assert!(out.abs() <= DUTY_MAX, "output {} out of range", out);
        }
    }

    #[test]
    fn test_negative_gains_clamped() {
        let mut c = PiController::new(-1.0, -1.0, 2.0);
        assert_eq!(c.k_p(), 0.0);
        assert_eq!(c.k_i(), 0.0);
        assert_eq!(c.get(0.0, 10.0), 0.0);

        c.set_vel(4.0);
        assert_eq!(c.vel(), 4.0);
    }
}
