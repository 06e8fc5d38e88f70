//! Proportional controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::sanitise_gain;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A proportional only position controller.
#[derive(Debug, Clone, Serialize)]
pub struct PController {
    /// Proportional gain
    k_p: f64,

    /// Target value of the measurement
    setpoint: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PController {

    /// Create a new controller with the given gain and setpoint.
    ///
    /// A negative gain is clamped to zero.
    pub fn new(k_p: f64, setpoint: f64) -> Self {
        let mut ctrl = Self {
            k_p: 0.0,
            setpoint,
        };
        ctrl.set_k_p(k_p);
        ctrl
    }

    /// Get the actuator command for the given measurement.
    pub fn get(&self, measurement: f64) -> f64 {
        self.k_p * (self.setpoint - measurement)
    }

    /// Set the proportional gain.
    ///
    /// Negative gains would invert the feedback and destabilise the loop, so
    /// they are set to zero instead.
    pub fn set_k_p(&mut self, k_p: f64) {
        self.k_p = sanitise_gain(k_p);
    }

    /// Set the target value.
    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn k_p(&self) -> f64 {
        self.k_p
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_p_output() {
        let mut c = PController::new(0.1, 900.0);
        assert!((c.get(0.0) - 90.0).abs() < 1e-12);
        assert!((c.get(950.0) + 5.0).abs() < 1e-12);

        c.set_setpoint(100.0);
        assert!((c.get(50.0) - 5.0).abs() < 1e-12);
        assert_eq!(c.get(100.0), 0.0);
    }

    #[test]
    fn test_negative_gain_clamped() {
        let mut c = PController::new(-2.0, 10.0);
        assert_eq!(c.k_p(), 0.0);
        assert_eq!(c.get(0.0), 0.0);

        c.set_k_p(0.5);
        assert_eq!(c.k_p(), 0.5);

        c.set_k_p(-0.5);
        assert_eq!(c.k_p(), 0.0);

        c.set_k_p(std::f64::NAN);
        assert_eq!(c.k_p(), 0.0);
    }
}
