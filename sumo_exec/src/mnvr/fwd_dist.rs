//! Straight line distance manouvre

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::{limit_rate, reached, short_of, Params};
use crate::{
    ctrl::PController,
    encoder::{Calibration, EncoderSample}
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive both wheels to the same absolute tick target.
///
/// Each wheel has its own controller. A wheel is only driven while it is
/// short of the target, unless `fix_overshoot` is set in which case the
/// wheels keep correcting past the target (for example if the robot is
/// pushed back after reaching it).
#[derive(Debug, Clone, Serialize)]
pub struct ForwardDistance {
    /// Target position of both wheels
    ///
    /// Units: ticks
    target_ticks: f64,

    /// True if the target is ahead (non-negative distance)
    forwards: bool,

    fix_overshoot: bool,

    max_rate: Option<f64>,

    left_ctrl: PController,
    right_ctrl: PController,

    calib: Calibration,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ForwardDistance {
    /// Create a new distance manouvre.
    ///
    /// Negative distances drive backwards, with the completion test flipped
    /// to match.
    pub fn new(
        dist_in: f64, 
        fix_overshoot: bool, 
        params: &Params, 
        calib: &Calibration
    ) -> Self {
        let target_ticks = calib.in_to_ticks(dist_in);

        Self {
            target_ticks,
            forwards: dist_in >= 0.0,
            fix_overshoot,
            max_rate: params.fwd_max_rate,
            left_ctrl: PController::new(params.fwd_k_p, target_ticks),
            right_ctrl: PController::new(params.fwd_k_p, target_ticks),
            calib: *calib,
        }
    }

    /// Calculate the `(left, right)` wheel speeds.
    pub fn step(&mut self, left: &EncoderSample, right: &EncoderSample) -> (f64, f64) {
        let left_speed = if self.should_drive(left.ticks) {
            self.left_ctrl.get(left.ticks as f64)
        }
        else {
            0.0
        };

        let right_speed = if self.should_drive(right.ticks) {
            self.right_ctrl.get(right.ticks as f64)
        }
        else {
            0.0
        };

        (
            limit_rate(left_speed, self.max_rate), 
            limit_rate(right_speed, self.max_rate)
        )
    }

    /// Complete once both wheels have reached the target.
    pub fn complete(&self, left: &EncoderSample, right: &EncoderSample) -> bool {
        reached(left.ticks as f64, self.target_ticks, self.forwards)
            && reached(right.ticks as f64, self.target_ticks, self.forwards)
    }

    /// Distance remaining for the `(left, right)` wheels.
    ///
    /// Units: inches
    pub fn dist_remaining_in(&self, left: &EncoderSample, right: &EncoderSample) -> (f64, f64) {
        (
            self.calib.ticks_to_in(self.target_ticks - left.ticks as f64),
            self.calib.ticks_to_in(self.target_ticks - right.ticks as f64)
        )
    }

    pub fn target_ticks(&self) -> f64 {
        self.target_ticks
    }

    fn should_drive(&self, ticks: i64) -> bool {
        self.fix_overshoot || short_of(ticks as f64, self.target_ticks, self.forwards)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mnvr::test::sample;

    fn calib() -> Calibration {
        Calibration {
            in_per_tick: 0.01,
            deg_per_tick: 0.1,
        }
    }

    #[test]
    fn test_drives_until_target() {
        let mut m = ForwardDistance::new(10.0, false, &Params::default(), &calib());
        assert!((m.target_ticks() - 1000.0).abs() < 1e-9);

        let (l, r) = m.step(&sample(0), &sample(500));
        assert!((l - 100.0).abs() < 1e-9);
        assert!((r - 50.0).abs() < 1e-9);
        assert!(!m.complete(&sample(0), &sample(500)));

        // Left wheel has arrived, right still driving
        let (l, r) = m.step(&sample(1000), &sample(900));
        assert_eq!(l, 0.0);
        assert!((r - 10.0).abs() < 1e-9);
        assert!(!m.complete(&sample(1000), &sample(900)));

        // Overshoot is not corrected without the flag
        let (l, r) = m.step(&sample(1100), &sample(1050));
        assert_eq!((l, r), (0.0, 0.0));
        assert!(m.complete(&sample(1100), &sample(1050)));
    }

    #[test]
    fn test_fix_overshoot() {
        let mut m = ForwardDistance::new(10.0, true, &Params::default(), &calib());

        let (l, r) = m.step(&sample(1100), &sample(1000));
        assert!((l + 10.0).abs() < 1e-9);
        assert_eq!(r, 0.0);

        // Completion is unaffected by the flag
        assert!(m.complete(&sample(1100), &sample(1000)));
    }

    #[test]
    fn test_backwards() {
        let mut m = ForwardDistance::new(-5.0, false, &Params::default(), &calib());

        let (l, r) = m.step(&sample(0), &sample(-400));
        assert!((l + 50.0).abs() < 1e-9);
        assert!((r + 10.0).abs() < 1e-9);
        assert!(!m.complete(&sample(0), &sample(-400)));
        assert!(m.complete(&sample(-500), &sample(-501)));
    }

    #[test]
    fn test_rate_limit_and_remaining() {
        let params = Params {
            fwd_max_rate: Some(30.0),
            ..Params::default()
        };
        let mut m = ForwardDistance::new(10.0, false, &params, &calib());

        assert_eq!(m.step(&sample(0), &sample(900)).0, 30.0);
        assert!((m.step(&sample(0), &sample(900)).1 - 10.0).abs() < 1e-9);

        let (l, r) = m.dist_remaining_in(&sample(250), &sample(1000));
        assert!((l - 7.5).abs() < 1e-9);
        assert!(r.abs() < 1e-9);
    }
}
