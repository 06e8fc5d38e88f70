//! Parameters structure for the strategy engine

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Params {
    /// Speed of the forward and reverse cruises.
    ///
    /// Units: inches/millisecond
    pub cruise_vel_in_ms: f64,

    /// Distance both front line sensors must travel past the border before
    /// the robot backs off.
    ///
    /// Units: inches
    pub edge_clear_in: f64,

    /// Left wheel travel at which reversing stops, must be negative.
    ///
    /// Units: inches
    pub reverse_dist_in: f64,

    /// Angle of the turn after reversing.
    ///
    /// Units: degrees
    pub turn_deg: f64,

    /// Keep correcting the turn after it passes its target.
    pub turn_fix_overshoot: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            cruise_vel_in_ms: 0.018,
            edge_clear_in: 1.5,
            reverse_dist_in: -6.0,
            turn_deg: 75.0,
            turn_fix_overshoot: false,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_file_rejected() {
        // Every field is required, a file missing one must not silently load
        assert!(util::params::from_str::<Params>("edge_clear_in = 2.0").is_err());

        let p: Params = util::params::from_str(
            "cruise_vel_in_ms = 0.02\n\
             edge_clear_in = 2.0\n\
             reverse_dist_in = -4.0\n\
             turn_deg = 90.0\n\
             turn_fix_overshoot = true\n"
        ).unwrap();
        assert_eq!(p.turn_deg, 90.0);
        assert!(p.turn_fix_overshoot);
    }
}
