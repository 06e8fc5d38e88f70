//! Parameters structure for the encoders

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the wheel encoders.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Params {

    // ---- COUNTER ----

    /// The maximum value of the hardware counter before it wraps to zero.
    pub counter_max: u16,

    /// Distance from either end of the counter's range within which a jump
    /// to the other end is considered a wrap.
    ///
    /// Units: counts
    pub wrap_bound: u16,

    /// Reads closer together than this return the previous sample unchanged.
    ///
    /// Units: milliseconds
    pub min_sample_period_ms: u64,

    /// Invert the sign of the left encoder.
    pub invert_left: bool,

    /// Invert the sign of the right encoder, the right motor is mounted
    /// mirrored so forward motion counts down.
    pub invert_right: bool,

    // ---- GEOMETRY ----

    /// Calibration of ticks against physical quantities.
    pub calib: Calibration,
}

/// Conversion constants between encoder ticks and physical units.
///
/// Specific to the 2 inch wheels and encoder resolution of the robot.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Calibration {
    /// Linear wheel travel per tick.
    ///
    /// Units: inches/tick
    pub in_per_tick: f64,

    /// Body rotation per tick of one wheel, when turning on the spot.
    ///
    /// Units: degrees/tick
    pub deg_per_tick: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            counter_max: 65535,
            wrap_bound: 1000,
            min_sample_period_ms: 2,
            invert_left: false,
            invert_right: true,
            calib: Calibration::default(),
        }
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            in_per_tick: 0.006413900601,
            deg_per_tick: 0.1,
        }
    }
}

impl Calibration {
    /// Convert encoder ticks into inches of wheel travel.
    pub fn ticks_to_in(&self, ticks: f64) -> f64 {
        ticks * self.in_per_tick
    }

    /// Convert inches of wheel travel into encoder ticks.
    pub fn in_to_ticks(&self, inches: f64) -> f64 {
        inches / self.in_per_tick
    }

    /// Convert encoder ticks into degrees of body rotation, assuming the
    /// robot is spinning in place.
    pub fn ticks_to_deg(&self, ticks: f64) -> f64 {
        ticks * self.deg_per_tick
    }

    /// Convert degrees of body rotation into encoder ticks, assuming the
    /// robot is spinning in place.
    pub fn deg_to_ticks(&self, degrees: f64) -> f64 {
        degrees / self.deg_per_tick
    }
}
