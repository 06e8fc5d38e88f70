//! Parameters structure for the simulated plant

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Params {

    // ---- ARENA ----

    /// Radius of the ring, including the border.
    ///
    /// Units: inches
    pub arena_radius_in: f64,

    /// Width of the white border at the edge of the ring.
    ///
    /// Units: inches
    pub border_width_in: f64,

    /// Position of the (stationary) opponent relative to the ring centre.
    ///
    /// Units: inches
    pub opponent_pos_in: [f64; 2],

    // ---- ROBOT ----

    /// Starting position of the robot relative to the ring centre.
    ///
    /// Units: inches
    pub start_pos_in: [f64; 2],

    /// Starting heading of the robot, anticlockwise from the x axis.
    ///
    /// Units: degrees
    pub start_heading_deg: f64,

    /// Distance between the wheel contact points.
    ///
    /// Units: inches
    pub track_width_in: f64,

    /// Wheel speed at 100 % duty.
    ///
    /// Units: inches/millisecond
    pub max_wheel_vel_in_ms: f64,

    /// First order time constant of the motor response.
    ///
    /// Units: milliseconds
    pub motor_time_const_ms: f64,

    /// Position of the front line sensors ahead of the axle.
    ///
    /// Units: inches
    pub line_sens_fwd_in: f64,

    /// Lateral offset of each front line sensor from the centreline.
    ///
    /// Units: inches
    pub line_sens_lat_in: f64,

    // ---- BEARING ESTIMATOR ----

    /// Period between bearing estimate updates.
    ///
    /// Units: milliseconds
    pub bearing_refresh_ms: u64,

    /// Full field of view of the ranging sensors.
    ///
    /// Units: degrees
    pub bearing_fov_deg: f64,

    /// Maximum range at which the opponent is detected.
    ///
    /// Units: inches
    pub bearing_max_range_in: f64,

    // ---- MATCH ----

    /// Delay between power on and the start signal.
    ///
    /// Units: milliseconds
    pub start_delay_ms: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            arena_radius_in: 30.0,
            border_width_in: 2.0,
            opponent_pos_in: [20.0, 4.0],
            start_pos_in: [-10.0, 0.0],
            start_heading_deg: 0.0,
            // Matches the default 0.1 degrees per tick for the 0.0064 in/tick
            // wheels
            track_width_in: 7.35,
            max_wheel_vel_in_ms: 0.04,
            motor_time_const_ms: 80.0,
            line_sens_fwd_in: 3.0,
            line_sens_lat_in: 2.0,
            bearing_refresh_ms: 100,
            bearing_fov_deg: 50.0,
            bearing_max_range_in: 40.0,
            start_delay_ms: 500,
        }
    }
}
