//! Parameters structure for the manouvres

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Controller tuning for every manouvre.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Params {

    // ---- FORWARD DISTANCE ----

    /// Distance controller proportional gain
    ///
    /// Units: duty %/tick
    pub fwd_k_p: f64,

    /// Maximum duty for either wheel while driving a distance.
    pub fwd_max_rate: Option<f64>,

    // ---- TURN ANGLE ----

    /// Turn controller proportional gain
    ///
    /// Units: duty %/tick
    pub turn_k_p: f64,

    /// Maximum duty for the wheels while turning.
    pub turn_max_rate: Option<f64>,

    // ---- STRAIGHT VELOCITY ----

    /// Cruise controller proportional gain
    ///
    /// Units: duty %/(ticks/ms)
    pub vel_k_p: f64,

    /// Cruise controller integral gain
    pub vel_k_i: f64,

    /// Amount the slowed wheel's setpoint drops per unit of seek demand.
    ///
    /// Units: ticks/ms
    pub seek_gain: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            fwd_k_p: 0.1,
            fwd_max_rate: None,
            turn_k_p: 0.1,
            turn_max_rate: None,
            vel_k_p: 10.0,
            vel_k_i: 1.5,
            seek_gain: 4.0,
        }
    }
}
