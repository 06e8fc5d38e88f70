//! # Controllers module
//!
//! This module provides the feedback controllers used by the manouvres. Both
//! controllers are pure functions of the measurement passed in and their own
//! internal state, the caller decides when to evaluate them.
//!
//! - [`PController`] - proportional position control, used for distance and
//!   turn manouvres.
//! - [`PiController`] - proportional-integral velocity (cruise) control with
//!   anti-windup and output saturation.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod p_ctrl;
mod pi_ctrl;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use p_ctrl::PController;
pub use pi_ctrl::PiController;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum magnitude of a motor duty cycle command.
///
/// Units: percent
pub const DUTY_MAX: f64 = 100.0;

/// Factor applied to the PI integral accumulator when the integral term
/// exceeds [`DUTY_MAX`].
pub const WINDUP_BLEED: f64 = 0.25;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Sanitise a controller gain, negative or NaN gains become zero.
pub(crate) fn sanitise_gain(gain: f64) -> f64 {
    if gain >= 0.0 {
        gain
    }
    else {
        0.0
    }
}
