//! # Strategy module
//!
//! The strategy engine is the finite state machine which decides which
//! manouvre the drive supervisor should be running. It is evaluated once per
//! cycle with the latest [`SensorState`](crate::sens::SensorState) and moves
//! through a fixed cycle of behaviours:
//!
//! - `InitForward` - command a forward cruise, then immediately drive forward.
//! - `DrivingForward` - steer towards the opponent bearing until both front
//!   line sensors have travelled past the arena border by the edge clearance.
//! - `DrivingBackward` - reverse until the reverse distance is reached.
//! - `TurningAround` - spin in place until the turn completes, then start the
//!   cycle again.
//!
//! Whenever a new manouvre is installed the engine asks the caller to zero the
//! odometry, so that every manouvre measures its travel from its own start.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use state::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt::Display;

use serde::Serialize;

use crate::drive_sup::DriveSupError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The behaviours the strategy moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Behaviour {
    InitForward,
    DrivingForward,
    DrivingBackward,
    TurningAround,
}

/// Errors that can occur while stepping the strategy.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error("Could not change the drive command: {0}")]
    DriveSupError(DriveSupError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Behaviour {
    fn default() -> Self {
        Behaviour::InitForward
    }
}

impl Display for Behaviour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Behaviour::InitForward => "InitForward",
            Behaviour::DrivingForward => "DrivingForward",
            Behaviour::DrivingBackward => "DrivingBackward",
            Behaviour::TurningAround => "TurningAround",
        };

        write!(f, "{}", s)
    }
}

impl From<DriveSupError> for StrategyError {
    fn from(e: DriveSupError) -> Self {
        StrategyError::DriveSupError(e)
    }
}
