//! # Manouvres module
//!
//! A manouvre is a closed loop motion primitive. Each one converts its
//! physical target (inches, degrees or inches/millisecond) into ticks when it
//! is built, so that its controllers always operate in the tick domain.
//!
//! The set of manouvres is closed and held in the [`Mnvr`] enum, which gives
//! the drive supervisor a uniform step/complete contract:
//!
//! - [`ForwardDistance`] - drive both wheels a given distance.
//! - [`TurnAngle`] - spin on the spot by a given angle.
//! - [`StraightVelocity`] - cruise at a given speed, optionally steering
//!   towards a target. Never completes, runs until replaced.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod fwd_dist;
mod params;
mod straight_vel;
mod turn_angle;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt::Display;

use serde::Serialize;
use util::maths::limit_magnitude;

use crate::encoder::EncoderSample;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use fwd_dist::ForwardDistance;
pub use params::Params;
pub use straight_vel::StraightVelocity;
pub use turn_angle::TurnAngle;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A manouvre which can be executed by the drive supervisor.
#[derive(Debug, Clone, Serialize)]
pub enum Mnvr {
    ForwardDistance(ForwardDistance),
    TurnAngle(TurnAngle),
    StraightVelocity(StraightVelocity),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Mnvr {
    /// Calculate the `(left, right)` wheel commands for the given samples.
    ///
    /// Commands are not saturated here, the drive supervisor saturates them
    /// before they reach the motors.
    pub fn step(&mut self, left: &EncoderSample, right: &EncoderSample) -> (f64, f64) {
        match self {
            Mnvr::ForwardDistance(m) => m.step(left, right),
            Mnvr::TurnAngle(m) => m.step(left),
            Mnvr::StraightVelocity(m) => m.step(left, right),
        }
    }

    /// Determine if the manouvre has reached its target.
    pub fn complete(&self, left: &EncoderSample, right: &EncoderSample) -> bool {
        match self {
            Mnvr::ForwardDistance(m) => m.complete(left, right),
            Mnvr::TurnAngle(m) => m.complete(left),
            Mnvr::StraightVelocity(_) => false,
        }
    }

    /// Apply a steering bias towards a target.
    ///
    /// Only cruise manouvres can seek, returns false if the bias was not
    /// applied.
    pub fn seek(&mut self, amount: Option<f64>) -> bool {
        match self {
            Mnvr::StraightVelocity(m) => {
                m.seek(amount);
                true
            },
            _ => false
        }
    }
}

impl Display for Mnvr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mnvr::ForwardDistance(m) => write!(
                f, "Mnvr::ForwardDistance({:.0} ticks)", m.target_ticks()
            ),
            Mnvr::TurnAngle(m) => write!(
                f, "Mnvr::TurnAngle({:.0} ticks)", m.target_ticks()
            ),
            Mnvr::StraightVelocity(m) => write!(
                f, "Mnvr::StraightVelocity({:.3} ticks/ms)", m.base_vel()
            ),
        }
    }
}

impl From<ForwardDistance> for Mnvr {
    fn from(m: ForwardDistance) -> Self {
        Mnvr::ForwardDistance(m)
    }
}

impl From<TurnAngle> for Mnvr {
    fn from(m: TurnAngle) -> Self {
        Mnvr::TurnAngle(m)
    }
}

impl From<StraightVelocity> for Mnvr {
    fn from(m: StraightVelocity) -> Self {
        Mnvr::StraightVelocity(m)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Apply an optional maximum rate to a wheel speed, keeping its sign.
fn limit_rate(speed: f64, max_rate: Option<f64>) -> f64 {
    match max_rate {
        Some(max) if speed != 0.0 => limit_magnitude(speed, max),
        _ => speed
    }
}

/// Has `ticks` reached `target` travelling in the given direction.
fn reached(ticks: f64, target: f64, positive: bool) -> bool {
    if positive {
        ticks >= target
    }
    else {
        ticks <= target
    }
}

/// Is `ticks` still short of `target` travelling in the given direction.
fn short_of(ticks: f64, target: f64, positive: bool) -> bool {
    if positive {
        ticks < target
    }
    else {
        ticks > target
    }
}
