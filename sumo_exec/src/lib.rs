//! # Sumo robot library.
//!
//! Motion control and behaviour sequencing for a two wheel differential drive
//! sumo robot. The executable and benchmarks access the modules through this
//! library.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Controllers - proportional and proportional-integral control loops
pub mod ctrl;

/// Data store - global data of the executable
pub mod data_store;

/// Drive supervisor - owns the active manouvre and writes the motor demands
pub mod drive_sup;

/// Encoders - wheel position and velocity tracking from the hardware counters
pub mod encoder;

/// Executive - runs one control cycle of every module against the simulation
pub mod exec;

/// Manouvres - closed loop motion primitives
pub mod mnvr;

/// Sensing - line sensor, bearing and match signal interfaces
pub mod sens;

/// Simulation - simulated robot and ring, standing in for the hardware
pub mod sim;

/// Strategy - behaviour state machine choosing the active manouvre
pub mod strategy;
