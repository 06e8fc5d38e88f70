//! # Data Store

use log::{info, warn};
use serde::Serialize;

use crate::{
    drive_sup,
    sens::SensorState,
    sim::Pose,
    strategy::{Behaviour, StrategyStep}
};

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the robot has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize)]
pub enum SafeModeCause {
    /// The remote start signal hasn't been given, or the match has ended
    MatchInactive,

    /// Too many consecutive errors writing to the motors
    DriveFault,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Simulation time
    pub sim_time_ms: u64,

    // Safe mode variables
    /// Determines if the robot is in safe mode.
    pub safe: bool,

    /// Gives the reason for the robot being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // Sensing
    pub sensor_state: SensorState,

    // Strategy
    pub strategy_step: Option<StrategyStep>,

    // DriveSup
    pub drive_sup_input: drive_sup::InputData,
    pub drive_sup_output: drive_sup::OutputData,
    pub drive_sup_status_rpt: drive_sup::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Total number of cycle overruns
    pub num_cycle_overruns: u64,

    /// Number of consecutive strategy or drive supervisor errors
    pub num_consec_drive_errors: u64,

    /// Total number of strategy or drive supervisor errors
    pub num_drive_errors: u64,
}

/// Summary of a run, saved into the session at exit.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub num_cycles: u64,
    pub sim_time_ms: u64,
    pub safe_cause: Option<SafeModeCause>,
    pub behaviour: Behaviour,
    pub num_behaviour_cycles: u64,
    pub num_cmd_changes: u64,
    pub num_cycle_overruns: u64,
    pub num_drive_errors: u64,
    pub final_pose: Pose,
    pub out_of_ring: bool,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Puts the robot into safe mode with the given cause.
    ///
    /// The caller is responsible for stopping the motors.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// Returns `Ok(())` if this cause was cleared and safe mode was disabled,
    /// or `Err(())` otherwise. To remove safe mode the provided cause must
    /// match the initial reason for safe mode being enabled.
    ///
    /// If safe mode was not enabled `Ok(())` is returned
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), ()> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) if root_cause == cause => {
                self.safe = false;
                self.safe_cause = None;
                info!("Make unsafe requested, root cause match, safe mode disabled");
                Ok(())
            },
            Some(_) => Err(()),
            None => Ok(()),
        }
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and
    /// sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        let cycles_per_s = (cycle_frequency_hz as u64).max(1);
        self.is_1_hz_cycle = self.num_cycles % cycles_per_s == 0;

        self.strategy_step = None;
        self.drive_sup_input = drive_sup::InputData::default();
        self.drive_sup_output = drive_sup::OutputData::default();
        self.drive_sup_status_rpt = drive_sup::StatusReport::default();
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_safe_mode_causes() {
        let mut ds = DataStore::default();
        assert!(ds.make_unsafe(SafeModeCause::MatchInactive).is_ok());

        ds.make_safe(SafeModeCause::DriveFault);
        ds.make_safe(SafeModeCause::MatchInactive);
        assert_eq!(ds.safe_cause, Some(SafeModeCause::DriveFault));

        // Only the root cause can clear safe mode
        assert!(ds.make_unsafe(SafeModeCause::MatchInactive).is_err());
        assert!(ds.safe);
        assert!(ds.make_unsafe(SafeModeCause::DriveFault).is_ok());
        assert!(!ds.safe);
        assert_eq!(ds.safe_cause, None);
    }

    #[test]
    fn test_1_hz_cycle() {
        let mut ds = DataStore::default();

        ds.cycle_start(100.0);
        assert!(ds.is_1_hz_cycle);

        ds.num_cycles = 99;
        ds.cycle_start(100.0);
        assert!(!ds.is_1_hz_cycle);

        ds.num_cycles = 200;
        ds.cycle_start(100.0);
        assert!(ds.is_1_hz_cycle);
    }
}
