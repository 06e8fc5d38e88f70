//! # Executive
//!
//! The [`SumoExec`] wires the modules together around the simulated plant and
//! runs a single control cycle at a time:
//!
//! 1. Advance the plant by one cycle period.
//! 2. Sense the encoders, line sensors and opponent bearing.
//! 3. Gate on the match signal, holding the robot stopped in safe mode.
//! 4. Step the strategy, zeroing the odometry if it asks for it.
//! 5. Process the drive supervisor with the (possibly zeroed) encoder samples.
//! 6. Write the module archives.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{error, info, warn};
use serde::de::DeserializeOwned;

use crate::{
    data_store::{DataStore, RunSummary, SafeModeCause},
    drive_sup::{self, DriveSup},
    encoder::{self, EncoderPair},
    mnvr,
    sens::{MatchSignal, Sensing},
    sim::{self, SimBearing, SimCounter, SimLineSensor, SimMatchSignal, SimMotor, SimRobot},
    strategy::{self, StrategyEngine}
};
use util::{
    archive::{ArchiveError, Archived},
    module::State,
    session::Session
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of consecutive drive errors after which safe mode is engaged.
pub const MAX_DRIVE_ERROR_LIMIT: u64 = 5;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of every module.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecParams {
    pub encoder: encoder::Params,
    pub mnvr: mnvr::Params,
    pub strategy: strategy::Params,
    pub sim: sim::Params,
}

/// The executive, owning every module.
pub struct SumoExec {
    pub ds: DataStore,
    pub sim: SimRobot,

    sensing: Sensing<SimCounter, SimLineSensor, SimBearing>,
    match_signal: SimMatchSignal,
    drive_sup: DriveSup<SimMotor>,
    strategy: StrategyEngine,

    cycle_period_ms: u64,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Could not write the archives: {0}")]
    ArchiveError(ArchiveError),

    #[error("Could not stop the motors: {0}")]
    StopError(drive_sup::DriveSupError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ExecParams {
    /// Load every parameter file, falling back to the defaults for any file
    /// which can't be loaded.
    pub fn load() -> Self {
        Self {
            encoder: load_or_default("encoder.toml"),
            mnvr: load_or_default("mnvr.toml"),
            strategy: load_or_default("strategy.toml"),
            sim: load_or_default("sim.toml"),
        }
    }
}

impl SumoExec {
    pub fn new(params: &ExecParams, cycle_period_ms: u64) -> Self {
        let sim = SimRobot::new(params.sim, &params.encoder);

        let (left_cnt, right_cnt) = sim.counters();
        let (front_left, front_right) = sim.line_sensors();
        let (left_mot, right_mot) = sim.motors();

        let encoders = EncoderPair::new(left_cnt, right_cnt, &params.encoder, sim.time_ms());

        Self {
            ds: DataStore::default(),
            sensing: Sensing::new(encoders, front_left, front_right, sim.bearing_source()),
            match_signal: sim.match_signal(),
            drive_sup: DriveSup::new(left_mot, right_mot),
            strategy: StrategyEngine::new(params.strategy, params.mnvr, params.encoder.calib),
            sim,
            cycle_period_ms: cycle_period_ms.max(1),
        }
    }

    /// Execute one control cycle.
    ///
    /// Strategy and drive supervisor errors are counted rather than returned,
    /// and engage safe mode once [`MAX_DRIVE_ERROR_LIMIT`] occur in a row.
    pub fn cycle(&mut self) -> Result<(), ExecError> {
        self.ds.cycle_start(1000.0 / self.cycle_period_ms as f64);

        // ---- DATA INPUT ----

        self.sim.advance(self.cycle_period_ms);
        self.ds.sim_time_ms = self.sim.time_ms();

        let sens = self.sensing.sense(self.ds.sim_time_ms);
        self.ds.sensor_state = sens;

        if self.match_signal.is_match_active() {
            self.ds.make_unsafe(SafeModeCause::MatchInactive).ok();
        }
        else {
            self.ds.make_safe(SafeModeCause::MatchInactive);
        }

        // ---- STRATEGY ----

        let mut input = drive_sup::InputData {
            left: sens.left_enc,
            right: sens.right_enc,
        };

        let mut cycle_ok = true;

        if self.ds.safe {
            // A faulted driver can't be stopped either, keep cycling so the
            // fault is counted and the run can still be shut down cleanly
            if let Err(e) = self.drive_sup.clear_command() {
                warn!("Could not stop the motors in safe mode: {}", e);
                cycle_ok = false;
            }
            self.strategy.reset();
        }
        else {
            match self.strategy.step(&sens, &mut self.drive_sup) {
                Ok(step) => {
                    if step.reset_odometry {
                        let (left, right) = self.sensing.zero_odometry();
                        input = drive_sup::InputData { left, right };
                    }
                    self.ds.strategy_step = Some(step);
                },
                Err(e) => {
                    warn!("Error during strategy processing: {}", e);
                    cycle_ok = false;
                }
            }
        }

        // ---- DRIVE SUPERVISOR ----

        self.ds.drive_sup_input = input;

        match self.drive_sup.proc(&input) {
            Ok((o, r)) => {
                self.ds.drive_sup_output = o;
                self.ds.drive_sup_status_rpt = r;
            },
            Err(e) => {
                warn!("Error during DriveSup processing: {}", e);
                cycle_ok = false;
            }
        }

        if cycle_ok {
            self.ds.num_consec_drive_errors = 0;
        }
        else {
            self.ds.num_drive_errors += 1;
            self.ds.num_consec_drive_errors += 1;

            if self.ds.num_consec_drive_errors > MAX_DRIVE_ERROR_LIMIT {
                if !self.ds.safe {
                    error!(
                        "Maximum number of consecutive drive errors ({}) has been exceeded",
                        MAX_DRIVE_ERROR_LIMIT
                    );
                }
                self.ds.make_safe(SafeModeCause::DriveFault);
            }
        }

        // ---- STATUS ----

        if self.ds.is_1_hz_cycle {
            let pose = self.sim.pose();
            info!(
                "t = {:.1} s, {}, pose ({:.1}, {:.1}, {:.0} deg), duty ({:.0}, {:.0})",
                self.ds.sim_time_ms as f64 / 1000.0,
                self.strategy.behaviour(),
                pose.x_in,
                pose.y_in,
                pose.heading_rad.to_degrees(),
                self.ds.drive_sup_output.left_duty,
                self.ds.drive_sup_output.right_duty
            );
        }

        // ---- WRITE ARCHIVES ----

        self.write().map_err(ExecError::ArchiveError)?;

        self.ds.num_cycles += 1;

        Ok(())
    }

    /// Stop the robot, used at shutdown.
    pub fn stop(&mut self) -> Result<(), ExecError> {
        self.drive_sup.clear_command().map_err(ExecError::StopError)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            num_cycles: self.ds.num_cycles,
            sim_time_ms: self.ds.sim_time_ms,
            safe_cause: self.ds.safe_cause,
            behaviour: self.strategy.behaviour(),
            num_behaviour_cycles: self.strategy.num_cycles(),
            num_cmd_changes: self.drive_sup.num_cmd_changes(),
            num_cycle_overruns: self.ds.num_cycle_overruns,
            num_drive_errors: self.ds.num_drive_errors,
            final_pose: self.sim.pose(),
            out_of_ring: self.sim.out_of_ring(),
        }
    }

    pub fn strategy(&self) -> &StrategyEngine {
        &self.strategy
    }

    pub fn drive_sup(&self) -> &DriveSup<SimMotor> {
        &self.drive_sup
    }
}

impl Archived for SumoExec {
    fn init_archives(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.drive_sup.init_archives(session)?;
        self.strategy.init_archives(session)?;

        Ok(())
    }

    fn write(&mut self) -> Result<(), ArchiveError> {
        self.drive_sup.write()?;
        self.strategy.write()?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file, warning and using the defaults if it can't be
/// loaded.
fn load_or_default<P>(file: &str) -> P
where
    P: DeserializeOwned + Default
{
    match util::params::load(file) {
        Ok(p) => {
            info!("Loaded {}", file);
            p
        },
        Err(e) => {
            warn!("Could not load {}, using defaults: {}", file, e);
            P::default()
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::strategy::Behaviour;

    const PERIOD_MS: u64 = 10;

    #[test]
    fn test_param_files_parse() {
        let enc: encoder::Params = util::params::from_str(
            include_str!("../../params/encoder.toml")
        ).unwrap();
        assert_eq!(enc.calib, encoder::Calibration::default());

        let mnvr: mnvr::Params = util::params::from_str(
            include_str!("../../params/mnvr.toml")
        ).unwrap();
        assert_eq!(mnvr.turn_max_rate, None);

        let strat: strategy::Params = util::params::from_str(
            include_str!("../../params/strategy.toml")
        ).unwrap();
        assert_eq!(strat.turn_deg, 75.0);

        let sim: sim::Params = util::params::from_str(
            include_str!("../../params/sim.toml")
        ).unwrap();
        assert_eq!(sim.bearing_refresh_ms, 100);
    }

    #[test]
    fn test_held_until_match_start() {
        let mut exec = SumoExec::new(&ExecParams::default(), PERIOD_MS);

        // Start delay is 500 ms
        for _ in 0..49 {
            exec.cycle().unwrap();
            assert!(exec.ds.safe);
            assert_eq!(exec.ds.safe_cause, Some(SafeModeCause::MatchInactive));
            assert!(exec.drive_sup().active().is_none());
            assert_eq!(exec.ds.drive_sup_output.left_duty, 0.0);
            assert_eq!(exec.ds.drive_sup_output.right_duty, 0.0);
        }

        exec.cycle().unwrap();
        assert!(!exec.ds.safe);
        assert_eq!(exec.strategy().behaviour(), Behaviour::DrivingForward);
        assert!(exec.drive_sup().active().is_some());
        assert!(exec.ds.strategy_step.map_or(false, |s| s.reset_odometry));
    }

    #[test]
    fn test_drive_fault_engages_safe_mode() {
        let mut exec = SumoExec::new(&ExecParams::default(), PERIOD_MS);

        for _ in 0..50 {
            exec.cycle().unwrap();
        }
        assert!(!exec.ds.safe);
        assert_eq!(exec.strategy().behaviour(), Behaviour::DrivingForward);

        exec.sim.set_motor_fault(drive_sup::Side::Left, true);

        for i in 0..MAX_DRIVE_ERROR_LIMIT {
            exec.cycle().unwrap();
            assert!(!exec.ds.safe, "safe after {} errors", i + 1);
            assert_eq!(exec.ds.num_consec_drive_errors, i + 1);
        }

        exec.cycle().unwrap();
        assert!(exec.ds.safe);
        assert_eq!(exec.ds.safe_cause, Some(SafeModeCause::DriveFault));
        assert_eq!(exec.ds.num_drive_errors, MAX_DRIVE_ERROR_LIMIT + 1);

        // Stopping a faulted driver fails but the cycle carries on
        exec.cycle().unwrap();
        assert!(exec.drive_sup().active().is_none());
        assert!(exec.stop().is_err());

        // The match is still active, but that doesn't clear a drive fault
        exec.sim.set_motor_fault(drive_sup::Side::Left, false);
        for _ in 0..20 {
            exec.cycle().unwrap();
            assert!(exec.ds.safe);
            assert_eq!(exec.ds.safe_cause, Some(SafeModeCause::DriveFault));
            assert!(exec.drive_sup().active().is_none());
        }
        assert_eq!(exec.ds.num_consec_drive_errors, 0);
        assert!(exec.stop().is_ok());
        assert_eq!(exec.summary().safe_cause, Some(SafeModeCause::DriveFault));
    }

    #[test]
    fn test_full_behaviour_cycle() {
        let mut exec = SumoExec::new(&ExecParams::default(), PERIOD_MS);

        let mut seen = Vec::new();
        for _ in 0..3000 {
            exec.cycle().unwrap();
            let b = exec.strategy().behaviour();
            if seen.last() != Some(&b) {
                seen.push(b);
            }
            if exec.strategy().num_cycles() >= 1 {
                break;
            }
        }

        assert_eq!(
            &seen[..5],
            &[
                Behaviour::InitForward,
                Behaviour::DrivingForward,
                Behaviour::DrivingBackward,
                Behaviour::TurningAround,
                Behaviour::InitForward
            ]
        );
        assert_eq!(exec.ds.num_drive_errors, 0);
        assert!(!exec.sim.out_of_ring());

        let summary = exec.summary();
        assert_eq!(summary.num_behaviour_cycles, 1);
        // Forward, backward, turn and the clear at the end of the turn
        assert_eq!(summary.num_cmd_changes, 4);
    }
}
