//! Strategy engine state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;

// Internal
use super::{Behaviour, Params, StrategyError};
use crate::{
    drive_sup::{DriveSup, Motor},
    encoder::{Calibration, EncoderSample},
    mnvr::{self, StraightVelocity, TurnAngle},
    sens::{SensorState, FRONT_LEFT, FRONT_RIGHT}
};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    session::Session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The strategy engine.
pub struct StrategyEngine {
    params: Params,
    mnvr_params: mnvr::Params,
    calib: Calibration,

    behaviour: Behaviour,

    /// Encoder position at which each front line sensor first saw the border
    ///
    /// Units: ticks
    edge_latches: [Option<i64>; 2],

    /// Distance each front line sensor has travelled, in either direction,
    /// since its latch was set
    ///
    /// Units: inches
    edge_dists_in: [Option<f64>; 2],

    last_sample_time_ms: Option<u64>,

    /// Number of full behaviour cycles completed
    num_cycles: u64,

    report: StrategyReport,
    arch_report: Archiver,
}

/// Result of a single strategy step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyStep {
    /// The caller must zero the encoders before the drive supervisor runs.
    pub reset_odometry: bool,

    /// Behaviour after the step
    pub behaviour: Behaviour,
}

/// Flat record of the strategy state for archiving.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StrategyReport {
    pub time_ms: u64,
    pub behaviour: Behaviour,
    pub edge_dist_left_in: Option<f64>,
    pub edge_dist_right_in: Option<f64>,
    pub bearing: Option<f64>,
    pub reset_odometry: bool,
    pub num_cycles: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StrategyEngine {
    pub fn new(params: Params, mnvr_params: mnvr::Params, calib: Calibration) -> Self {
        Self {
            params,
            mnvr_params,
            calib,
            behaviour: Behaviour::InitForward,
            edge_latches: [None; 2],
            edge_dists_in: [None; 2],
            last_sample_time_ms: None,
            num_cycles: 0,
            report: StrategyReport::default(),
            arch_report: Archiver::default(),
        }
    }

    /// Evaluate the strategy for one cycle.
    ///
    /// Any manouvre change is made through `drive` immediately. If the
    /// returned step asks for an odometry reset the caller must zero the
    /// encoders before the drive supervisor is next processed.
    pub fn step<M: Motor>(
        &mut self,
        sens: &SensorState,
        drive: &mut DriveSup<M>
    ) -> Result<StrategyStep, StrategyError> {
        self.update_edge_latches(sens);
        self.last_sample_time_ms = Some(sens.time_ms);

        let mut reset_odometry = false;

        match self.behaviour {
            Behaviour::InitForward => {
                drive.change_command(StraightVelocity::new(
                    self.params.cruise_vel_in_ms,
                    &self.mnvr_params,
                    &self.calib
                ).into())?;

                self.transition(Behaviour::DrivingForward);
                reset_odometry = true;
            },
            Behaviour::DrivingForward => {
                drive.seek(sens.bearing);

                if self.edge_cleared() {
                    info!(
                        "Border cleared by ({:.2}, {:.2}) in",
                        self.edge_dists_in[FRONT_LEFT].unwrap_or(0.0),
                        self.edge_dists_in[FRONT_RIGHT].unwrap_or(0.0)
                    );

                    drive.change_command(StraightVelocity::new(
                        -self.params.cruise_vel_in_ms,
                        &self.mnvr_params,
                        &self.calib
                    ).into())?;

                    self.transition(Behaviour::DrivingBackward);
                    reset_odometry = true;
                }
            },
            Behaviour::DrivingBackward => {
                if self.travel_in(&sens.left_enc) <= self.params.reverse_dist_in {
                    drive.change_command(TurnAngle::new(
                        self.params.turn_deg,
                        self.params.turn_fix_overshoot,
                        &self.mnvr_params,
                        &self.calib
                    ).into())?;

                    self.transition(Behaviour::TurningAround);
                    reset_odometry = true;
                }
            },
            Behaviour::TurningAround => {
                match drive.is_complete(&sens.left_enc, &sens.right_enc) {
                    Some(true) => {
                        self.num_cycles += 1;
                        info!("Behaviour cycle {} complete", self.num_cycles);

                        // The turn must not keep driving from the zeroed origin
                        drive.clear_command()?;

                        self.transition(Behaviour::InitForward);
                        reset_odometry = true;
                    },
                    Some(false) => (),
                    None => {
                        warn!("No drive command while turning around, restarting the cycle");

                        self.transition(Behaviour::InitForward);
                        reset_odometry = true;
                    }
                }
            }
        }

        if reset_odometry {
            self.clear_edge_latches();
        }

        self.report = StrategyReport {
            time_ms: sens.time_ms,
            behaviour: self.behaviour,
            edge_dist_left_in: self.edge_dists_in[FRONT_LEFT],
            edge_dist_right_in: self.edge_dists_in[FRONT_RIGHT],
            bearing: sens.bearing,
            reset_odometry,
            num_cycles: self.num_cycles,
        };

        Ok(StrategyStep {
            reset_odometry,
            behaviour: self.behaviour,
        })
    }

    /// Return to the start of the behaviour cycle with cleared latches.
    pub fn reset(&mut self) {
        if self.behaviour != Behaviour::InitForward {
            info!("Strategy reset from {}", self.behaviour);
        }

        self.behaviour = Behaviour::InitForward;
        self.clear_edge_latches();
        self.last_sample_time_ms = None;
    }

    pub fn behaviour(&self) -> Behaviour {
        self.behaviour
    }

    /// Distance travelled past the border by each front line sensor, if the
    /// sensor is currently triggered.
    ///
    /// Units: inches
    pub fn edge_dists_in(&self) -> [Option<f64>; 2] {
        self.edge_dists_in
    }

    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    pub fn last_sample_time_ms(&self) -> Option<u64> {
        self.last_sample_time_ms
    }

    fn transition(&mut self, next: Behaviour) {
        info!("Strategy {} -> {}", self.behaviour, next);
        self.behaviour = next;
    }

    /// Update the edge latches and distances from the line sensors.
    ///
    /// Each sensor measures with the encoder on its own side. A latch is set
    /// the first cycle its sensor triggers and cleared as soon as it stops.
    fn update_edge_latches(&mut self, sens: &SensorState) {
        let encs = [&sens.left_enc, &sens.right_enc];

        for i in 0..2 {
            if sens.line_sens_triggered[i] {
                let ticks = encs[i].ticks;
                let latch = match self.edge_latches[i] {
                    Some(l) => l,
                    None => {
                        debug!("Line sensor {} triggered at {} ticks", i, ticks);
                        self.edge_latches[i] = Some(ticks);
                        ticks
                    }
                };

                self.edge_dists_in[i] = Some(self.calib.ticks_to_in((ticks - latch) as f64).abs());
            }
            else {
                self.edge_latches[i] = None;
                self.edge_dists_in[i] = None;
            }
        }
    }

    fn clear_edge_latches(&mut self) {
        self.edge_latches = [None; 2];
        self.edge_dists_in = [None; 2];
    }

    /// Have both front sensors travelled past the border by the clearance.
    fn edge_cleared(&self) -> bool {
        self.edge_dists_in
            .iter()
            .all(|d| matches!(d, Some(d) if *d >= self.params.edge_clear_in))
    }

    /// Travel of a wheel since the last odometry reset.
    ///
    /// Units: inches
    fn travel_in(&self, sample: &EncoderSample) -> f64 {
        self.calib.ticks_to_in(sample.ticks as f64)
    }
}

impl Archived for StrategyEngine {
    fn init_archives(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.arch_report = Archiver::from_path(session, "strategy/report.csv")?;
        Ok(())
    }

    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(self.report)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
