//! Implementations for the DriveSup state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};
use serde::Serialize;

// Internal
use super::{DriveSupError, Motor, Side};
use crate::{
    ctrl::DUTY_MAX,
    encoder::EncoderSample,
    mnvr::Mnvr
};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    maths::saturate,
    module::State,
    session::Session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive supervisor state
pub struct DriveSup<M: Motor> {
    left_motor: M,
    right_motor: M,

    /// The active manouvre slot
    active: Option<Mnvr>,

    /// Number of times the active manouvre has been replaced or cleared
    num_cmd_changes: u64,

    pub(crate) output: OutputData,
    arch_output: Archiver,

    pub(crate) report: StatusReport,
    arch_report: Archiver,
}

/// Input data to the drive supervisor, the latest sample of each encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    pub left: EncoderSample,
    pub right: EncoderSample,
}

/// Duty cycles written to the motors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OutputData {
    /// Time of the samples the output was calculated from.
    ///
    /// Units: milliseconds
    pub time_ms: u64,

    /// Units: percent
    pub left_duty: f64,

    /// Units: percent
    pub right_duty: f64,
}

/// Status report for drive supervisor processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusReport {
    /// No manouvre was active so the motors were held at zero
    pub no_cmd: bool,

    /// The left command exceeded the duty range and was saturated
    pub left_saturated: bool,

    /// The right command exceeded the duty range and was saturated
    pub right_saturated: bool,

    /// A cruise controller bled its integral this cycle
    pub windup_bled: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<M: Motor> DriveSup<M> {
    /// Create a new supervisor with no active manouvre.
    pub fn new(left_motor: M, right_motor: M) -> Self {
        Self {
            left_motor,
            right_motor,
            active: None,
            num_cmd_changes: 0,
            output: OutputData::default(),
            arch_output: Archiver::default(),
            report: StatusReport::default(),
            arch_report: Archiver::default(),
        }
    }

    /// Replace the active manouvre.
    ///
    /// Both motors are set to zero before the new manouvre is installed. If
    /// the motors cannot be zeroed the slot is emptied instead, leaving the
    /// supervisor in its fail-safe state, and the error is returned.
    pub fn change_command(&mut self, mnvr: Mnvr) -> Result<(), DriveSupError> {
        if let Err(e) = self.stop_motors() {
            self.active = None;
            return Err(e);
        }

        info!("DriveSup command changed to {}", mnvr);

        self.active = Some(mnvr);
        self.num_cmd_changes += 1;

        Ok(())
    }

    /// Zero both motors and empty the active slot.
    pub fn clear_command(&mut self) -> Result<(), DriveSupError> {
        if self.active.is_some() {
            info!("DriveSup command cleared");
            self.num_cmd_changes += 1;
        }
        self.active = None;

        self.stop_motors()
    }

    /// Apply a steering bias to the active manouvre.
    ///
    /// Returns false if there is no active manouvre or it can't seek.
    pub fn seek(&mut self, amount: Option<f64>) -> bool {
        match self.active {
            Some(ref mut m) => m.seek(amount),
            None => false
        }
    }

    /// Check if the active manouvre is complete, `None` if there isn't one.
    pub fn is_complete(&self, left: &EncoderSample, right: &EncoderSample) -> Option<bool> {
        self.active.as_ref().map(|m| m.complete(left, right))
    }

    pub fn active(&self) -> Option<&Mnvr> {
        self.active.as_ref()
    }

    pub fn output(&self) -> OutputData {
        self.output
    }

    pub fn num_cmd_changes(&self) -> u64 {
        self.num_cmd_changes
    }

    /// Write zero duty to both motors.
    ///
    /// Both motors are always written, even if the first write fails.
    fn stop_motors(&mut self) -> Result<(), DriveSupError> {
        self.output.left_duty = 0.0;
        self.output.right_duty = 0.0;

        let left = self.left_motor.set_duty_cycle(0.0)
            .map_err(|e| DriveSupError::MotorWriteError(Side::Left, e));
        let right = self.right_motor.set_duty_cycle(0.0)
            .map_err(|e| DriveSupError::MotorWriteError(Side::Right, e));

        left.and(right)
    }

    /// Write the given duty cycles to the motors.
    ///
    /// Both motors are always written. If either write fails both motors are
    /// stopped and the first error is returned, so the output never reports a
    /// duty that wasn't applied.
    fn write_motors(&mut self, left_duty: f64, right_duty: f64) -> Result<(), DriveSupError> {
        let left = self.left_motor.set_duty_cycle(left_duty)
            .map_err(|e| DriveSupError::MotorWriteError(Side::Left, e));
        let right = self.right_motor.set_duty_cycle(right_duty)
            .map_err(|e| DriveSupError::MotorWriteError(Side::Right, e));

        if let Err(e) = left.and(right) {
            warn!("Motor write failed, stopping both motors: {}", e);
            if let Err(stop_err) = self.stop_motors() {
                warn!("Could not stop the motors: {}", stop_err);
            }
            return Err(e)
        }

        Ok(())
    }
}

impl<M: Motor> State for DriveSup<M> {
    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = DriveSupError;

    /// Perform cyclic processing of the drive supervisor.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        self.report = StatusReport::default();
        self.output.time_ms = input_data.left.time_ms;

        let (left_cmd, right_cmd, windup_bled) = match self.active {
            Some(ref mut mnvr) => {
                let (l, r) = mnvr.step(&input_data.left, &input_data.right);
                let bled = match mnvr {
                    Mnvr::StraightVelocity(m) => m.windup_bled(),
                    _ => false
                };
                (l, r, bled)
            },
            None => {
                trace!("No DriveSup command, stopping motors");
                self.report.no_cmd = true;
                self.stop_motors()?;
                return Ok((self.output, self.report))
            }
        };

        let left_duty = saturate(left_cmd, DUTY_MAX);
        let right_duty = saturate(right_cmd, DUTY_MAX);

        self.report.left_saturated = left_duty != left_cmd;
        self.report.right_saturated = right_duty != right_cmd;
        self.report.windup_bled = windup_bled;

        trace!("DriveSup output: left {:.2} %, right {:.2} %", left_duty, right_duty);

        self.output.left_duty = left_duty;
        self.output.right_duty = right_duty;

        self.write_motors(left_duty, right_duty)?;

        Ok((self.output, self.report))
    }
}

impl<M: Motor> Archived for DriveSup<M> {
    fn init_archives(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.arch_output = Archiver::from_path(session, "drive_sup/output.csv")?;
        self.arch_report = Archiver::from_path(session, "drive_sup/status_report.csv")?;

        Ok(())
    }

    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_output.serialise(self.output)?;
        self.arch_report.serialise(self.report)?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        drive_sup::test::MockMotor,
        encoder::Calibration,
        mnvr::{self, ForwardDistance, StraightVelocity, TurnAngle}
    };

    fn sample(ticks: i64, vel_ticks_ms: f64) -> EncoderSample {
        EncoderSample {
            ticks,
            time_ms: 100,
            vel_ticks_ms,
            dt_ms: 10.0,
        }
    }

    fn input(l: i64, r: i64) -> InputData {
        InputData {
            left: sample(l, 0.0),
            right: sample(r, 0.0),
        }
    }

    fn sup() -> (DriveSup<MockMotor>, MockMotor, MockMotor) {
        let l = MockMotor::default();
        let r = MockMotor::default();
        (DriveSup::new(l.clone(), r.clone()), l, r)
    }

    #[test]
    fn test_no_command_is_zero() {
        let (mut ds, l, r) = sup();

        let (out, rpt) = ds.proc(&input(0, 0)).unwrap();
        assert!(rpt.no_cmd);
        assert_eq!((out.left_duty, out.right_duty), (0.0, 0.0));
        assert_eq!(l.last(), Some(0.0));
        assert_eq!(r.last(), Some(0.0));
    }

    #[test]
    fn test_output_saturated() {
        let (mut ds, l, r) = sup();
        let calib = Calibration::default();

        // 10 inches is ~1559 ticks, a P command of ~156 % before saturation
        ds.change_command(
            ForwardDistance::new(10.0, false, &mnvr::Params::default(), &calib).into()
        ).unwrap();

        let (out, rpt) = ds.proc(&input(0, 0)).unwrap();
        assert_eq!(out.left_duty, DUTY_MAX);
        assert_eq!(out.right_duty, DUTY_MAX);
        assert!(rpt.left_saturated && rpt.right_saturated);
        assert_eq!(l.last(), Some(DUTY_MAX));
        assert_eq!(r.last(), Some(DUTY_MAX));
    }

    #[test]
    fn test_change_command_zeroes_first() {
        let (mut ds, l, r) = sup();
        let calib = Calibration::default();
        let params = mnvr::Params::default();

        ds.change_command(TurnAngle::new(90.0, false, &params, &calib).into()).unwrap();
        let (out, _) = ds.proc(&input(0, 0)).unwrap();
        assert!((out.left_duty - 90.0).abs() < 1e-9);
        assert_eq!(l.last(), Some(out.left_duty));
        assert_eq!(r.last(), Some(out.right_duty));

        // Swap to a cruise, the very next thing the motors see is zero
        ds.change_command(StraightVelocity::new(0.018, &params, &calib).into()).unwrap();
        assert_eq!(l.last(), Some(0.0));
        assert_eq!(r.last(), Some(0.0));
        assert_eq!(ds.output().left_duty, 0.0);
        assert_eq!(ds.output().right_duty, 0.0);
        assert_eq!(ds.num_cmd_changes(), 2);

        // Only then does the new manouvre drive
        let writes_before = l.writes.borrow().len();
        ds.proc(&input(0, 0)).unwrap();
        assert_eq!(l.writes.borrow().len(), writes_before + 1);
    }

    #[test]
    fn test_failed_zero_empties_slot() {
        let (mut ds, l, _r) = sup();
        let calib = Calibration::default();
        let params = mnvr::Params::default();

        *l.fail.borrow_mut() = true;
        let res = ds.change_command(TurnAngle::new(90.0, false, &params, &calib).into());
        assert!(matches!(res, Err(DriveSupError::MotorWriteError(Side::Left, _))));
        assert!(ds.active().is_none());
    }

    #[test]
    fn test_failed_write_stops_both() {
        let (mut ds, l, r) = sup();
        let calib = Calibration::default();

        ds.change_command(
            ForwardDistance::new(10.0, false, &mnvr::Params::default(), &calib).into()
        ).unwrap();
        ds.proc(&input(0, 0)).unwrap();
        assert_eq!(r.last(), Some(DUTY_MAX));

        // Left driver faults, the right motor must not be left driving
        *l.fail.borrow_mut() = true;
        let res = ds.proc(&input(0, 0));
        assert!(matches!(res, Err(DriveSupError::MotorWriteError(Side::Left, _))));
        assert_eq!(r.last(), Some(0.0));
        assert_eq!(ds.output().left_duty, 0.0);
        assert_eq!(ds.output().right_duty, 0.0);

        // Recovers once the fault clears
        *l.fail.borrow_mut() = false;
        ds.proc(&input(0, 0)).unwrap();
        assert_eq!(l.last(), Some(DUTY_MAX));
        assert_eq!(r.last(), Some(DUTY_MAX));
    }

    #[test]
    fn test_seek_and_complete() {
        let (mut ds, _, _) = sup();
        let calib = Calibration::default();
        let params = mnvr::Params::default();

        assert!(!ds.seek(Some(0.5)));
        assert_eq!(ds.is_complete(&sample(0, 0.0), &sample(0, 0.0)), None);

        ds.change_command(StraightVelocity::new(0.018, &params, &calib).into()).unwrap();
        assert!(ds.seek(Some(-0.5)));
        assert_eq!(ds.is_complete(&sample(0, 0.0), &sample(0, 0.0)), Some(false));

        ds.change_command(TurnAngle::new(-90.0, false, &params, &calib).into()).unwrap();
        assert!(!ds.seek(None));
        assert_eq!(ds.is_complete(&sample(-900, 0.0), &sample(900, 0.0)), Some(true));

        ds.clear_command().unwrap();
        assert!(ds.active().is_none());
        let (_, rpt) = ds.proc(&input(0, 0)).unwrap();
        assert!(rpt.no_cmd);
    }
}
