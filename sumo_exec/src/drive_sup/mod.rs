//! # Drive supervisor module
//!
//! The drive supervisor owns the two wheel motors and the single active
//! manouvre slot. Every cycle it steps the active manouvre with the latest
//! encoder samples and writes the saturated commands to the motors. If no
//! manouvre is active both motors are held at zero.
//!
//! Replacing the active manouvre always zeroes both motors before the new
//! manouvre is installed, so nothing from the old manouvre's last output
//! carries over into the new one.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use state::*;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A PWM motor actuator.
pub trait Motor {
    /// Set the signed duty cycle of the motor.
    ///
    /// ## Arguments
    /// - `duty` - Duty cycle in percent between -100 and 100. The sign selects
    ///   the direction of rotation and 0 is a safe idle.
    fn set_duty_cycle(&mut self, duty: f64) -> Result<(), MotorError>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Identifies a wheel of the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Errors raised by a motor actuator.
#[derive(Debug, thiserror::Error)]
pub enum MotorError {
    #[error("Duty cycle must be between -100 and 100, found {0}")]
    InvalidDutyCycle(f64),

    #[error("Motor driver fault: {0}")]
    DriverFault(String),
}

/// Possible errors that can occur during drive supervisor operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveSupError {
    #[error("Could not set the {0:?} motor duty cycle: {1}")]
    MotorWriteError(Side, MotorError),
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::ctrl::DUTY_MAX;
    use std::{cell::RefCell, rc::Rc};

    /// Motor recording every duty cycle written to it.
    #[derive(Clone, Default)]
    pub(crate) struct MockMotor {
        pub writes: Rc<RefCell<Vec<f64>>>,
        pub fail: Rc<RefCell<bool>>,
    }

    impl MockMotor {
        pub fn last(&self) -> Option<f64> {
            self.writes.borrow().last().copied()
        }
    }

    impl Motor for MockMotor {
        fn set_duty_cycle(&mut self, duty: f64) -> Result<(), MotorError> {
            if *self.fail.borrow() {
                return Err(MotorError::DriverFault(String::from("mock")));
            }
            if duty.abs() > DUTY_MAX {
                return Err(MotorError::InvalidDutyCycle(duty));
            }
            self.writes.borrow_mut().push(duty);
            Ok(())
        }
    }
}
