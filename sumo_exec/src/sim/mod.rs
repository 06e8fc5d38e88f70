//! # Simulated plant
//!
//! A simple simulation of the robot in the ring, standing in for the
//! hardware drivers. The [`SimRobot`] hands out handles implementing the
//! hardware traits ([`Counter`], [`Motor`], [`LineSensor`], [`BearingSource`]
//! and [`MatchSignal`]), all sharing one plant.
//!
//! The plant models:
//!
//! - First order motor response to the commanded duty cycle.
//! - Differential drive kinematics on a flat circular ring.
//! - Wrapping 16 bit encoder counters, counting down on inverted wheels.
//! - Front line sensors which trigger over the white border.
//! - A bearing estimator to a stationary opponent, refreshed on its own
//!   cadence independent of the control cycle.
//! - A start signal which goes active after a delay.
//!
//! Everything runs in one thread, the handles share the plant through
//! `Rc<RefCell<_>>`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{cell::RefCell, f64::consts::PI, rc::Rc};

use log::{debug, warn};
use serde::Serialize;
use util::maths::lin_map;

use crate::{
    ctrl::DUTY_MAX,
    drive_sup::{Motor, MotorError, Side},
    encoder::{self, Counter},
    sens::{BearingSource, LineSensor, MatchSignal, FRONT_LEFT, FRONT_RIGHT}
};

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::Params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Position and heading of the robot in the ring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Pose {
    /// Units: inches
    pub x_in: f64,

    /// Units: inches
    pub y_in: f64,

    /// Anticlockwise from the x axis.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// The simulated robot.
#[derive(Clone)]
pub struct SimRobot {
    plant: Rc<RefCell<Plant>>,
}

/// Encoder counter of one wheel.
pub struct SimCounter {
    plant: Rc<RefCell<Plant>>,
    side: Side,
}

/// Motor of one wheel.
pub struct SimMotor {
    plant: Rc<RefCell<Plant>>,
    side: Side,
}

/// One of the front line sensors.
pub struct SimLineSensor {
    plant: Rc<RefCell<Plant>>,
    index: usize,
}

pub struct SimBearing {
    plant: Rc<RefCell<Plant>>,
}

pub struct SimMatchSignal {
    plant: Rc<RefCell<Plant>>,
}

/// Shared plant state.
struct Plant {
    params: Params,

    counter_max: u16,
    in_per_tick: f64,

    /// Sign applied to the travel of each wheel before it reaches its counter
    count_sign: [f64; 2],

    time_ms: u64,
    pose: Pose,

    /// Commanded duty of each wheel
    duty: [f64; 2],

    /// Units: inches/millisecond
    wheel_vel_in_ms: [f64; 2],

    /// Total travel of each wheel
    ///
    /// Units: ticks
    wheel_ticks: [f64; 2],

    bearing: Option<f64>,
    last_bearing_ms: Option<u64>,

    /// Motor drivers currently reporting a fault
    motor_fault: [bool; 2],

    out_of_ring: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimRobot {
    /// Create a new simulated robot.
    ///
    /// The encoder parameters give the counter width, calibration and which
    /// wheels count down, so that the trackers built from the same
    /// parameters see forward travel as positive.
    pub fn new(params: Params, enc_params: &encoder::Params) -> Self {
        let sign = |invert: bool| if invert { -1.0 } else { 1.0 };

        let plant = Plant {
            params,
            counter_max: enc_params.counter_max,
            in_per_tick: enc_params.calib.in_per_tick,
            count_sign: [sign(enc_params.invert_left), sign(enc_params.invert_right)],
            time_ms: 0,
            pose: Pose {
                x_in: params.start_pos_in[0],
                y_in: params.start_pos_in[1],
                heading_rad: params.start_heading_deg.to_radians(),
            },
            duty: [0.0; 2],
            wheel_vel_in_ms: [0.0; 2],
            wheel_ticks: [0.0; 2],
            bearing: None,
            last_bearing_ms: None,
            motor_fault: [false; 2],
            out_of_ring: false,
        };

        Self {
            plant: Rc::new(RefCell::new(plant)),
        }
    }

    /// Advance the simulation by the given time.
    pub fn advance(&self, dt_ms: u64) {
        self.plant.borrow_mut().advance(dt_ms)
    }

    /// `(left, right)` encoder counters.
    pub fn counters(&self) -> (SimCounter, SimCounter) {
        (
            SimCounter { plant: self.plant.clone(), side: Side::Left },
            SimCounter { plant: self.plant.clone(), side: Side::Right }
        )
    }

    /// `(left, right)` motors.
    pub fn motors(&self) -> (SimMotor, SimMotor) {
        (
            SimMotor { plant: self.plant.clone(), side: Side::Left },
            SimMotor { plant: self.plant.clone(), side: Side::Right }
        )
    }

    /// `(front left, front right)` line sensors.
    pub fn line_sensors(&self) -> (SimLineSensor, SimLineSensor) {
        (
            SimLineSensor { plant: self.plant.clone(), index: FRONT_LEFT },
            SimLineSensor { plant: self.plant.clone(), index: FRONT_RIGHT }
        )
    }

    pub fn bearing_source(&self) -> SimBearing {
        SimBearing { plant: self.plant.clone() }
    }

    /// Set or clear a fault on one of the motor drivers.
    ///
    /// A faulted driver rejects every write and leaves its wheel unpowered.
    pub fn set_motor_fault(&self, side: Side, fault: bool) {
        let mut plant = self.plant.borrow_mut();
        if fault && !plant.motor_fault[side_index(side)] {
            warn!("Injecting {:?} motor driver fault", side);
        }
        plant.motor_fault[side_index(side)] = fault;
        if fault {
            plant.duty[side_index(side)] = 0.0;
        }
    }

    pub fn match_signal(&self) -> SimMatchSignal {
        SimMatchSignal { plant: self.plant.clone() }
    }

    /// Simulation time.
    ///
    /// Units: milliseconds
    pub fn time_ms(&self) -> u64 {
        self.plant.borrow().time_ms
    }

    pub fn pose(&self) -> Pose {
        self.plant.borrow().pose
    }

    /// True if the robot's centre has ever left the ring.
    pub fn out_of_ring(&self) -> bool {
        self.plant.borrow().out_of_ring
    }
}

impl Plant {
    fn advance(&mut self, dt_ms: u64) {
        if dt_ms == 0 {
            return;
        }
        let dt = dt_ms as f64;

        // Motor response and wheel travel
        let alpha = dt / (self.params.motor_time_const_ms.max(0.0) + dt);
        let mut travel_in = [0.0; 2];
        for i in 0..2 {
            let target = self.duty[i] / DUTY_MAX * self.params.max_wheel_vel_in_ms;
            self.wheel_vel_in_ms[i] += (target - self.wheel_vel_in_ms[i]) * alpha;
            travel_in[i] = self.wheel_vel_in_ms[i] * dt;
            self.wheel_ticks[i] += travel_in[i] / self.in_per_tick;
        }

        // Differential drive kinematics, midpoint heading
        let ds = 0.5 * (travel_in[0] + travel_in[1]);
        let dh = (travel_in[1] - travel_in[0]) / self.params.track_width_in;
        let mid = self.pose.heading_rad + 0.5 * dh;
        self.pose.x_in += ds * mid.cos();
        self.pose.y_in += ds * mid.sin();
        self.pose.heading_rad = wrap_angle(self.pose.heading_rad + dh);

        self.time_ms += dt_ms;

        if !self.out_of_ring
            && self.pose.x_in.hypot(self.pose.y_in) > self.params.arena_radius_in
        {
            warn!("Simulated robot left the ring at {:?}", self.pose);
            self.out_of_ring = true;
        }

        // The estimator only refreshes on its own period
        let refresh = match self.last_bearing_ms {
            Some(t) => self.time_ms.saturating_sub(t) >= self.params.bearing_refresh_ms,
            None => true
        };
        if refresh {
            self.bearing = self.estimate_bearing();
            self.last_bearing_ms = Some(self.time_ms);
        }
    }

    /// Bearing to the opponent, negative to the left, or `None` if it is out
    /// of the field of view or range.
    fn estimate_bearing(&self) -> Option<f64> {
        let dx = self.params.opponent_pos_in[0] - self.pose.x_in;
        let dy = self.params.opponent_pos_in[1] - self.pose.y_in;

        if dx.hypot(dy) > self.params.bearing_max_range_in {
            return None;
        }

        let half_fov = 0.5 * self.params.bearing_fov_deg.to_radians();
        let angle = wrap_angle(dy.atan2(dx) - self.pose.heading_rad);

        if half_fov <= 0.0 || angle.abs() > half_fov {
            None
        }
        else {
            Some(lin_map((-half_fov, half_fov), (1.0, -1.0), angle))
        }
    }

    fn count(&self, side: Side) -> u16 {
        let i = side_index(side);
        let ticks = (self.count_sign[i] * self.wheel_ticks[i]).round() as i64;

        ticks.rem_euclid(i64::from(self.counter_max.max(1))) as u16
    }

    fn line_sensor(&self, index: usize) -> bool {
        let lat = if index == FRONT_LEFT {
            self.params.line_sens_lat_in
        }
        else {
            -self.params.line_sens_lat_in
        };

        let (sin, cos) = self.pose.heading_rad.sin_cos();
        let x = self.pose.x_in + self.params.line_sens_fwd_in * cos - lat * sin;
        let y = self.pose.y_in + self.params.line_sens_fwd_in * sin + lat * cos;

        x.hypot(y) >= self.params.arena_radius_in - self.params.border_width_in
    }
}

impl Counter for SimCounter {
    fn count(&mut self) -> u16 {
        self.plant.borrow().count(self.side)
    }
}

impl Motor for SimMotor {
    fn set_duty_cycle(&mut self, duty: f64) -> Result<(), MotorError> {
        if !duty.is_finite() || duty.abs() > DUTY_MAX {
            return Err(MotorError::InvalidDutyCycle(duty));
        }

        let mut plant = self.plant.borrow_mut();
        if plant.motor_fault[side_index(self.side)] {
            return Err(MotorError::DriverFault(format!("{:?} driver fault", self.side)));
        }

        plant.duty[side_index(self.side)] = duty;
        Ok(())
    }
}

impl LineSensor for SimLineSensor {
    fn read(&mut self) -> bool {
        self.plant.borrow().line_sensor(self.index)
    }
}

impl BearingSource for SimBearing {
    fn bearing(&mut self) -> Option<f64> {
        self.plant.borrow().bearing
    }
}

impl MatchSignal for SimMatchSignal {
    fn is_match_active(&mut self) -> bool {
        let plant = self.plant.borrow();
        let active = plant.time_ms >= plant.params.start_delay_ms;

        if plant.time_ms == plant.params.start_delay_ms {
            debug!("Simulated start signal received");
        }

        active
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn side_index(side: Side) -> usize {
    match side {
        Side::Left => 0,
        Side::Right => 1,
    }
}

/// Wrap an angle into `[-pi, pi)`.
fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn robot(params: Params) -> SimRobot {
        SimRobot::new(params, &encoder::Params::default())
    }

    #[test]
    fn test_motor_response() {
        let sim = robot(Params::default());
        let (mut l, mut r) = sim.motors();
        let (mut lc, mut rc) = sim.counters();

        l.set_duty_cycle(50.0).unwrap();
        r.set_duty_cycle(50.0).unwrap();

        for _ in 0..200 {
            sim.advance(10);
        }

        // Settled to half speed, driving straight
        let plant = sim.plant.borrow();
        for v in plant.wheel_vel_in_ms.iter() {
            assert!((v - 0.02).abs() < 1e-6);
        }
        assert!(plant.pose.y_in.abs() < 1e-9);
        assert!(plant.pose.x_in > -10.0);
        drop(plant);

        // Right counter counts down for forward travel
        assert!(lc.count() > 0);
        assert_eq!(lc.count(), u16::MAX - rc.count());
        assert_eq!(sim.time_ms(), 2000);
    }

    #[test]
    fn test_invalid_duty() {
        let sim = robot(Params::default());
        let (mut l, _) = sim.motors();

        assert!(matches!(l.set_duty_cycle(100.5), Err(MotorError::InvalidDutyCycle(_))));
        assert!(l.set_duty_cycle(f64::NAN).is_err());
        assert!(l.set_duty_cycle(-100.0).is_ok());
    }

    #[test]
    fn test_motor_fault() {
        let sim = robot(Params::default());
        let (mut l, mut r) = sim.motors();

        l.set_duty_cycle(50.0).unwrap();
        r.set_duty_cycle(50.0).unwrap();

        sim.set_motor_fault(Side::Left, true);
        assert!(matches!(l.set_duty_cycle(50.0), Err(MotorError::DriverFault(_))));
        assert!(r.set_duty_cycle(50.0).is_ok());

        // The faulted wheel coasts to a stop
        for _ in 0..200 {
            sim.advance(10);
        }
        let (mut l_cnt, mut r_cnt) = sim.counters();
        let (l0, r0) = (l_cnt.count(), r_cnt.count());
        sim.advance(10);
        assert_eq!(l_cnt.count(), l0);
        assert_ne!(r_cnt.count(), r0);

        sim.set_motor_fault(Side::Left, false);
        assert!(l.set_duty_cycle(50.0).is_ok());
    }

    #[test]
    fn test_spin_in_place() {
        let sim = robot(Params::default());
        let (mut l, mut r) = sim.motors();

        l.set_duty_cycle(40.0).unwrap();
        r.set_duty_cycle(-40.0).unwrap();
        for _ in 0..50 {
            sim.advance(10);
        }

        let pose = sim.pose();
        assert!((pose.x_in + 10.0).abs() < 1e-9);
        assert!(pose.y_in.abs() < 1e-9);

        // Clockwise
        assert!(pose.heading_rad < 0.0);
    }

    #[test]
    fn test_line_sensors() {
        // Sensors 3 in ahead of the robot, on the border
        let mut params = Params::default();
        params.start_pos_in = [26.0, 0.0];
        let sim = robot(params);
        let (mut fl, mut fr) = sim.line_sensors();
        assert!(fl.read());
        assert!(fr.read());

        params.start_pos_in = [0.0, 0.0];
        let sim = robot(params);
        let (mut fl, mut fr) = sim.line_sensors();
        assert!(!fl.read());
        assert!(!fr.read());

        // Driving along the border, only the outer (right) sensor is over it
        params.start_pos_in = [26.0, 0.0];
        params.start_heading_deg = 90.0;
        let sim = robot(params);
        let (mut fl, mut fr) = sim.line_sensors();
        assert!(!fl.read());
        assert!(fr.read());
    }

    #[test]
    fn test_bearing_refresh() {
        let mut params = Params::default();
        params.start_pos_in = [0.0, 0.0];
        params.opponent_pos_in = [10.0, 0.0];
        let sim = robot(params);
        let mut brg = sim.bearing_source();

        assert_eq!(brg.bearing(), None);
        sim.advance(10);
        assert_eq!(brg.bearing(), Some(0.0));

        // Moving the opponent isn't seen until the next refresh
        sim.plant.borrow_mut().params.opponent_pos_in = [10.0, 10.0];
        for _ in 0..9 {
            sim.advance(10);
            assert_eq!(brg.bearing(), Some(0.0));
        }
        sim.advance(10);

        // 45 deg to the left is outside the 50 deg field of view
        assert_eq!(brg.bearing(), None);

        sim.plant.borrow_mut().params.opponent_pos_in = [10.0, 2.0];
        for _ in 0..10 {
            sim.advance(10);
        }
        let b = brg.bearing().unwrap();
        assert!(b < 0.0 && b > -1.0);
    }

    #[test]
    fn test_match_signal() {
        let sim = robot(Params::default());
        let mut sig = sim.match_signal();

        assert!(!sig.is_match_active());
        for _ in 0..49 {
            sim.advance(10);
        }
        assert!(!sig.is_match_active());
        sim.advance(10);
        assert!(sig.is_match_active());
    }

    #[test]
    fn test_counter_wrap() {
        let sim = robot(Params::default());
        let (mut lc, _) = sim.counters();

        sim.plant.borrow_mut().wheel_ticks[0] = -5.0;
        assert_eq!(lc.count(), u16::MAX - 5);

        assert!((wrap_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
    }
}
