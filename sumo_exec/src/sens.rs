//! # Sensing
//!
//! Interfaces to the sensing collaborators, and the [`Sensing`] structure
//! which combines them with the encoders into one [`SensorState`] per cycle.
//!
//! The drivers behind these traits (line sensor pulse decay, time of flight
//! triangulation, infrared remote decoding) live outside this crate. They are
//! implemented here only by the simulated plant and by test mocks.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use util::maths::clamp;

use crate::encoder::{Counter, EncoderPair, EncoderSample};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Index of the front left line sensor in [`SensorState::line_sens_triggered`].
pub const FRONT_LEFT: usize = 0;

/// Index of the front right line sensor in [`SensorState::line_sens_triggered`].
pub const FRONT_RIGHT: usize = 1;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A line sensor pointing at the arena surface.
pub trait LineSensor {
    /// True if the sensor is currently over the arena border.
    fn read(&mut self) -> bool;
}

/// An estimator of the direction to the opponent.
pub trait BearingSource {
    /// Normalised bearing to the opponent in `[-1, 1]`, negative to the left,
    /// or `None` if no opponent is seen.
    fn bearing(&mut self) -> Option<f64>;
}

/// The remote start/stop signal.
pub trait MatchSignal {
    fn is_match_active(&mut self) -> bool;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Everything the strategy needs to know about the world for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorState {
    /// Front line sensors, indexed by [`FRONT_LEFT`] and [`FRONT_RIGHT`]
    pub line_sens_triggered: [bool; 2],

    pub left_enc: EncoderSample,
    pub right_enc: EncoderSample,

    /// Normalised bearing to the opponent
    pub bearing: Option<f64>,

    /// Units: milliseconds
    pub time_ms: u64,

    /// Time since the previous sensor state was built.
    ///
    /// Units: milliseconds
    pub dt_ms: f64,
}

/// Builds the sensor state from the encoders and sensing collaborators.
pub struct Sensing<C, L, B>
where
    C: Counter,
    L: LineSensor,
    B: BearingSource
{
    encoders: EncoderPair<C>,
    line_sens: [L; 2],
    bearing_source: B,

    last_time_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C, L, B> Sensing<C, L, B>
where
    C: Counter,
    L: LineSensor,
    B: BearingSource
{
    pub fn new(encoders: EncoderPair<C>, front_left: L, front_right: L, bearing_source: B) -> Self {
        Self {
            encoders,
            line_sens: [front_left, front_right],
            bearing_source,
            last_time_ms: None,
        }
    }

    /// Acquire a new sensor state at the given time.
    pub fn sense(&mut self, time_ms: u64) -> SensorState {
        let (left_enc, right_enc) = self.encoders.read(time_ms);

        let line_sens_triggered = [
            self.line_sens[FRONT_LEFT].read(),
            self.line_sens[FRONT_RIGHT].read()
        ];

        let bearing = match self.bearing_source.bearing() {
            Some(b) if b.is_finite() => Some(clamp(b, -1.0, 1.0)),
            _ => None
        };

        let dt_ms = match self.last_time_ms {
            Some(t) => time_ms.saturating_sub(t) as f64,
            None => 0.0
        };
        self.last_time_ms = Some(time_ms);

        trace!(
            "Sensed: line {:?}, enc ({}, {}), bearing {:?}",
            line_sens_triggered, left_enc.ticks, right_enc.ticks, bearing
        );

        SensorState {
            line_sens_triggered,
            left_enc,
            right_enc,
            bearing,
            time_ms,
            dt_ms,
        }
    }

    /// Zero the odometry, returning the rebased `(left, right)` samples.
    pub fn zero_odometry(&mut self) -> (EncoderSample, EncoderSample) {
        self.encoders.zero();
        self.encoders.latest()
    }

    pub fn encoders(&self) -> &EncoderPair<C> {
        &self.encoders
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::encoder::Params;
    use std::{cell::Cell, rc::Rc};

    #[derive(Clone, Default)]
    struct Shared<T: Copy + Default>(Rc<Cell<T>>);

    impl<T: Copy + Default> Shared<T> {
        fn set(&self, v: T) {
            self.0.set(v)
        }
    }

    impl Counter for Shared<u16> {
        fn count(&mut self) -> u16 {
            self.0.get()
        }
    }

    impl LineSensor for Shared<bool> {
        fn read(&mut self) -> bool {
            self.0.get()
        }
    }

    impl BearingSource for Shared<Option<f64>> {
        fn bearing(&mut self) -> Option<f64> {
            self.0.get()
        }
    }

    #[test]
    fn test_sense() {
        let l_cnt = Shared::<u16>::default();
        let r_cnt = Shared::<u16>::default();
        let fl = Shared::<bool>::default();
        let fr = Shared::<bool>::default();
        let brg = Shared::<Option<f64>>::default();

        let params = Params::default();
        let encoders = EncoderPair::new(l_cnt.clone(), r_cnt.clone(), &params, 0);
        let mut sens = Sensing::new(encoders, fl.clone(), fr.clone(), brg.clone());

        let s = sens.sense(10);
        assert_eq!(s.line_sens_triggered, [false, false]);
        assert_eq!(s.bearing, None);
        assert_eq!(s.dt_ms, 0.0);

        l_cnt.set(20);
        // Right wheel is inverted by default, and wraps backwards past zero
        r_cnt.set(u16::MAX - 20);
        fr.set(true);
        brg.set(Some(0.25));

        let s = sens.sense(20);
        assert_eq!(s.left_enc.ticks, 20);
        assert_eq!(s.right_enc.ticks, 20);
        assert_eq!(s.line_sens_triggered, [false, true]);
        assert_eq!(s.bearing, Some(0.25));
        assert_eq!(s.time_ms, 20);
        assert_eq!(s.dt_ms, 10.0);

        let (l, r) = sens.zero_odometry();
        assert_eq!((l.ticks, r.ticks), (0, 0));
    }

    #[test]
    fn test_bearing_sanitised() {
        let brg = Shared::<Option<f64>>::default();
        let params = Params::default();
        let encoders = EncoderPair::new(
            Shared::<u16>::default(), Shared::<u16>::default(), &params, 0
        );
        let mut sens = Sensing::new(
            encoders, Shared::<bool>::default(), Shared::<bool>::default(), brg.clone()
        );

        brg.set(Some(3.0));
        assert_eq!(sens.sense(10).bearing, Some(1.0));

        brg.set(Some(-1.5));
        assert_eq!(sens.sense(20).bearing, Some(-1.0));

        brg.set(Some(f64::NAN));
        assert_eq!(sens.sense(30).bearing, None);
    }
}
