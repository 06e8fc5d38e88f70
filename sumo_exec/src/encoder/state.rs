//! Encoder tracker state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;

// Internal
use super::{wrap_delta, Counter, Params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single reading of a wheel encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EncoderSample {
    /// Accumulated position since the last zero.
    ///
    /// Units: ticks
    pub ticks: i64,

    /// Time at which the sample was taken.
    ///
    /// Units: milliseconds
    pub time_ms: u64,

    /// Velocity between the previous sample and this one.
    ///
    /// Units: ticks/millisecond
    pub vel_ticks_ms: f64,

    /// Time between the previous sample and this one.
    ///
    /// Units: milliseconds
    pub dt_ms: f64,
}

/// Tracks the position and velocity of a single wheel.
pub struct EncoderTracker<C: Counter> {
    counter: C,

    counter_max: u16,
    wrap_bound: u16,
    min_sample_period_ms: u64,
    invert: bool,

    /// Raw counter value at the last accepted read
    last_count: u16,

    last_sample: EncoderSample,
}

/// The left and right wheel encoders.
pub struct EncoderPair<C: Counter> {
    pub left: EncoderTracker<C>,
    pub right: EncoderTracker<C>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C: Counter> EncoderTracker<C> {

    /// Create a new tracker, taking the current counter value as the origin.
    pub fn new(mut counter: C, params: &Params, invert: bool, time_ms: u64) -> Self {
        let last_count = counter.count();

        Self {
            counter,
            counter_max: params.counter_max,
            wrap_bound: params.wrap_bound,
            min_sample_period_ms: params.min_sample_period_ms,
            invert,
            last_count,
            last_sample: EncoderSample {
                time_ms,
                ..Default::default()
            },
        }
    }

    /// Read the encoder at the given time.
    ///
    /// If less than the minimum sample period has elapsed since the last
    /// accepted read the last sample is returned unchanged and the counter is
    /// not read, so the movement is picked up by the next accepted read.
    pub fn read(&mut self, time_ms: u64) -> EncoderSample {
        let last = self.last_sample;

        let elapsed_ms = time_ms.saturating_sub(last.time_ms);
        if elapsed_ms < self.min_sample_period_ms {
            return last;
        }

        let count = self.counter.count();
        let mut delta = wrap_delta(
            self.last_count, 
            count, 
            self.counter_max, 
            self.wrap_bound
        );

        if delta != i64::from(count) - i64::from(self.last_count) {
            debug!(
                "Encoder counter wrapped ({} -> {}), delta {}", 
                self.last_count, count, delta
            );
        }

        if self.invert {
            delta = -delta;
        }

        let dt_ms = elapsed_ms as f64;

        let sample = EncoderSample {
            ticks: last.ticks + delta,
            time_ms,
            vel_ticks_ms: delta as f64 / dt_ms,
            dt_ms,
        };

        trace!("Encoder sample: {:?}", sample);

        self.last_count = count;
        self.last_sample = sample;

        sample
    }

    /// Reset the accumulated position to zero.
    ///
    /// The stored sample is rebased too, so a read suppressed by the minimum
    /// sample period reports the new origin.
    pub fn zero(&mut self) {
        self.last_sample.ticks = 0;
    }

    /// Get the most recent sample without reading the counter.
    pub fn latest(&self) -> EncoderSample {
        self.last_sample
    }

    /// The accumulated position in ticks.
    pub fn position(&self) -> i64 {
        self.last_sample.ticks
    }
}

impl<C: Counter> EncoderPair<C> {
    /// Create both trackers from the encoder parameters.
    pub fn new(left: C, right: C, params: &Params, time_ms: u64) -> Self {
        Self {
            left: EncoderTracker::new(left, params, params.invert_left, time_ms),
            right: EncoderTracker::new(right, params, params.invert_right, time_ms),
        }
    }

    /// Read both encoders, returning the `(left, right)` samples.
    pub fn read(&mut self, time_ms: u64) -> (EncoderSample, EncoderSample) {
        (self.left.read(time_ms), self.right.read(time_ms))
    }

    /// Latest `(left, right)` samples.
    pub fn latest(&self) -> (EncoderSample, EncoderSample) {
        (self.left.latest(), self.right.latest())
    }

    /// Zero both encoders.
    pub fn zero(&mut self) {
        self.left.zero();
        self.right.zero();
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
