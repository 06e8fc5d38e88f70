//! # Encoder module
//!
//! Converts the raw counts of the wheels' free running quadrature timers into
//! an accumulated tick position and a velocity. The timers are a fixed 16 bit
//! width so the tracker must recognise when a counter has wrapped past its
//! maximum (or below zero) between two reads.
//!
//! Wrapping is detected using a `bound`. If the previous count was within
//! `bound` of the maximum and the new count is within `bound` of zero the
//! counter is assumed to have wrapped forwards, and the symmetric case is a
//! backwards wrap. The tracker must therefore be polled faster than the wheel
//! can move `2 * bound` counts, or a real fast movement will be mistaken for
//! a wrap.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A fixed width hardware counter attached to a wheel encoder.
pub trait Counter {
    /// Read the raw value of the counter.
    fn count(&mut self) -> u16;
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculate the signed change in count between two raw counter values,
/// accounting for the counter wrapping around `counter_max`.
pub fn wrap_delta(prior_count: u16, count: u16, counter_max: u16, bound: u16) -> i64 {
    let prior = i64::from(prior_count);
    let count = i64::from(count);
    let max = i64::from(counter_max);
    let bound = i64::from(bound);

    if prior > max - bound && count < bound {
        (max - prior) + count
    }
    else if count > max - bound && prior < bound {
        -((max - count) + prior)
    }
    else {
        count - prior
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const M: u16 = 65535;
    const B: u16 = 1000;

    #[test]
    fn test_wrap_delta_forwards() {
        assert_eq!(wrap_delta(M - 5, 3, M, B), 8);
    }

    #[test]
    fn test_wrap_delta_backwards() {
        assert_eq!(wrap_delta(3, M - 5, M, B), -8);
    }

    #[test]
    fn test_wrap_delta_no_wrap() {
        assert_eq!(wrap_delta(100, 350, M, B), 250);
        assert_eq!(wrap_delta(350, 100, M, B), -250);

        // Near the top but the new count is not near zero
        assert_eq!(wrap_delta(M - 5, M - 1, M, B), 4);

        // Exactly on the bound is not considered a wrap
        assert_eq!(wrap_delta(M - B, 3, M, B), 3 - i64::from(M - B));
    }
}
