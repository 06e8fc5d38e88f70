//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Clamp a value into `[min, max]`.
///
/// A NaN value is passed through unchanged, callers feeding actuators should
/// use [`saturate`] instead.
pub fn clamp<T>(value: T, min: T, max: T) -> T 
where
    T: Float
{
    let mut ret = value;

    if ret > max {
        ret = max
    }
    if ret < min {
        ret = min
    }

    ret
}

/// Saturate a value symmetrically into `[-limit, limit]`.
///
/// NaN saturates to zero so that a bad measurement can never reach an
/// actuator.
pub fn saturate<T>(value: T, limit: T) -> T
where
    T: Float
{
    if value.is_nan() {
        return T::zero()
    }

    clamp(value, -limit.abs(), limit.abs())
}

/// Limit the magnitude of a value while preserving its sign.
///
/// Zero is returned unchanged, there is no direction to preserve.
pub fn limit_magnitude<T>(value: T, max_magnitude: T) -> T
where
    T: Float
{
    let magn = value.abs();

    if magn == T::zero() || magn <= max_magnitude {
        value
    }
    else {
        max_magnitude.abs() * (value / magn)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 10f64), (0f64, 100f64), 2.5), 25.0);
        assert_eq!(lin_map((-1f64, 1f64), (1f64, -1f64), 0.5), -0.5);
    }

    #[test]
    fn test_saturate() {
        assert_eq!(saturate(150f64, 100f64), 100.0);
        assert_eq!(saturate(-150f64, 100f64), -100.0);
        assert_eq!(saturate(42f64, 100f64), 42.0);
        assert_eq!(saturate(std::f64::NAN, 100f64), 0.0);
        assert_eq!(saturate(-150f64, -100f64), -100.0);
    }

    #[test]
    fn test_limit_magnitude() {
        assert_eq!(limit_magnitude(80f64, 40f64), 40.0);
        assert_eq!(limit_magnitude(-80f64, 40f64), -40.0);
        assert_eq!(limit_magnitude(-20f64, 40f64), -20.0);
        assert_eq!(limit_magnitude(0f64, 40f64), 0.0);
    }
}
