//! Numeric conversion helpers centralizing the lossy casts used by scoring.

use num_traits::cast::cast;

/// Floor a f64 and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn floor_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).floor();
    cast::<f64, i64>(clamped).unwrap_or(0)
}

/// Round a non-negative f64 to the nearest usize, returning 0 for NaN or negatives.
#[must_use]
pub fn round_f64_to_usize(value: f64) -> usize {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    cast::<f64, usize>(value.round()).unwrap_or(usize::MAX)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert usize to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert whole seconds to fractional seconds.
#[must_use]
pub fn secs_to_f64(value: u32) -> f64 {
    f64::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_handles_non_finite_and_negatives() {
        assert_eq!(floor_f64_to_i64(f64::NAN), 0);
        assert_eq!(floor_f64_to_i64(f64::INFINITY), 0);
        assert_eq!(floor_f64_to_i64(74.9), 74);
        assert_eq!(floor_f64_to_i64(-0.5), -1);
    }

    #[test]
    fn rounding_to_usize_clamps_low_values() {
        assert_eq!(round_f64_to_usize(3.75), 4);
        assert_eq!(round_f64_to_usize(2.25), 2);
        assert_eq!(round_f64_to_usize(-4.0), 0);
        assert_eq!(round_f64_to_usize(f64::NAN), 0);
    }

    #[test]
    fn widening_conversions_are_exact_for_small_values() {
        assert!((i64_to_f64(1_000) - 1_000.0).abs() < f64::EPSILON);
        assert!((usize_to_f64(15) - 15.0).abs() < f64::EPSILON);
        assert!((secs_to_f64(30) - 30.0).abs() < f64::EPSILON);
    }
}
