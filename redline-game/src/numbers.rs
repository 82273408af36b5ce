//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Floor a f64 and saturate it to the i64 range, returning 0 for NaN.
#[must_use]
pub fn floor_f64_to_i64(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    // i64::MAX rounds up to 2^63 as f64, which no longer fits.
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    if value >= max {
        return i64::MAX;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    if value <= min {
        return i64::MIN;
    }
    cast::<f64, i64>(value.floor()).unwrap_or(0)
}

/// Floor a f64 and saturate it to the u64 range, returning 0 for NaN or negative values.
#[must_use]
pub fn floor_f64_to_u64(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    // u64::MAX rounds up to 2^64 as f64, which no longer fits.
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    if value >= max {
        return u64::MAX;
    }
    cast::<f64, u64>(value.floor()).unwrap_or(0)
}

/// Floor a f64 and clamp it to the i32 range, returning 0 for non-finite values.
#[must_use]
pub fn floor_f64_to_i32(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let min = f64::from(i32::MIN);
    let max = f64::from(i32::MAX);
    cast::<f64, i32>(value.clamp(min, max).floor()).unwrap_or(0)
}

/// Ceil a f64 and clamp it to the u32 range, returning 0 for non-finite or negative values.
#[must_use]
pub fn ceil_f64_to_u32(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = f64::from(u32::MAX);
    cast::<f64, u32>(value.min(max).ceil()).unwrap_or(0)
}

/// Round to two decimal places, the precision race times are reported in.
#[must_use]
pub fn round_to_hundredths(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    (value * 100.0).round() / 100.0
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_handle_non_finite() {
        assert_eq!(floor_f64_to_i64(f64::NAN), 0);
        assert_eq!(floor_f64_to_i64(-1.5), -2);
        assert_eq!(floor_f64_to_u64(-3.0), 0);
        assert_eq!(floor_f64_to_u64(506.25), 506);
        assert_eq!(floor_f64_to_i32(f64::INFINITY), 0);
        assert_eq!(floor_f64_to_i32(69.99), 69);
    }

    #[test]
    fn floors_saturate_out_of_range_values() {
        assert_eq!(floor_f64_to_u64(1e30), u64::MAX);
        assert_eq!(floor_f64_to_u64(18_446_744_073_709_551_616.0), u64::MAX);
        assert_eq!(floor_f64_to_i64(1e30), i64::MAX);
        assert_eq!(floor_f64_to_i64(9_223_372_036_854_775_808.0), i64::MAX);
        assert_eq!(floor_f64_to_i64(-1e30), i64::MIN);
        assert_eq!(floor_f64_to_u64(f64::INFINITY), u64::MAX);
        assert_eq!(floor_f64_to_u64(f64::NEG_INFINITY), 0);
        assert_eq!(floor_f64_to_i64(f64::NEG_INFINITY), i64::MIN);
        assert_eq!(floor_f64_to_u64(1e18), 1_000_000_000_000_000_000);
    }

    #[test]
    fn ceil_rounds_up_fractional_fuel() {
        assert_eq!(ceil_f64_to_u32(7.5), 8);
        assert_eq!(ceil_f64_to_u32(10.0), 10);
        assert_eq!(ceil_f64_to_u32(f64::NAN), 0);
    }

    #[test]
    fn hundredths_rounding_is_stable() {
        assert!((round_to_hundredths(61.234_9) - 61.23).abs() < f64::EPSILON);
        assert!((round_to_hundredths(61.235_1) - 61.24).abs() < 1e-9);
        assert!(round_to_hundredths(f64::INFINITY).is_infinite());
    }
}
