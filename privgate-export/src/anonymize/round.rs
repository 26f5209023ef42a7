//! Rounder: numeric precision reduction.

use std::sync::Arc;

use privgate_core::policy::AnonymizeOptions;

use super::{FieldFn, constant};

fn apply(op: fn(f64) -> f64, position: i32, input: &str) -> String {
    let Ok(value) = input.parse::<f64>() else {
        return format!("parseFloat error:{}", input);
    };
    let factor = 10f64.powi(position.abs());
    if position > 0 {
        // Keep `position` fractional digits
        format!("{:.*}", position as usize, op(value * factor) / factor)
    } else {
        // Zero out `|position|` digits left of the point
        format!("{:.0}", op(value / factor) * factor)
    }
}

/// Builds the rounding function for one column.
///
/// `algorithm` selects round (half away from zero), ceil, or floor;
/// `position` selects the digit position, positive to the right of the
/// decimal point, zero or negative to the left. Non-numeric row values
/// produce an in-band `parseFloat error:` string.
pub fn build_rounding_fn(options: &AnonymizeOptions) -> FieldFn {
    let position = options.position;
    let op: fn(f64) -> f64 = match options.algorithm.as_str() {
        "round" => f64::round,
        "ceil" => f64::ceil,
        "floor" => f64::floor,
        _ => return constant("unknown rounding algorithm"),
    };
    Arc::new(move |input: &str| apply(op, position, input))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rounder(algorithm: &str, position: i32) -> FieldFn {
        let mut opts = AnonymizeOptions::default();
        opts.algorithm = algorithm.to_string();
        opts.position = position;
        build_rounding_fn(&opts)
    }

    #[test]
    fn test_round_fractional_digits() {
        let f = rounder("round", 2);
        assert_eq!(f("3.14159"), "3.14");
        // Half away from zero
        assert_eq!(f("3.145"), "3.15");
    }

    #[test]
    fn test_round_half_away_from_zero_at_integer() {
        let f = rounder("round", 0);
        assert_eq!(f("-2.5"), "-3");
        assert_eq!(f("2.5"), "3");
    }

    #[test]
    fn test_round_left_of_decimal_point() {
        let f = rounder("round", -2);
        assert_eq!(f("1000"), "1000");
        assert_eq!(f("1049"), "1000");
        assert_eq!(f("1050"), "1100");

        let f = rounder("round", -3);
        assert_eq!(f("1500"), "2000");
    }

    #[test]
    fn test_ceil_and_floor() {
        let ceil = rounder("ceil", 1);
        assert_eq!(ceil("3.11"), "3.2");
        let floor = rounder("floor", 1);
        assert_eq!(floor("3.19"), "3.1");

        let ceil = rounder("ceil", -1);
        assert_eq!(ceil("41"), "50");
        let floor = rounder("floor", -1);
        assert_eq!(floor("49"), "40");
    }

    #[test]
    fn test_non_numeric_input_is_in_band() {
        let f = rounder("round", 2);
        assert_eq!(f("Alice"), "parseFloat error:Alice");
        assert_eq!(f(""), "parseFloat error:");
    }

    #[test]
    fn test_unknown_algorithm_is_in_band() {
        let f = rounder("truncate", 2);
        assert_eq!(f("3.14"), "unknown rounding algorithm");
    }
}
