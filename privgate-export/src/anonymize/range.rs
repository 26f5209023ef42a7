//! Ranger: value binning into labeled intervals.

use std::sync::Arc;

use privgate_core::policy::AnonymizeOptions;

use super::{FieldFn, constant};

/// Builds the binning function for one column.
///
/// The interval `[lower, upper]` is divided into `bin` equal-width bins;
/// each row value is replaced with the `"<prev> ~ <current>"` label of the
/// first boundary exceeding it. Values equal to a boundary fall into the
/// upper bin, values below the range get an empty lower label, and values
/// at or above `upper` get the open-ended `"<upper> ~ "` label. Boundary
/// labels render integral floats without a fractional part.
pub fn build_ranging_fn(options: &AnonymizeOptions) -> FieldFn {
    let Ok(lower) = options.lower.parse::<f64>() else {
        return constant("lower parameter error");
    };
    let Ok(upper) = options.upper.parse::<f64>() else {
        return constant("upper parameter error");
    };
    let bins = match options.bin.parse::<i64>() {
        Ok(n) if n >= 1 => n as usize,
        _ => return constant("bin parameter error"),
    };

    let mut boundary = Vec::with_capacity(bins + 1);
    for i in 0..bins {
        boundary.push(lower + (upper - lower) * i as f64 / bins as f64);
    }
    boundary.push(upper);

    Arc::new(move |input: &str| {
        let Ok(value) = input.parse::<f64>() else {
            return format!("parseFloat error:{}", input);
        };
        let mut previous = String::new();
        for bound in &boundary {
            if *bound > value {
                return format!("{} ~ {}", previous, bound);
            }
            previous = bound.to_string();
        }
        format!("{} ~ ", previous)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranger(lower: &str, upper: &str, bin: &str) -> FieldFn {
        let mut opts = AnonymizeOptions::default();
        opts.lower = lower.to_string();
        opts.upper = upper.to_string();
        opts.bin = bin.to_string();
        build_ranging_fn(&opts)
    }

    #[test]
    fn test_basic_binning() {
        let f = ranger("0", "10", "5");
        assert_eq!(f("3"), "2 ~ 4");
        assert_eq!(f("9.5"), "8 ~ 10");
    }

    #[test]
    fn test_boundary_goes_to_upper_bin() {
        let f = ranger("0", "10", "5");
        assert_eq!(f("4"), "4 ~ 6");
        assert_eq!(f("0"), "0 ~ 2");
    }

    #[test]
    fn test_open_ends() {
        let f = ranger("0", "10", "5");
        // At or above the top boundary
        assert_eq!(f("10"), "10 ~ ");
        assert_eq!(f("99"), "10 ~ ");
        // Below the range: empty lower label
        assert_eq!(f("-1"), " ~ 0");
    }

    #[test]
    fn test_fractional_boundaries_render_shortest() {
        let f = ranger("0", "1", "4");
        assert_eq!(f("0.3"), "0.25 ~ 0.5");
    }

    #[test]
    fn test_parameter_errors_are_in_band() {
        assert_eq!(ranger("x", "10", "5")("3"), "lower parameter error");
        assert_eq!(ranger("0", "x", "5")("3"), "upper parameter error");
        assert_eq!(ranger("0", "10", "x")("3"), "bin parameter error");
        assert_eq!(ranger("0", "10", "0")("3"), "bin parameter error");
    }

    #[test]
    fn test_non_numeric_input_is_in_band() {
        let f = ranger("0", "10", "5");
        assert_eq!(f("Bob"), "parseFloat error:Bob");
    }
}
