//! Masker: partial value suppression.
//!
//! Lengths are measured in Unicode scalar values, not bytes, so multi-byte
//! input is masked without corrupting character boundaries.

use std::sync::Arc;

use privgate_core::policy::AnonymizeOptions;

use super::{FieldFn, constant};

fn parse_bool_flag(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Builds the masking function for one column.
///
/// Keeps the first `fore` and last `aft` characters. With
/// `keepLength = true` the span between them is filled with the mask
/// string's characters repeated to the original length; otherwise the span
/// collapses to a single copy of the mask string. Inputs shorter than
/// `fore + aft` are suppressed entirely; empty input stays empty.
pub fn build_masking_fn(options: &AnonymizeOptions) -> FieldFn {
    let Ok(fore) = options.fore.parse::<usize>() else {
        return constant("fore parameter error");
    };
    let Ok(aft) = options.aft.parse::<usize>() else {
        return constant("aft parameter error");
    };
    let Some(keep_length) = parse_bool_flag(&options.keep_length) else {
        return constant("keepLength parameter error");
    };
    let mask_char = options.mask_char.clone();

    Arc::new(move |input: &str| {
        if input.is_empty() {
            return String::new();
        }
        let chars: Vec<char> = input.chars().collect();
        if chars.len() < fore + aft {
            return String::new();
        }

        let head: String = chars[..fore].iter().collect();
        let tail: String = chars[chars.len() - aft..].iter().collect();
        if keep_length {
            let mask_len = chars.len() - fore - aft;
            let fill: String = mask_char.chars().cycle().take(mask_len).collect();
            format!("{}{}{}", head, fill, tail)
        } else {
            format!("{}{}{}", head, mask_char, tail)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn masker(fore: &str, aft: &str, mask_char: &str, keep_length: &str) -> FieldFn {
        let mut opts = AnonymizeOptions::default();
        opts.fore = fore.to_string();
        opts.aft = aft.to_string();
        opts.mask_char = mask_char.to_string();
        opts.keep_length = keep_length.to_string();
        build_masking_fn(&opts)
    }

    #[test]
    fn test_keep_length_masking() {
        let f = masker("1", "1", "*", "true");
        assert_eq!(f("abcdef"), "a****f");
    }

    #[test]
    fn test_collapsed_masking() {
        let f = masker("1", "1", "*", "false");
        assert_eq!(f("abcdef"), "a*f");
        assert_eq!(f("Alice"), "A*e");
    }

    #[test]
    fn test_length_exactly_fore_plus_aft() {
        // Mask span is empty when keeping length, a single mask otherwise
        assert_eq!(masker("1", "1", "*", "true")("ab"), "ab");
        assert_eq!(masker("1", "1", "*", "false")("ab"), "a*b");
    }

    #[test]
    fn test_short_and_empty_inputs() {
        let f = masker("2", "2", "*", "true");
        assert_eq!(f("abc"), "");
        assert_eq!(f(""), "");
    }

    #[test]
    fn test_multibyte_input_is_not_corrupted() {
        let f = masker("1", "1", "*", "true");
        assert_eq!(f("a\u{AC00}\u{AC01}\u{AC02}b"), "a***b");
    }

    #[test]
    fn test_truthy_flag_spellings() {
        assert_eq!(masker("1", "1", "*", "T")("abc"), "a*c");
        assert_eq!(masker("1", "1", "*", "0")("abc"), "a*c");
    }

    #[test]
    fn test_parameter_errors_are_in_band() {
        assert_eq!(masker("x", "1", "*", "true")("abc"), "fore parameter error");
        assert_eq!(masker("-1", "1", "*", "true")("abc"), "fore parameter error");
        assert_eq!(masker("1", "x", "*", "true")("abc"), "aft parameter error");
        assert_eq!(
            masker("1", "1", "*", "maybe")("abc"),
            "keepLength parameter error"
        );
    }
}
