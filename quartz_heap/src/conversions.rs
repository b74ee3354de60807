//! String to number conversion.

/// Convert string contents to a number the way `Number(s)` does.
///
/// Leading and trailing whitespace is ignored and an empty string is `0`.
/// `0x`, `0o` and `0b` prefixes select radix 16, 8 and 2 (unsigned only).
/// `Infinity` may carry a sign. Anything else that is not a decimal literal
/// is `NaN`.
pub fn string_to_number(s: &str) -> f64 {
    let s = s.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    if s.is_empty() {
        return 0.0;
    }

    let bytes = s.as_bytes();
    if bytes.len() > 2 && bytes[0] == b'0' {
        let radix = match bytes[1] {
            b'x' | b'X' => Some(16),
            b'o' | b'O' => Some(8),
            b'b' | b'B' => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            return parse_radix(&s[2..], radix);
        }
    }

    let unsigned = s.strip_prefix(&['+', '-'][..]).unwrap_or(s);
    if unsigned == "Infinity" {
        return if s.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
    }

    // Rust also accepts spellings like "inf" and "NaN"; only digits, a dot
    // and an exponent are valid here.
    let valid = unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !valid || !unsigned.bytes().any(|b| b.is_ascii_digit()) {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_radix(digits: &str, radix: u32) -> f64 {
    let mut value = 0.0f64;
    for c in digits.chars() {
        match c.to_digit(radix) {
            Some(d) => value = value * radix as f64 + d as f64,
            None => return f64::NAN,
        }
    }
    value
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal() {
        assert_eq!(string_to_number("42"), 42.0);
        assert_eq!(string_to_number("  -1.5  "), -1.5);
        assert_eq!(string_to_number(".5"), 0.5);
        assert_eq!(string_to_number("5."), 5.0);
        assert_eq!(string_to_number("1e3"), 1000.0);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number(" \t\n"), 0.0);
    }

    #[test]
    fn test_prefixed_radix() {
        assert_eq!(string_to_number("0x1F"), 31.0);
        assert_eq!(string_to_number("0o17"), 15.0);
        assert_eq!(string_to_number("0b101"), 5.0);
        assert!(string_to_number("0x").is_nan());
        assert!(string_to_number("0b102").is_nan());
        assert!(string_to_number("-0x10").is_nan());
    }

    #[test]
    fn test_infinity() {
        assert_eq!(string_to_number("Infinity"), f64::INFINITY);
        assert_eq!(string_to_number("+Infinity"), f64::INFINITY);
        assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
        assert!(string_to_number("inf").is_nan());
        assert!(string_to_number("infinity").is_nan());
    }

    #[test]
    fn test_garbage_is_nan() {
        assert!(string_to_number("abc").is_nan());
        assert!(string_to_number("NaN").is_nan());
        assert!(string_to_number("1 2").is_nan());
        assert!(string_to_number("+").is_nan());
        assert!(string_to_number(".").is_nan());
    }
}
