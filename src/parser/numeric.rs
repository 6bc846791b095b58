//! Deferred numeric literal validation (spec §4.1/§4.2: `O3P103`).

/// Parses a lexer-produced integer literal's raw text, validating digit
/// separator placement and signed-32-bit range. Returns the literal text
/// unchanged as the error payload so callers can build a precise message.
pub fn parse_int_literal(text: &str) -> Result<i32, String> {
    let (radix, digits) = split_base_prefix(text);
    if digits.is_empty() {
        return Err(text.to_string());
    }
    if !validate_separators(digits, radix) {
        return Err(text.to_string());
    }
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    let value = u64::from_str_radix(&cleaned, radix).map_err(|_| text.to_string())?;
    if value > i32::MAX as u64 {
        return Err(text.to_string());
    }
    Ok(value as i32)
}

fn split_base_prefix(text: &str) -> (u32, &str) {
    if let Some(rest) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        return (2, rest);
    }
    if let Some(rest) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
        return (8, rest);
    }
    if let Some(rest) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return (16, rest);
    }
    (10, text)
}

fn is_digit_for_base(c: char, radix: u32) -> bool {
    c.to_digit(radix).is_some()
}

/// `_` may appear only between two digit-for-base characters: no leading,
/// trailing, or adjacent separators.
fn validate_separators(digits: &str, radix: u32) -> bool {
    let chars: Vec<char> = digits.chars().collect();
    if chars.is_empty() {
        return false;
    }
    if chars[0] == '_' || *chars.last().unwrap() == '_' {
        return false;
    }
    let mut prev_was_sep = false;
    let mut saw_digit = false;
    for &c in &chars {
        if c == '_' {
            if prev_was_sep {
                return false;
            }
            prev_was_sep = true;
            continue;
        }
        if !is_digit_for_base(c, radix) {
            return false;
        }
        saw_digit = true;
        prev_was_sep = false;
    }
    saw_digit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_decimal() {
        assert_eq!(parse_int_literal("42"), Ok(42));
    }

    #[test]
    fn parses_binary_with_separator() {
        assert_eq!(parse_int_literal("0b1_0"), Ok(2));
    }

    #[test]
    fn parses_hex_and_octal() {
        assert_eq!(parse_int_literal("0x1F"), Ok(31));
        assert_eq!(parse_int_literal("0o17"), Ok(15));
    }

    #[test]
    fn rejects_leading_separator() {
        assert!(parse_int_literal("0b_10").is_err());
    }

    #[test]
    fn rejects_trailing_separator() {
        assert!(parse_int_literal("12_").is_err());
    }

    #[test]
    fn rejects_adjacent_separators() {
        assert!(parse_int_literal("1__2").is_err());
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(parse_int_literal("99999999999").is_err());
    }

    #[test]
    fn rejects_digit_outside_base() {
        assert!(parse_int_literal("0b102").is_err());
    }
}
