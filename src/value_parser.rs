//! Token-to-value parsing: integer, then float, then string, in that order.
//!
//! Only the float step tolerates surrounding whitespace; the integer step
//! runs against the raw token, so `" 42"` fails the int parse and falls
//! through to the float step instead. A token is only accepted as a number
//! if it parses in its entirety; `" 3e"` is left as a string rather than a
//! float, since `"3e"` alone isn't a complete float literal.

use crate::record::Value;

/// Parse a raw token into an int, float, or string value, in that priority
/// order. Never fails: an unparseable token is kept as a string.
pub fn parse_token(token: &str) -> Value {
    if let Ok(i) = token.parse::<i64>() {
        return Value::Int(i);
    }

    let trimmed = token.trim();
    if let Ok(f) = trimmed.parse::<f64>()
        && f.is_finite()
    {
        return Value::Float(f);
    }

    Value::Str(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_integer() {
        assert_eq!(parse_token("42"), Value::Int(42));
    }

    #[test]
    fn parses_negative_integer() {
        assert_eq!(parse_token("-7"), Value::Int(-7));
    }

    #[test]
    fn whitespace_padded_integer_parses_as_float() {
        assert_eq!(parse_token(" 42"), Value::Float(42.0));
    }

    #[test]
    fn parses_float() {
        assert_eq!(parse_token("2f"), Value::Str("2f".into()));
        assert_eq!(parse_token("2.5"), Value::Float(2.5));
    }

    #[test]
    fn incomplete_float_token_stays_string() {
        assert_eq!(parse_token(" 3e"), Value::Str(" 3e".into()));
    }

    #[test]
    fn non_numeric_stays_string() {
        assert_eq!(parse_token(" may"), Value::Str(" may".into()));
    }

    #[test]
    fn non_finite_float_stays_string() {
        match parse_token("inf") {
            Value::Str(_) => {}
            other => panic!("expected string, got {other:?}"),
        }
    }
}
