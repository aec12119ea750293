//! Per-kind scalar coercion rules.
//!
//! Numeric coercion is best-effort by contract: unparseable or unsupported
//! input degrades to `0` / `0.0` instead of failing. Callers that need strict
//! validation check `matches()` first. The textual kinds (pattern, URI) are
//! the only ones here that can fail.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::CoerceError;
use crate::value::Value;

// -------------------------------- Boolean --------------------------------- //

/// Truth table: `false`, the literal string `"false"` and the symbol
/// `:false` are false; everything else is true. (`nil` never reaches here;
/// the engine propagates it before dispatch.)
pub(crate) fn to_bool(value: &Value) -> bool {
    match value {
        Value::Nil | Value::Bool(false) => false,
        Value::Str(s) | Value::Sym(s) => s != "false",
        _ => true,
    }
}

// -------------------------------- Integer --------------------------------- //

/// Integer view of a value. Strings go through auto-detected-base parsing;
/// values with a native integer capability use it; everything else is `0`.
pub(crate) fn to_int(value: &Value) -> i64 {
    match value {
        Value::Int(i) => *i,
        Value::Float(x) => x.0.trunc() as i64,
        Value::Str(s) => parse_int_auto(s),
        Value::Time(t) => t.timestamp(),
        Value::DateTime(dt) => dt.timestamp(),
        Value::Foreign(obj) => obj.as_int().unwrap_or(0),
        _ => 0,
    }
}

/// Parse with base sensing: `0x`/`0X` prefix means base 16, a leading `0`
/// means base 8, anything else base 10. The longest valid digit prefix wins;
/// no digits at all yields `0`.
fn parse_int_auto(s: &str) -> i64 {
    let t = s.trim();
    let (negative, t) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };

    let (base, digits) = if let Some(rest) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X"))
    {
        (16u32, rest)
    } else if t.len() > 1 && t.starts_with('0') {
        (8u32, &t[1..])
    } else {
        (10u32, t)
    };

    let mut acc: i64 = 0;
    let mut saw_digit = false;
    for c in digits.chars() {
        let Some(d) = c.to_digit(base) else { break };
        let Some(next) = acc
            .checked_mul(i64::from(base))
            .and_then(|n| n.checked_add(i64::from(d)))
        else {
            break;
        };
        acc = next;
        saw_digit = true;
    }

    if !saw_digit {
        0
    } else if negative {
        -acc
    } else {
        acc
    }
}

// --------------------------------- Float ---------------------------------- //

static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").expect("float prefix pattern")
});

/// Float view of a value; unparseable input degrades to `0.0`.
pub(crate) fn to_float(value: &Value) -> f64 {
    match value {
        Value::Float(x) => x.0,
        Value::Int(i) => *i as f64,
        Value::Str(s) => FLOAT_PREFIX
            .find(s.trim())
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0),
        Value::Time(t) => t.timestamp_micros() as f64 / 1e6,
        Value::Foreign(obj) => obj.as_float().unwrap_or(0.0),
        _ => 0.0,
    }
}

// --------------------------------- Symbol --------------------------------- //

/// Symbols come straight from strings; anything else goes through its
/// canonical text first.
pub(crate) fn to_sym(value: Value) -> Value {
    match value {
        sym @ Value::Sym(_) => sym,
        Value::Str(s) => Value::Sym(s),
        other => Value::Sym(other.to_string()),
    }
}

// --------------------------------- Regexp --------------------------------- //

pub(crate) fn to_regexp(value: &Value) -> Result<Regex, CoerceError> {
    if let Value::Regexp(re) = value {
        return Ok(re.clone());
    }
    let text = value.to_string();
    Regex::new(&text).map_err(|source| CoerceError::Pattern { text, source })
}

// ----------------------------------- URI ---------------------------------- //

pub(crate) fn to_uri(value: &Value) -> Result<Url, CoerceError> {
    if let Value::Uri(u) = value {
        return Ok(u.clone());
    }
    let text = value.to_string();
    Url::parse(&text).map_err(|source| CoerceError::UriParse { text, source })
}

// ---------------------------------- Tests ---------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_truth_table() {
        assert!(!to_bool(&Value::Bool(false)));
        assert!(!to_bool(&Value::from("false")));
        assert!(!to_bool(&Value::sym("false")));
        assert!(to_bool(&Value::Bool(true)));
        assert!(to_bool(&Value::from("1")));
        assert!(to_bool(&Value::from("no")));
        assert!(to_bool(&Value::Int(0)));
    }

    #[test]
    fn integer_base_sensing() {
        assert_eq!(parse_int_auto("0xa"), 10);
        assert_eq!(parse_int_auto("0X10"), 16);
        assert_eq!(parse_int_auto("010"), 8);
        assert_eq!(parse_int_auto("10"), 10);
        assert_eq!(parse_int_auto("-0x10"), -16);
        assert_eq!(parse_int_auto("0"), 0);
    }

    #[test]
    fn integer_prefix_and_degrade() {
        assert_eq!(parse_int_auto("12abc"), 12);
        assert_eq!(parse_int_auto("x"), 0);
        assert_eq!(parse_int_auto(""), 0);
        assert_eq!(parse_int_auto("09"), 0); // octal with no valid digits
    }

    #[test]
    fn integer_truncates_floats() {
        assert_eq!(to_int(&Value::float(10.9)), 10);
        assert_eq!(to_int(&Value::float(-2.7)), -2);
    }

    #[test]
    fn float_best_effort() {
        assert_eq!(to_float(&Value::from("1.5")), 1.5);
        assert_eq!(to_float(&Value::from("2.5e2")), 250.0);
        assert_eq!(to_float(&Value::from("1.5abc")), 1.5);
        assert_eq!(to_float(&Value::from("abc")), 0.0);
        assert_eq!(to_float(&Value::Bool(true)), 0.0);
    }

    #[test]
    fn regexp_rejects_bad_syntax() {
        assert!(to_regexp(&Value::from("a(b")).is_err());
        assert!(to_regexp(&Value::from("ab+")).is_ok());
    }

    #[test]
    fn uri_rejects_malformed_input() {
        assert!(to_uri(&Value::from("http://example.com/")).is_ok());
        assert!(to_uri(&Value::from("not a uri")).is_err());
    }
}
