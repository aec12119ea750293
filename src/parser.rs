//! Ad-hoc literal recognition for `name=value` parameter assignments, plus
//! textual type expressions for tooling.
//!
//! `parse_value` runs a fixed recognizer table: first matching pattern wins.
//! Anything unrecognized stays a plain string; the coercion engine is the
//! layer that enforces a declared type, not this one.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::TypeError;
use crate::registry::TypeDesc;
use crate::value::Value;

// ---------------------------- Value recognizers ---------------------------- //

type Recognizer = (Regex, fn(&str) -> Value);

fn hex_int(s: &str) -> Value {
    i64::from_str_radix(&s[2..], 16)
        .map(Value::Int)
        .unwrap_or_else(|_| Value::Str(s.to_string()))
}

fn octal_int(s: &str) -> Value {
    i64::from_str_radix(&s[1..], 8)
        .map(Value::Int)
        .unwrap_or_else(|_| Value::Str(s.to_string()))
}

fn decimal_int(s: &str) -> Value {
    s.parse::<i64>()
        .map(Value::Int)
        .unwrap_or_else(|_| Value::Str(s.to_string()))
}

fn true_lit(_: &str) -> Value {
    Value::Bool(true)
}

fn false_lit(_: &str) -> Value {
    Value::Bool(false)
}

fn uri_lit(s: &str) -> Value {
    // A scheme prefix that fails full URI parsing stays a plain string.
    Url::parse(s)
        .map(Value::Uri)
        .unwrap_or_else(|_| Value::Str(s.to_string()))
}

fn quoted_str(s: &str) -> Value {
    Value::Str(s[1..s.len() - 1].replace("\\'", "'"))
}

static FORMATS: Lazy<Vec<Recognizer>> = Lazy::new(|| {
    let pat = |p: &str| Regex::new(p).expect("recognizer pattern");
    vec![
        (pat(r"^0x[0-9a-fA-F]+$"), hex_int),
        (pat(r"^0[0-7]+$"), octal_int),
        (pat(r"^[0-9]+$"), decimal_int),
        (pat(r"^true$"), true_lit),
        (pat(r"^false$"), false_lit),
        (pat(r"^[a-zA-Z][a-zA-Z0-9]*://"), uri_lit),
        (pat(r"^'(?:\\'|[^'])*'$"), quoted_str),
    ]
});

/// Recognize and parse one literal; unrecognized input stays a string.
pub fn parse_value(raw: &str) -> Value {
    for (pattern, parse) in FORMATS.iter() {
        if pattern.is_match(raw) {
            return parse(raw);
        }
    }
    Value::Str(raw.to_string())
}

// ------------------------------ Assignments -------------------------------- //

/// Parse a `name=value` assignment. A bare `name` yields `Nil`.
pub fn parse_param(name_and_value: &str) -> (String, Value) {
    match name_and_value.split_once('=') {
        Some((name, value)) => (name.to_string(), parse_value(value)),
        None => (name_and_value.to_string(), Value::Nil),
    }
}

/// Fold many assignments into an ordered map; later assignments override.
pub fn parse<I>(names_and_values: I) -> IndexMap<String, Value>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out = IndexMap::new();
    for entry in names_and_values {
        let (name, value) = parse_param(entry.as_ref());
        out.insert(name, value);
    }
    out
}

// ---------------------------- Type expressions ----------------------------- //

/// Parse a textual type expression into a descriptor:
/// a builtin or registered name, `[T]`, `{T}`, or `{K => V}`, nested
/// arbitrarily (e.g. `{Symbol => [Integer]}`).
pub fn parse_type(expr: &str) -> Result<TypeDesc, TypeError> {
    let mut cursor = TypeCursor { src: expr, pos: 0 };
    let desc = cursor.parse_one()?;
    cursor.skip_ws();
    if cursor.pos != expr.len() {
        return Err(TypeError::UnsupportedDescriptor(expr.to_string()));
    }
    Ok(desc)
}

struct TypeCursor<'a> {
    src: &'a str,
    pos: usize,
}

impl TypeCursor<'_> {
    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        if self.src[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn fail(&self) -> TypeError {
        TypeError::UnsupportedDescriptor(self.src.to_string())
    }

    fn parse_one(&mut self) -> Result<TypeDesc, TypeError> {
        self.skip_ws();
        if self.eat('[') {
            let elem = self.parse_one()?;
            self.skip_ws();
            if !self.eat(']') {
                return Err(self.fail());
            }
            return Ok(TypeDesc::list(elem));
        }
        if self.eat('{') {
            let first = self.parse_one()?;
            self.skip_ws();
            if self.eat('=') {
                if !self.eat('>') {
                    return Err(self.fail());
                }
                let value = self.parse_one()?;
                self.skip_ws();
                if !self.eat('}') {
                    return Err(self.fail());
                }
                return Ok(TypeDesc::map_of(first, value));
            }
            if !self.eat('}') {
                return Err(self.fail());
            }
            return Ok(TypeDesc::set_of(first));
        }

        let rest = &self.src[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.fail());
        }
        let name = &rest[..len];
        self.pos += len;
        Ok(TypeDesc::name(name))
    }
}

// ---------------------------------- Tests ---------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use crate::types::Type;

    #[test]
    fn recognizes_numeric_literals() {
        assert_eq!(parse_value("100"), Value::Int(100));
        assert_eq!(parse_value("012"), Value::Int(10));
        assert_eq!(parse_value("0xff"), Value::Int(255));
    }

    #[test]
    fn recognizes_boolean_literals() {
        assert_eq!(parse_value("true"), Value::Bool(true));
        assert_eq!(parse_value("false"), Value::Bool(false));
        // Anchored: embedded occurrences stay plain strings.
        assert_eq!(parse_value("xfalsey"), Value::from("xfalsey"));
    }

    #[test]
    fn recognizes_uri_literals() {
        let url = "http://example.com/";
        assert_eq!(
            parse_value(url),
            Value::Uri(Url::parse(url).unwrap())
        );
    }

    #[test]
    fn recognizes_quoted_strings() {
        assert_eq!(parse_value(r"'bla \' bla'"), Value::from("bla ' bla"));
    }

    #[test]
    fn unrecognized_input_stays_a_string() {
        assert_eq!(parse_value("mesg"), Value::from("mesg"));
        assert_eq!(parse_value("1.5"), Value::from("1.5"));
    }

    #[test]
    fn parses_name_value_forms() {
        assert_eq!(parse_param("var"), ("var".to_string(), Value::Nil));
        assert_eq!(
            parse_param("var1=test"),
            ("var1".to_string(), Value::from("test"))
        );
        assert_eq!(parse_param("x=0x1"), ("x".to_string(), Value::Int(1)));
    }

    #[test]
    fn folds_assignments_in_order() {
        let params = parse(["x=2", "y=true", "x=3"]);
        assert_eq!(params.get("x"), Some(&Value::Int(3)));
        assert_eq!(params.get("y"), Some(&Value::Bool(true)));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn type_expressions_cover_the_descriptor_shapes() {
        assert_eq!(
            registry::lookup(&parse_type("Integer").unwrap()).unwrap(),
            Type::Integer
        );
        assert_eq!(
            registry::lookup(&parse_type("[Integer]").unwrap()).unwrap(),
            Type::Array(Some(Box::new(Type::Integer)))
        );
        assert_eq!(
            registry::lookup(&parse_type("{Symbol}").unwrap()).unwrap(),
            Type::Set(Some(Box::new(Type::Symbol)))
        );
        assert_eq!(
            registry::lookup(&parse_type("{Symbol => Integer}").unwrap()).unwrap(),
            Type::Hash {
                key: Some(Box::new(Type::Symbol)),
                value: Some(Box::new(Type::Integer)),
            }
        );
    }

    #[test]
    fn type_expressions_nest() {
        let ty = registry::lookup(&parse_type("{Symbol => [[Integer]]}").unwrap()).unwrap();
        assert_eq!(
            ty,
            Type::Hash {
                key: Some(Box::new(Type::Symbol)),
                value: Some(Box::new(Type::Array(Some(Box::new(Type::Array(Some(
                    Box::new(Type::Integer)
                ))))))),
            }
        );
    }

    #[test]
    fn malformed_type_expressions_fail() {
        assert!(parse_type("[Integer").is_err());
        assert!(parse_type("{A => }").is_err());
        assert!(parse_type("").is_err());
        assert!(parse_type("Integer]").is_err());
    }
}
