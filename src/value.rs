//! Dynamic value representation: the untyped subject of coercion.
//!
//! Values arrive from loosely-typed sources (CLI strings, JSON configuration
//! maps) and get folded into one of these variants. Containers nest
//! arbitrarily. `Value` is `Eq + Hash` so it can serve as a set element or a
//! map key; floats go through `OrderedFloat` for exactly that reason.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use indexmap::{IndexMap, IndexSet};
use ordered_float::OrderedFloat;
use regex::Regex;
use url::Url;

// ------------------------------ Capabilities ------------------------------ //

/// Opt-in surface for external object types that participate in coercion.
///
/// The engine never probes values at runtime; a foreign type states up front
/// which normalizations it supports. Everything defaults to "not supported",
/// in which case the container rules fall back to singleton wrapping.
pub trait ForeignValue: fmt::Debug + Send + Sync {
    /// Class name used for `Class`-kind membership tests.
    fn class_name(&self) -> &str;

    /// Canonical textual representation (feeds String/Symbol coercion).
    fn render(&self) -> String;

    /// Expand into an element sequence (feeds Array/Set normalization).
    fn as_sequence(&self) -> Option<Vec<Value>> {
        None
    }

    /// Expand into key/value pairs (feeds Hash normalization).
    fn as_mapping(&self) -> Option<Vec<(Value, Value)>> {
        None
    }

    /// Unix timestamp view (feeds Time coercion).
    fn as_timestamp(&self) -> Option<i64> {
        None
    }

    /// Integer view (feeds Integer coercion).
    fn as_int(&self) -> Option<i64> {
        None
    }

    /// Float view (feeds Float coercion).
    fn as_float(&self) -> Option<f64> {
        None
    }
}

// --------------------------------- Value ---------------------------------- //

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
    /// Interned-identifier analog; ordinary string payload, distinct kind.
    Sym(String),
    Regexp(Regex),
    Uri(Url),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    Time(DateTime<Utc>),
    Array(Vec<Value>),
    Set(IndexSet<Value>),
    Hash(IndexMap<Value, Value>),
    Foreign(Arc<dyn ForeignValue>),
}

impl Value {
    pub fn float(x: f64) -> Self {
        Value::Float(OrderedFloat(x))
    }

    pub fn sym(name: impl Into<String>) -> Self {
        Value::Sym(name.into())
    }

    pub fn foreign(obj: impl ForeignValue + 'static) -> Self {
        Value::Foreign(Arc::new(obj))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Kind tag for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "Boolean",
            Value::Int(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Str(_) => "String",
            Value::Sym(_) => "Symbol",
            Value::Regexp(_) => "Regexp",
            Value::Uri(_) => "URI",
            Value::Date(_) => "Date",
            Value::DateTime(_) => "DateTime",
            Value::Time(_) => "Time",
            Value::Array(_) => "Array",
            Value::Set(_) => "Set",
            Value::Hash(_) => "Hash",
            Value::Foreign(_) => "Foreign",
        }
    }

    // ------------------------------ JSON bridge --------------------------- //

    /// Fold a JSON document into a `Value`. Total: every JSON shape maps.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Hash(
                map.into_iter()
                    .map(|(k, v)| (Value::Str(k), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render as JSON. Text-shaped kinds (symbols, patterns, URIs, dates)
    /// emit their canonical text; sets emit as arrays; non-string map keys
    /// fall back to their text form.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Nil => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(x) => serde_json::Number::from_f64(x.0)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(x.0.to_string())),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Sym(s) => serde_json::Value::String(s.clone()),
            Value::Regexp(re) => serde_json::Value::String(re.as_str().to_string()),
            Value::Uri(u) => serde_json::Value::String(u.as_str().to_string()),
            Value::Date(d) => serde_json::Value::String(d.to_string()),
            Value::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
            Value::Time(t) => serde_json::Value::String(t.to_rfc3339()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Set(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Hash(map) => {
                let mut out = serde_json::Map::new();
                for (k, v) in map {
                    let key = match k {
                        Value::Str(s) | Value::Sym(s) => s.clone(),
                        other => other.to_string(),
                    };
                    out.insert(key, v.to_json());
                }
                serde_json::Value::Object(out)
            }
            Value::Foreign(obj) => serde_json::Value::String(obj.render()),
        }
    }
}

// ---------------------------- Eq / Hash / Display -------------------------- //

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Sym(a), Value::Sym(b)) => a == b,
            // Patterns compare by source text, not by compiled automaton.
            (Value::Regexp(a), Value::Regexp(b)) => a.as_str() == b.as_str(),
            (Value::Uri(a), Value::Uri(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            // Foreign objects have allocation identity, nothing deeper.
            (Value::Foreign(a), Value::Foreign(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

/// Order-independent combination for set/map hashing, so hashing agrees with
/// `IndexSet`/`IndexMap` equality (which ignores insertion order).
fn unordered_hash<T: Hash>(items: impl Iterator<Item = T>) -> u64 {
    let mut acc = 0u64;
    for item in items {
        let mut h = DefaultHasher::new();
        item.hash(&mut h);
        acc = acc.wrapping_add(h.finish());
    }
    acc
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Nil => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(x) => x.hash(state),
            Value::Str(s) => s.hash(state),
            Value::Sym(s) => s.hash(state),
            Value::Regexp(re) => re.as_str().hash(state),
            Value::Uri(u) => u.hash(state),
            Value::Date(d) => d.hash(state),
            Value::DateTime(dt) => dt.hash(state),
            Value::Time(t) => t.hash(state),
            Value::Array(items) => items.hash(state),
            Value::Set(items) => state.write_u64(unordered_hash(items.iter())),
            Value::Hash(map) => state.write_u64(unordered_hash(map.iter())),
            Value::Foreign(obj) => (Arc::as_ptr(obj) as *const () as usize).hash(state),
        }
    }
}

impl fmt::Display for Value {
    /// Canonical textual representation; this is what String and Symbol
    /// coercion produce. `Nil` renders empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{}", x.0),
            Value::Str(s) => f.write_str(s),
            Value::Sym(s) => f.write_str(s),
            Value::Regexp(re) => f.write_str(re.as_str()),
            Value::Uri(u) => f.write_str(u.as_str()),
            Value::Date(d) => write!(f, "{d}"),
            Value::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
            Value::Time(t) => f.write_str(&t.to_rfc3339()),
            Value::Array(_) | Value::Set(_) | Value::Hash(_) => write!(f, "{}", self.to_json()),
            Value::Foreign(obj) => f.write_str(&obj.render()),
        }
    }
}

// ------------------------------ Conversions -------------------------------- //

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}

// --------------------------------- Tests ----------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_equality_ignores_insertion_order() {
        let a: IndexSet<Value> = [Value::Int(1), Value::Int(2)].into_iter().collect();
        let b: IndexSet<Value> = [Value::Int(2), Value::Int(1)].into_iter().collect();
        assert_eq!(Value::Set(a.clone()), Value::Set(b.clone()));

        let mut ha = DefaultHasher::new();
        Value::Set(a).hash(&mut ha);
        let mut hb = DefaultHasher::new();
        Value::Set(b).hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }

    #[test]
    fn regexps_compare_by_pattern_text() {
        let a = Value::Regexp(Regex::new("ab+").unwrap());
        let b = Value::Regexp(Regex::new("ab+").unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn json_round_trip_preserves_shape() {
        let doc = serde_json::json!({"a": 1, "b": [true, null, "x"], "c": 2.5});
        let v = Value::from_json(doc.clone());
        assert_eq!(v.to_json(), doc);
    }

    #[test]
    fn display_renders_canonical_text() {
        assert_eq!(Value::Nil.to_string(), "");
        assert_eq!(Value::Int(16).to_string(), "16");
        assert_eq!(Value::sym("name").to_string(), "name");
        assert_eq!(
            Value::Array(vec![Value::Int(1), Value::Int(2)]).to_string(),
            "[1,2]"
        );
    }
}
