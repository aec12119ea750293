//! Type Node algebra and the coercion engine.
//!
//! A `Type` is one tag out of a closed kind set, parameterized by sub-types
//! where the kind is a container. Two operations are defined over it:
//!
//! - `matches(value)`: structural membership, "is this value already an
//!   acceptable instance of the kind".
//! - `coerce(value)`: recursive conversion into the kind's canonical
//!   representation. Nil always passes through untouched; already-matching
//!   scalars short-circuit; containers and callback types always reapply.
//!
//! Nodes are immutable once constructed and structurally recursive but never
//! cyclic; the registry has no way to express a self-referential type.

pub mod scalar;
pub mod temporal;

use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::error::CoerceError;
use crate::value::Value;

// ------------------------------- Callbacks -------------------------------- //

/// User-supplied one-argument transform used verbatim as a coercion.
#[derive(Clone)]
pub struct Callback(Arc<dyn Fn(Value) -> Value + Send + Sync>);

impl Callback {
    pub fn new(f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Callback(Arc::new(f))
    }

    pub fn call(&self, value: Value) -> Value {
        (self.0)(value)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

// ------------------------------ Wrapped classes ---------------------------- //

/// Named external constructor used as the coercion target for the `Class`
/// kind: `coerce(v)` hands `v` to the constructor, membership is by class
/// name against `ForeignValue::class_name()`.
pub struct ClassDef {
    name: String,
    ctor: Box<dyn Fn(Value) -> Result<Value, String> + Send + Sync>,
}

impl ClassDef {
    pub fn new(
        name: impl Into<String>,
        ctor: impl Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(ClassDef { name: name.into(), ctor: Box::new(ctor) })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the single-argument constructor; failures surface as
    /// `CoercionFailed`.
    pub fn construct(&self, value: Value) -> Result<Value, CoerceError> {
        let input = format!("{} {}", value.kind_name(), value);
        (self.ctor)(value).map_err(|reason| CoerceError::CoercionFailed {
            class: self.name.clone(),
            input,
            reason,
        })
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassDef({})", self.name)
    }
}

// -------------------------------- Type Node -------------------------------- //

#[derive(Debug, Clone)]
pub enum Type {
    /// Universal supertype: matches and passes through anything.
    Object,
    Boolean,
    Integer,
    Float,
    String,
    Symbol,
    Regexp,
    Uri,
    Date,
    DateTime,
    Time,
    /// `None` element type means untyped: elements pass through unchanged.
    Array(Option<Box<Type>>),
    Set(Option<Box<Type>>),
    Hash {
        key: Option<Box<Type>>,
        value: Option<Box<Type>>,
    },
    Class(Arc<ClassDef>),
    Func(Callback),
}

impl Type {
    /// Structural membership test: is the value already an acceptable
    /// instance of this kind, without conversion.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Type::Object => true,
            Type::Boolean => matches!(value, Value::Bool(_)),
            Type::Integer => matches!(value, Value::Int(_)),
            Type::Float => matches!(value, Value::Float(_)),
            Type::String => matches!(value, Value::Str(_)),
            Type::Symbol => matches!(value, Value::Sym(_)),
            Type::Regexp => matches!(value, Value::Regexp(_)),
            Type::Uri => matches!(value, Value::Uri(_)),
            Type::Date => matches!(value, Value::Date(_)),
            Type::DateTime => matches!(value, Value::DateTime(_)),
            Type::Time => matches!(value, Value::Time(_)),
            Type::Array(elem) => match value {
                Value::Array(items) => match elem {
                    Some(t) => items.iter().all(|item| t.matches(item)),
                    None => true,
                },
                _ => false,
            },
            Type::Set(elem) => match value {
                Value::Set(items) => match elem {
                    Some(t) => items.iter().all(|item| t.matches(item)),
                    None => true,
                },
                _ => false,
            },
            Type::Hash { key, value: val } => match value {
                Value::Hash(map) => map.iter().all(|(k, v)| {
                    key.as_ref().is_none_or(|t| t.matches(k))
                        && val.as_ref().is_none_or(|t| t.matches(v))
                }),
                _ => false,
            },
            Type::Class(def) => match value {
                Value::Foreign(obj) => obj.class_name() == def.name(),
                _ => false,
            },
            // A callback type is a conversion, not a classification.
            Type::Func(_) => false,
        }
    }

    /// Convert a value into this kind's canonical representation.
    ///
    /// Containers coerce fail-fast: the first failing element aborts the
    /// whole call. Numeric kinds never fail (they degrade to zero); pattern,
    /// URI and date kinds fail on unparseable text; `Class` kinds propagate
    /// constructor failures.
    pub fn coerce(&self, value: Value) -> Result<Value, CoerceError> {
        // A parameter with no value is never force-converted.
        if value.is_nil() {
            return Ok(Value::Nil);
        }
        // Already-acceptable scalars pass through as-is; containers and
        // callback types always reapply.
        if self.is_scalar() && self.matches(&value) {
            return Ok(value);
        }

        match self {
            Type::Object => Ok(value),
            Type::Boolean => Ok(Value::Bool(scalar::to_bool(&value))),
            Type::Integer => Ok(Value::Int(scalar::to_int(&value))),
            Type::Float => Ok(Value::float(scalar::to_float(&value))),
            Type::String => Ok(Value::Str(value.to_string())),
            Type::Symbol => Ok(scalar::to_sym(value)),
            Type::Regexp => Ok(Value::Regexp(scalar::to_regexp(&value)?)),
            Type::Uri => Ok(Value::Uri(scalar::to_uri(&value)?)),
            Type::Date => Ok(Value::Date(temporal::to_date(&value)?)),
            Type::DateTime => Ok(Value::DateTime(temporal::to_datetime(&value)?)),
            Type::Time => Ok(Value::Time(temporal::to_time(&value)?)),
            Type::Array(elem) => {
                let items = into_sequence(value);
                let items = match elem {
                    Some(t) => items
                        .into_iter()
                        .map(|item| t.coerce(item))
                        .collect::<Result<Vec<_>, _>>()?,
                    None => items,
                };
                Ok(Value::Array(items))
            }
            Type::Set(elem) => {
                let mut out = IndexSet::new();
                for item in into_sequence(value) {
                    let item = match elem {
                        Some(t) => t.coerce(item)?,
                        None => item,
                    };
                    out.insert(item);
                }
                Ok(Value::Set(out))
            }
            Type::Hash { key, value: val } => {
                let mut out = IndexMap::new();
                for (k, v) in into_pairs(value) {
                    let k = match key {
                        Some(t) => t.coerce(k)?,
                        None => k,
                    };
                    let v = match val {
                        Some(t) => t.coerce(v)?,
                        None => v,
                    };
                    out.insert(k, v);
                }
                Ok(Value::Hash(out))
            }
            Type::Class(def) => def.construct(value),
            Type::Func(cb) => Ok(cb.call(value)),
        }
    }

    /// Kinds eligible for the already-matching pass-through. Containers and
    /// callbacks always reapply; `Class` always constructs (re-wrapping an
    /// instance is the wrapped constructor's business, not ours).
    fn is_scalar(&self) -> bool {
        matches!(
            self,
            Type::Boolean
                | Type::Integer
                | Type::Float
                | Type::String
                | Type::Symbol
                | Type::Regexp
                | Type::Uri
                | Type::Date
                | Type::DateTime
                | Type::Time
        )
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Object, Type::Object)
            | (Type::Boolean, Type::Boolean)
            | (Type::Integer, Type::Integer)
            | (Type::Float, Type::Float)
            | (Type::String, Type::String)
            | (Type::Symbol, Type::Symbol)
            | (Type::Regexp, Type::Regexp)
            | (Type::Uri, Type::Uri)
            | (Type::Date, Type::Date)
            | (Type::DateTime, Type::DateTime)
            | (Type::Time, Type::Time) => true,
            (Type::Array(a), Type::Array(b)) => a == b,
            (Type::Set(a), Type::Set(b)) => a == b,
            (
                Type::Hash { key: ak, value: av },
                Type::Hash { key: bk, value: bv },
            ) => ak == bk && av == bv,
            (Type::Class(a), Type::Class(b)) => a.name() == b.name(),
            (Type::Func(a), Type::Func(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Object => f.write_str("Object"),
            Type::Boolean => f.write_str("Boolean"),
            Type::Integer => f.write_str("Integer"),
            Type::Float => f.write_str("Float"),
            Type::String => f.write_str("String"),
            Type::Symbol => f.write_str("Symbol"),
            Type::Regexp => f.write_str("Regexp"),
            Type::Uri => f.write_str("URI"),
            Type::Date => f.write_str("Date"),
            Type::DateTime => f.write_str("DateTime"),
            Type::Time => f.write_str("Time"),
            Type::Array(None) => f.write_str("Array"),
            Type::Array(Some(t)) => write!(f, "[{t}]"),
            Type::Set(None) => f.write_str("Set"),
            Type::Set(Some(t)) => write!(f, "{{{t}}}"),
            Type::Hash { key: None, value: None } => f.write_str("Hash"),
            Type::Hash { key, value } => {
                let k = key.as_deref().map_or_else(|| "Object".into(), Type::to_string);
                let v = value.as_deref().map_or_else(|| "Object".into(), Type::to_string);
                write!(f, "{{{k} => {v}}}")
            }
            Type::Class(def) => write!(f, "Class({})", def.name()),
            Type::Func(_) => f.write_str("Func"),
        }
    }
}

// ----------------------------- Normalization ------------------------------- //

/// Sequence view of a value: native sequences pass through, sets flatten in
/// order, maps expand to `[key, value]` pairs, foreign values use their
/// declared capability, and anything else wraps as a singleton.
fn into_sequence(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Set(items) => items.into_iter().collect(),
        Value::Hash(map) => map
            .into_iter()
            .map(|(k, v)| Value::Array(vec![k, v]))
            .collect(),
        Value::Foreign(obj) => match obj.as_sequence() {
            Some(items) => items,
            None => vec![Value::Foreign(obj)],
        },
        other => vec![other],
    }
}

/// Mapping view of a value: native maps pass through; a flat alternating
/// sequence `[k1, v1, k2, v2, ...]` is paired up (a trailing unpaired key
/// maps to nil); foreign values use their declared capability; anything else
/// becomes the singleton mapping `{value => true}`.
fn into_pairs(value: Value) -> Vec<(Value, Value)> {
    match value {
        Value::Hash(map) => map.into_iter().collect(),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len() / 2 + 1);
            let mut it = items.into_iter();
            while let Some(k) = it.next() {
                let v = it.next().unwrap_or(Value::Nil);
                out.push((k, v));
            }
            out
        }
        Value::Foreign(obj) => match obj.as_mapping() {
            Some(pairs) => pairs,
            None => vec![(Value::Foreign(obj), Value::Bool(true))],
        },
        other => vec![(other, Value::Bool(true))],
    }
}

// ---------------------------------- Tests ---------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ForeignValue;

    fn ints(items: &[i64]) -> Value {
        Value::Array(items.iter().copied().map(Value::Int).collect())
    }

    fn strs(items: &[&str]) -> Value {
        Value::Array(items.iter().map(|s| Value::from(*s)).collect())
    }

    #[test]
    fn object_passes_everything_through() {
        let v = strs(&["a", "b"]);
        assert_eq!(Type::Object.coerce(v.clone()).unwrap(), v);
        assert_eq!(Type::Object.coerce(Value::Nil).unwrap(), Value::Nil);
        assert!(Type::Object.matches(&Value::Bool(true)));
    }

    #[test]
    fn nil_propagates_through_every_kind() {
        let kinds = [
            Type::Boolean,
            Type::Integer,
            Type::Float,
            Type::String,
            Type::Symbol,
            Type::Regexp,
            Type::Uri,
            Type::Date,
            Type::DateTime,
            Type::Time,
            Type::Array(None),
            Type::Set(None),
            Type::Hash { key: None, value: None },
        ];
        for t in kinds {
            assert_eq!(t.coerce(Value::Nil).unwrap(), Value::Nil, "kind {t}");
        }
    }

    #[test]
    fn matching_scalars_pass_through_unconverted() {
        let v = Value::from("0x10");
        // A String target leaves a string alone, base sensing never runs.
        assert_eq!(Type::String.coerce(v.clone()).unwrap(), v);
        assert_eq!(Type::Integer.coerce(Value::Int(7)).unwrap(), Value::Int(7));
    }

    #[test]
    fn array_coerces_elements_recursively() {
        let t = Type::Array(Some(Box::new(Type::Integer)));
        assert_eq!(
            t.coerce(strs(&["1", "2", "3"])).unwrap(),
            ints(&[1, 2, 3])
        );
    }

    #[test]
    fn array_wraps_scalars_and_flattens_sets() {
        let t = Type::Array(None);
        assert_eq!(t.coerce(Value::Int(1)).unwrap(), ints(&[1]));

        let set: IndexSet<Value> = [Value::Int(1), Value::Int(2)].into_iter().collect();
        assert_eq!(t.coerce(Value::Set(set)).unwrap(), ints(&[1, 2]));
    }

    #[test]
    fn set_collapses_duplicates_after_coercion() {
        let t = Type::Set(Some(Box::new(Type::Integer)));
        let got = t.coerce(strs(&["x", "0", "1", "2", "3"])).unwrap();
        // "x" degrades to 0 and collapses into the parsed "0".
        let expected: IndexSet<Value> =
            [0, 1, 2, 3].into_iter().map(Value::Int).collect();
        assert_eq!(got, Value::Set(expected));
    }

    #[test]
    fn hash_pairs_up_flat_sequences() {
        let t = Type::Hash { key: None, value: None };
        let got = t
            .coerce(Value::Array(vec![
                Value::sym("a"),
                Value::Int(1),
                Value::sym("b"),
                Value::Int(2),
            ]))
            .unwrap();
        let expected: IndexMap<Value, Value> = [
            (Value::sym("a"), Value::Int(1)),
            (Value::sym("b"), Value::Int(2)),
        ]
        .into_iter()
        .collect();
        assert_eq!(got, Value::Hash(expected));
    }

    #[test]
    fn hash_synthesizes_singleton_from_scalars() {
        let t = Type::Hash { key: None, value: None };
        let got = t.coerce(Value::Int(2)).unwrap();
        let expected: IndexMap<Value, Value> =
            [(Value::Int(2), Value::Bool(true))].into_iter().collect();
        assert_eq!(got, Value::Hash(expected));
    }

    #[test]
    fn hash_coerces_keys_and_values() {
        let t = Type::Hash {
            key: Some(Box::new(Type::Symbol)),
            value: Some(Box::new(Type::Integer)),
        };
        let input: IndexMap<Value, Value> = [
            (Value::from("a"), Value::from("1")),
            (Value::from("b"), Value::from("2")),
        ]
        .into_iter()
        .collect();
        let expected: IndexMap<Value, Value> = [
            (Value::sym("a"), Value::Int(1)),
            (Value::sym("b"), Value::Int(2)),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            t.coerce(Value::Hash(input)).unwrap(),
            Value::Hash(expected)
        );
    }

    #[test]
    fn nested_container_types_recurse() {
        // [[Integer]]: rows of integer strings coerce all the way down.
        let t = Type::Array(Some(Box::new(Type::Array(Some(Box::new(
            Type::Integer,
        ))))));
        let got = t
            .coerce(Value::Array(vec![strs(&["1", "2"]), strs(&["0x10"])]))
            .unwrap();
        assert_eq!(
            got,
            Value::Array(vec![ints(&[1, 2]), ints(&[16])])
        );
        assert!(t.matches(&got));
    }

    #[test]
    fn container_matching_checks_elements() {
        let t = Type::Array(Some(Box::new(Type::Integer)));
        assert!(t.matches(&ints(&[1, 2])));
        assert!(!t.matches(&strs(&["1"])));
        assert!(!t.matches(&Value::Int(1)));
        // Untyped container: any element goes.
        assert!(Type::Array(None).matches(&strs(&["1"])));
    }

    #[test]
    fn failing_element_aborts_whole_container() {
        let t = Type::Array(Some(Box::new(Type::Regexp)));
        let result = t.coerce(strs(&["ab+", "a(b"]));
        assert!(matches!(result, Err(CoerceError::Pattern { .. })));
    }

    #[derive(Debug)]
    struct Port(u16);

    impl ForeignValue for Port {
        fn class_name(&self) -> &str {
            "Port"
        }
        fn render(&self) -> String {
            self.0.to_string()
        }
    }

    fn port_class() -> Arc<ClassDef> {
        ClassDef::new("Port", |v| match &v {
            Value::Int(i) if (0..=65535).contains(i) => {
                Ok(Value::foreign(Port(*i as u16)))
            }
            other => Err(format!("not a port number: {other}")),
        })
    }

    #[test]
    fn class_kind_wraps_through_constructor() {
        let t = Type::Class(port_class());
        let wrapped = t.coerce(Value::Int(80)).unwrap();
        assert!(t.matches(&wrapped));
        assert!(!t.matches(&Value::Int(80)));

        let result = t.coerce(Value::Int(99999));
        assert!(matches!(result, Err(CoerceError::CoercionFailed { .. })));
    }

    #[test]
    fn func_kind_applies_callback_verbatim() {
        let t = Type::Func(Callback::new(|v| {
            Value::Str(format!("0x{:x}", scalar::to_int(&v)))
        }));
        assert_eq!(t.coerce(Value::Int(255)).unwrap(), Value::from("0xff"));
        // Callback types never classify, they only convert.
        assert!(!t.matches(&Value::from("0xff")));
    }
}
