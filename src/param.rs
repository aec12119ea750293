//! Parameter descriptors and named parameter sets.
//!
//! A `Param` binds a name, an optional Type Node, a description and a
//! default to one value slot. A `ParamSet` is an insertion-ordered
//! collection of them: the class-level set holds declarations,
//! `instantiate()` produces the per-object set with defaults resolved.
//! Every assignment routes through the coercion engine; `Nil` is stored
//! as-is (an absent value is never force-converted).

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{CoerceError, ParamError};
use crate::types::Type;
use crate::value::Value;

// -------------------------------- Defaults --------------------------------- //

/// Declared default: a plain value, a zero-argument producer, or a
/// one-argument producer that receives the owning set.
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Produce(Arc<dyn Fn() -> Value + Send + Sync>),
    ProduceFor(Arc<dyn Fn(&ParamSet) -> Value + Send + Sync>),
}

impl DefaultValue {
    /// Resolve against an owner. Plain values are copied so later mutation
    /// of the parameter never reaches the declaration; foreign payloads
    /// share their allocation (the non-copyable fallback).
    pub fn resolve(&self, owner: &ParamSet) -> Value {
        match self {
            DefaultValue::Value(v) => v.clone(),
            DefaultValue::Produce(f) => f(),
            DefaultValue::ProduceFor(f) => f(owner),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(v) => write!(f, "Default({v:?})"),
            DefaultValue::Produce(_) => f.write_str("Default(fn())"),
            DefaultValue::ProduceFor(_) => f.write_str("Default(fn(owner))"),
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(v: Value) -> Self {
        DefaultValue::Value(v)
    }
}

// --------------------------------- Param ----------------------------------- //

#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    ty: Option<Type>,
    description: Option<String>,
    default: Option<DefaultValue>,
    value: Value,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            ty: None,
            description: None,
            default: None,
            value: Value::Nil,
        }
    }

    // Builder-style declaration.

    pub fn of_type(mut self, ty: Type) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    pub fn default_with(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultValue::Produce(Arc::new(f)));
        self
    }

    pub fn default_for(
        mut self,
        f: impl Fn(&ParamSet) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.default = Some(DefaultValue::ProduceFor(Arc::new(f)));
        self
    }

    // Accessors.

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_type(&self) -> Option<&Type> {
        self.ty.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_set(&self) -> bool {
        !self.value.is_nil()
    }

    /// Assign a value, routing through the coercion engine. `Nil` clears
    /// the slot without conversion.
    pub fn set(&mut self, value: Value) -> Result<&Value, CoerceError> {
        self.value = match (&self.ty, value) {
            (_, Value::Nil) => Value::Nil,
            (Some(ty), v) => ty.coerce(v)?,
            (None, v) => v,
        };
        Ok(&self.value)
    }

    /// Resolve the declared default against `owner` without storing it.
    pub fn resolve_default(&self, owner: &ParamSet) -> Option<Value> {
        self.default.as_ref().map(|d| d.resolve(owner))
    }
}

// -------------------------------- ParamSet --------------------------------- //

/// Insertion-ordered named parameter collection. Redeclaring a name
/// overrides the declaration in place, keeping its original position.
#[derive(Debug, Clone, Default)]
pub struct ParamSet {
    set: IndexMap<String, Param>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, param: Param) {
        self.set.insert(param.name.clone(), param);
    }

    pub fn has(&self, name: &str) -> bool {
        self.set.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&Param, ParamError> {
        self.set
            .get(name)
            .ok_or_else(|| ParamError::NotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Param, ParamError> {
        self.set
            .get_mut(name)
            .ok_or_else(|| ParamError::NotFound(name.to_string()))
    }

    /// Assign one parameter, coercing through its declared type.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), ParamError> {
        self.get_mut(name)?.set(value)?;
        Ok(())
    }

    /// Current value, or the resolved-and-coerced default when unset.
    /// Defaults resolve on every read; the declaration is never mutated.
    pub fn value(&self, name: &str) -> Result<Value, ParamError> {
        let param = self.get(name)?;
        if param.is_set() {
            return Ok(param.value().clone());
        }
        match param.resolve_default(self) {
            Some(default) => match param.param_type() {
                Some(ty) => Ok(ty.coerce(default)?),
                None => Ok(default),
            },
            None => Ok(Value::Nil),
        }
    }

    pub fn is_set(&self, name: &str) -> Result<bool, ParamError> {
        Ok(self.get(name)?.is_set())
    }

    pub fn describe(&self, name: &str) -> Result<Option<&str>, ParamError> {
        Ok(self.get(name)?.description())
    }

    /// Bulk-assign from name/value pairs. Unknown names are skipped, so a
    /// shared configuration map can feed many sets.
    pub fn update(
        &mut self,
        values: impl IntoIterator<Item = (String, Value)>,
    ) -> Result<(), ParamError> {
        for (name, value) in values {
            if self.has(&name) {
                self.set(&name, value)?;
            }
        }
        Ok(())
    }

    /// Bulk-assign from a JSON configuration object. Non-object documents
    /// assign nothing.
    pub fn update_from_json(&mut self, doc: serde_json::Value) -> Result<(), ParamError> {
        if let serde_json::Value::Object(map) = doc {
            self.update(map.into_iter().map(|(k, v)| (k, Value::from_json(v))))?;
        }
        Ok(())
    }

    /// Class-level to instance-level transition: clone every declaration
    /// and seed unset slots from their defaults, resolved once per call.
    pub fn instantiate(&self) -> Result<ParamSet, ParamError> {
        let mut out = self.clone();
        for param in out.set.values_mut() {
            if !param.is_set() {
                if let Some(default) = param.resolve_default(self) {
                    param.set(default)?;
                }
            }
        }
        Ok(out)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.set.values()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Snapshot of every current value as a JSON object, declaration order.
    pub fn to_json(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        for param in self.set.values() {
            out.insert(param.name.clone(), param.value.to_json());
        }
        serde_json::Value::Object(out)
    }
}

// ---------------------------------- Tests ---------------------------------- //
