//! Descriptor-to-Type mapping.
//!
//! A declaration names its type with a `TypeDesc`, the native descriptor
//! vocabulary: nothing, a flag sentinel, a name, a container literal, a
//! callable, or an explicit class definition. `lookup` turns that into a
//! Type Node. Builtin kinds live in a fixed name-keyed table built at
//! startup; external classes go through a process-wide registry that doubles
//! as the lookup cache (insert-once, never evicted).

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;

use crate::error::TypeError;
use crate::types::{Callback, ClassDef, Type};

// ------------------------------- Descriptors ------------------------------- //

#[derive(Debug, Clone)]
pub enum TypeDesc {
    /// No declared type: values pass through unchanged.
    None,
    /// Boolean-true sentinel: "this parameter is a flag".
    Flag,
    /// Class reference by simple name, builtin or registered.
    Name(String),
    /// Single-element sequence literal `[T]`.
    List(Box<TypeDesc>),
    /// Single-element set literal `{T}`.
    SetOf(Box<TypeDesc>),
    /// Single-entry map literal `{K => V}`.
    MapOf(Box<TypeDesc>, Box<TypeDesc>),
    /// One-argument callable, used verbatim as the coercion.
    Callable(Callback),
    /// Explicit class definition; registered on first lookup.
    Class(Arc<ClassDef>),
}

impl TypeDesc {
    pub fn name(name: impl Into<String>) -> Self {
        TypeDesc::Name(name.into())
    }

    pub fn list(elem: TypeDesc) -> Self {
        TypeDesc::List(Box::new(elem))
    }

    pub fn set_of(elem: TypeDesc) -> Self {
        TypeDesc::SetOf(Box::new(elem))
    }

    pub fn map_of(key: TypeDesc, value: TypeDesc) -> Self {
        TypeDesc::MapOf(Box::new(key), Box::new(value))
    }
}

// ------------------------------ Builtin table ------------------------------ //

static BUILTINS: Lazy<HashMap<&'static str, Type>> = Lazy::new(|| {
    HashMap::from([
        ("Object", Type::Object),
        ("Boolean", Type::Boolean),
        ("Integer", Type::Integer),
        ("Float", Type::Float),
        ("String", Type::String),
        ("Symbol", Type::Symbol),
        ("Regexp", Type::Regexp),
        ("URI", Type::Uri),
        ("Date", Type::Date),
        ("DateTime", Type::DateTime),
        ("Time", Type::Time),
        ("Array", Type::Array(None)),
        ("Set", Type::Set(None)),
        ("Hash", Type::Hash { key: None, value: None }),
    ])
});

/// Builtin kind by simple name, with untyped sub-types for the containers.
pub fn builtin(name: &str) -> Option<Type> {
    BUILTINS.get(name).cloned()
}

// ------------------------------ Class registry ----------------------------- //

static CLASSES: Lazy<RwLock<HashMap<String, Arc<ClassDef>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register an external class so `Name` descriptors can find it. First
/// registration wins; a racing duplicate insert is idempotent. Entries live
/// for the process lifetime.
///
/// Note: builtin names shadow registered classes during `Name` lookup, so a
/// class registered as e.g. `"Array"` is only reachable through an explicit
/// `TypeDesc::Class` descriptor.
pub fn register_class(def: Arc<ClassDef>) -> Arc<ClassDef> {
    let mut table = CLASSES.write().unwrap_or_else(PoisonError::into_inner);
    table.entry(def.name().to_string()).or_insert(def).clone()
}

fn registered_class(name: &str) -> Option<Arc<ClassDef>> {
    let table = CLASSES.read().unwrap_or_else(PoisonError::into_inner);
    table.get(name).cloned()
}

// --------------------------------- Lookup ---------------------------------- //

/// Map a native type descriptor to a Type Node.
///
/// Container literals recurse into their sub-descriptors; names resolve
/// against the builtin table first and the class registry second; anything
/// unresolvable is an `UnsupportedDescriptor` error.
pub fn lookup(desc: &TypeDesc) -> Result<Type, TypeError> {
    match desc {
        TypeDesc::None => Ok(Type::Object),
        TypeDesc::Flag => Ok(Type::Boolean),
        TypeDesc::List(elem) => Ok(Type::Array(Some(Box::new(lookup(elem)?)))),
        TypeDesc::SetOf(elem) => Ok(Type::Set(Some(Box::new(lookup(elem)?)))),
        TypeDesc::MapOf(key, value) => Ok(Type::Hash {
            key: Some(Box::new(lookup(key)?)),
            value: Some(Box::new(lookup(value)?)),
        }),
        TypeDesc::Callable(cb) => Ok(Type::Func(cb.clone())),
        TypeDesc::Class(def) => Ok(Type::Class(register_class(def.clone()))),
        TypeDesc::Name(name) => {
            if let Some(ty) = builtin(name) {
                return Ok(ty);
            }
            if let Some(def) = registered_class(name) {
                return Ok(Type::Class(def));
            }
            Err(TypeError::UnsupportedDescriptor(name.clone()))
        }
    }
}

// ---------------------------------- Tests ---------------------------------- //
