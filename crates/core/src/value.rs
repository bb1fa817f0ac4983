//! Typed leaf values stored in a [`ConfigDocument`](crate::ConfigDocument).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DocumentError;

/// Nested section of a document. Keys are kept sorted so rendering is stable.
pub type Table = BTreeMap<String, Value>;

/// A single setting value.
///
/// Serialized untagged so a document round-trips through JSON/YAML/TOML-shaped
/// input without wrapper objects. Variant order matters for deserialization:
/// integers must be tried before floats. Every JSON shape maps onto a variant,
/// so option values the engine understands are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Explicit `null`. Kept on round-trip but reads as absent.
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Table(Table),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    List,
    Table,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Table => "table",
        };
        f.write_str(s)
    }
}

/// Stored kind did not match the requested kind. Carries no path; see [`TypeMismatch::at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMismatch {
    pub expected: ValueKind,
    pub found: ValueKind,
}

impl TypeMismatch {
    /// Attach the key path the value was read from.
    pub fn at(self, path: &str) -> DocumentError {
        DocumentError::TypeMismatch { path: path.to_string(), expected: self.expected, found: self.found }
    }
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, found {}", self.expected, self.found)
    }
}

impl std::error::Error for TypeMismatch {}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Table(_) => ValueKind::Table,
        }
    }

    fn mismatch(&self, expected: ValueKind) -> TypeMismatch {
        TypeMismatch { expected, found: self.kind() }
    }

    pub fn as_str(&self) -> Result<&str, TypeMismatch> {
        match self { Value::String(s) => Ok(s), other => Err(other.mismatch(ValueKind::String)) }
    }

    pub fn as_integer(&self) -> Result<i64, TypeMismatch> {
        match self { Value::Integer(i) => Ok(*i), other => Err(other.mismatch(ValueKind::Integer)) }
    }

    /// Integers widen to floats; nothing else converts.
    pub fn as_float(&self) -> Result<f64, TypeMismatch> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Integer(i) => Ok(*i as f64),
            other => Err(other.mismatch(ValueKind::Float)),
        }
    }

    pub fn as_bool(&self) -> Result<bool, TypeMismatch> {
        match self { Value::Boolean(b) => Ok(*b), other => Err(other.mismatch(ValueKind::Boolean)) }
    }

    pub fn as_list(&self) -> Result<&[Value], TypeMismatch> {
        match self { Value::List(l) => Ok(l), other => Err(other.mismatch(ValueKind::List)) }
    }

    /// A list whose items are all strings. The first non-string item is reported.
    pub fn as_string_list(&self) -> Result<Vec<&str>, TypeMismatch> {
        self.as_list()?.iter().map(Value::as_str).collect()
    }

    pub fn is_table(&self) -> bool { matches!(self, Value::Table(_)) }

    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::String(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::String(s) }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self { Value::Integer(i) }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self { Value::Integer(i64::from(i)) }
}

impl From<u16> for Value {
    fn from(i: u16) -> Self { Value::Integer(i64::from(i)) }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self { Value::Float(f) }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Boolean(b) }
}

impl From<Vec<String>> for Value {
    fn from(l: Vec<String>) -> Self { Value::List(l.into_iter().map(Value::String).collect()) }
}

impl From<Vec<&str>> for Value {
    fn from(l: Vec<&str>) -> Self { Value::List(l.into_iter().map(Value::from).collect()) }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self { Value::List(l) }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self { Value::Table(t) }
}
