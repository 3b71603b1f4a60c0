//! Cell value types
//!
//! A cell holds exactly one of a small closed set of types, or is null.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single cell value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// 32-bit integer, stored in `int32` columns
    Int(i32),
    /// String value, stored in `string` columns
    Text(String),
    /// Boolean value, stored in `bool` columns
    Bool(bool),
}

impl Value {
    /// Get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as an i32
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int32",
            Value::Text(_) => "string",
            Value::Bool(_) => "bool",
        }
    }

    /// True when both values carry the same variant, ignoring the payload
    pub fn same_variant(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// A row of results (column name -> value mapping)
pub type DatabaseRow = HashMap<String, Value>;

/// Multiple rows returned from a select, in storage order
pub type DatabaseResult = Vec<DatabaseRow>;

/// Build a [`DatabaseRow`] from `(column, value)` pairs.
///
/// ```
/// use rust_table_store::{row, Value};
///
/// let r = row([("id", Value::Int(1)), ("name", "Alice".into())]);
/// assert_eq!(r["name"], Value::Text("Alice".into()));
/// ```
pub fn row<K, V, I>(pairs: I) -> DatabaseRow
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
