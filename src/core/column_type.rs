//! Column type definitions
//!
//! Column types are free-form strings at the storage layer. Only `int32`,
//! `string` and `bool` are interpreted for typed validation.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::DatabaseError;
use super::value::Value;

/// Declared type of a column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// `int32`, holds [`Value::Int`]
    Int32,
    /// `string`, holds [`Value::Text`]
    String,
    /// `bool`, holds [`Value::Bool`]
    Bool,
    /// Any other type name; not interpreted, accepts every value
    Other(String),
}

impl ColumnType {
    /// Convert column type to its textual form
    pub fn as_str(&self) -> &str {
        match self {
            ColumnType::Int32 => "int32",
            ColumnType::String => "string",
            ColumnType::Bool => "bool",
            ColumnType::Other(name) => name,
        }
    }

    /// Check whether a value may be stored in a column of this type.
    ///
    /// Null is accepted here; nullability is a separate constraint.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (ColumnType::Int32, Value::Int(_))
                | (ColumnType::String, Value::Text(_))
                | (ColumnType::Bool, Value::Bool(_))
                | (ColumnType::Other(_), _)
        )
    }

    /// Check if the engine validates values against this type
    pub fn is_interpreted(&self) -> bool {
        !matches!(self, ColumnType::Other(_))
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(DatabaseError::schema("column type is empty")),
            "int32" => Ok(ColumnType::Int32),
            "string" => Ok(ColumnType::String),
            "bool" => Ok(ColumnType::Bool),
            other => Ok(ColumnType::Other(other.to_string())),
        }
    }
}
