// Column Kinds
//
// This module defines the data types a table column can declare.

use crate::query::executor::result::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Data types a column can declare in the table format.
///
/// The serde form is the lowercase kind tag used in table files:
/// `"int"`, `"float"`, `"str"` and `"bool"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int,
    Float,
    Str,
    Bool,
}

impl DataType {
    /// The kind tag as written in table files.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Str => "str",
            DataType::Bool => "bool",
        }
    }

    /// Whether a value may be stored in a column of this kind.
    ///
    /// Null is allowed everywhere. Float columns also accept integer
    /// values, since JSON cannot distinguish `2` from `2.0` reliably.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (DataType::Int, Value::Integer(_)) => true,
            (DataType::Float, Value::Float(_) | Value::Integer(_)) => true,
            (DataType::Str, Value::Text(_)) => true,
            (DataType::Bool, Value::Boolean(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
