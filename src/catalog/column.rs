// Column Definitions
//
// This module defines the Column type describing one table column.

use super::schema::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One column of a table: a name plus a declared kind.
///
/// In the table format a column is the two-element array
/// `["name", "kind"]`, which the tuple-based serde form mirrors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, DataType)", into = "(String, DataType)")]
pub struct Column {
    name: String,
    data_type: DataType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Column {
            name: name.into(),
            data_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}

impl From<(String, DataType)> for Column {
    fn from((name, data_type): (String, DataType)) -> Self {
        Column { name, data_type }
    }
}

impl From<Column> for (String, DataType) {
    fn from(column: Column) -> Self {
        (column.name, column.data_type)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)
    }
}
