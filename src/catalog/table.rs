// Table Representation
//
// This module defines the Table type: an immutable schema plus its rows.
// Tables are both the input relations a query runs over and the result a
// query produces.

use super::column::Column;
use crate::query::executor::result::{QueryError, QueryResult, Row};
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An in-memory relation: a column list and the rows beneath it.
///
/// The wire form is the table format's array shape: the first element is
/// the column list, every following element is one row.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Table { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Position of a column by name, if the table has it.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check the table's structural invariants: unique column names, every
    /// row as wide as the column list, every value legal for its column's
    /// kind. `name` identifies the table in error messages.
    pub fn validate(&self, name: &str) -> QueryResult<()> {
        for (index, column) in self.columns.iter().enumerate() {
            if self.columns[..index].iter().any(|c| c.name() == column.name()) {
                return Err(QueryError::InvalidArgument(format!(
                    "table \"{}\" declares column \"{}\" more than once",
                    name,
                    column.name()
                )));
            }
        }
        for (row_index, row) in self.rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(QueryError::InvalidArgument(format!(
                    "table \"{}\" row {} has {} values, expected {}",
                    name,
                    row_index,
                    row.len(),
                    self.columns.len()
                )));
            }
            for (column, value) in self.columns.iter().zip(row.values()) {
                if !column.data_type().accepts(value) {
                    return Err(QueryError::InvalidArgument(format!(
                        "table \"{}\" row {} holds a {} value in {} column \"{}\"",
                        name,
                        row_index,
                        value.kind_name(),
                        column.data_type(),
                        column.name()
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len() + 1))?;
        seq.serialize_element(&self.columns)?;
        for row in &self.rows {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Table {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = Table;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "an array holding the column list and then one array per row")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Table, A::Error> {
                let columns: Vec<Column> = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let mut rows = Vec::new();
                while let Some(row) = seq.next_element::<Row>()? {
                    rows.push(row);
                }
                Ok(Table { columns, rows })
            }
        }

        deserializer.deserialize_seq(TableVisitor)
    }
}
