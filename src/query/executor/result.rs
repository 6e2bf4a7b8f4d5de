// Query Result Types
//
// Core value and row types flowing through query execution, plus the closed
// error enum shared by table loading, planning and execution.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// A single typed cell value.
///
/// The data model is deliberately small: 64-bit integers, 64-bit floats,
/// strings, booleans and SQL-style null. Integers and floats form one
/// numeric domain for comparison, arithmetic and grouping; every other
/// cross-kind combination is a type error.
///
/// The untagged serde form maps each variant onto the matching JSON scalar,
/// so rows read and write as plain JSON arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Short kind name used in error messages, matching the column kind
    /// vocabulary of the table format.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "bool",
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "str",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Compare two non-null values of comparable kinds.
    ///
    /// Integers and floats compare numerically with each other; texts and
    /// booleans only compare with their own kind. Returns `None` when the
    /// kinds cannot be compared, so the caller decides which error (or
    /// non-match) that turns into.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Float(b)) => Some(num_cmp(*a as f64, *b)),
            (Value::Float(a), Value::Integer(b)) => Some(num_cmp(*a, *b as f64)),
            (Value::Float(a), Value::Float(b)) => Some(num_cmp(*a, *b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order over all values, used for sorting.
    ///
    /// Null orders before everything else; across kinds the order is
    /// null, then booleans, then numerics, then texts.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Integer(a), Value::Float(b)) => num_cmp(*a as f64, *b),
            (Value::Float(a), Value::Integer(b)) => num_cmp(*a, *b as f64),
            (Value::Float(a), Value::Float(b)) => num_cmp(*a, *b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) | Value::Float(_) => 2,
            Value::Text(_) => 3,
        }
    }

    /// Canonical hashable form of the value, used for grouping and hash
    /// joins. Numerically equal integers and floats map to the same key,
    /// so `Integer(2)` and `Float(2.0)` land in the same group or bucket.
    pub fn group_key(&self) -> GroupKey {
        match self {
            Value::Null => GroupKey::Null,
            Value::Boolean(b) => GroupKey::Boolean(*b),
            Value::Integer(i) => GroupKey::Integer(*i),
            Value::Float(f) => {
                if f.is_nan() {
                    GroupKey::Float(f64::NAN.to_bits())
                } else if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < -(i64::MIN as f64) {
                    GroupKey::Integer(*f as i64)
                } else {
                    GroupKey::Float(f.to_bits())
                }
            }
            Value::Text(s) => GroupKey::Text(s.clone()),
        }
    }
}

/// Numeric comparison that still yields a total order for NaN: NaN ranks
/// above every number and equal to itself.
fn num_cmp(a: f64, b: f64) -> Ordering {
    match a.partial_cmp(&b) {
        Some(ord) => ord,
        None => a.is_nan().cmp(&b.is_nan()),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Canonical, hashable key derived from a [`Value`].
///
/// Floats with an exact 64-bit integer form collapse onto the integer
/// variant; other floats keep their bit pattern (NaN normalized to one
/// pattern). Null is its own key, so grouping treats nulls as equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(u64),
    Text(String),
}

/// A single row: one value per column, by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Row { values }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// New row holding this row's values followed by `other`'s. Joins use
    /// this to widen rows left-to-right.
    pub fn concat(&self, other: &Row) -> Row {
        let mut values = Vec::with_capacity(self.values.len() + other.values.len());
        values.extend_from_slice(&self.values);
        values.extend_from_slice(&other.values);
        Row { values }
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}

/// Errors surfaced while loading tables, planning a query or executing it.
///
/// The set is closed so hosts can match exhaustively and map every case to
/// their own reporting.
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("Unknown table name \"{0}\"")]
    UnknownTable(String),

    #[error("Column reference \"{0}\" does not exist")]
    UnresolvedColumn(String),

    /// The second field lists the candidate tables, already quoted and
    /// comma-separated, in from-clause order.
    #[error("Column reference \"{0}\" is ambiguous; present in multiple tables: {1}")]
    AmbiguousColumn(String, String),

    #[error("Incompatible types to \"{operator}\": {operands}")]
    TypeMismatch { operator: String, operands: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Integer overflow in \"{0}\"")]
    NumericOverflow(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("Cannot plan query: {0}")]
    PlanError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl QueryError {
    /// Type error for a binary operator, naming both operand kinds.
    pub fn type_mismatch(operator: impl Into<String>, left: &Value, right: &Value) -> Self {
        QueryError::TypeMismatch {
            operator: operator.into(),
            operands: format!("{} and {}", left.kind_name(), right.kind_name()),
        }
    }

    /// Type error for a single-operand context (unary minus, `not`,
    /// aggregate arguments).
    pub fn type_mismatch_single(operator: impl Into<String>, operand: &Value) -> Self {
        QueryError::TypeMismatch {
            operator: operator.into(),
            operands: operand.kind_name().to_string(),
        }
    }
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;
