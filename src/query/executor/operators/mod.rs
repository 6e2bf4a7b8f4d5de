// Query Operators Module
//
// This module defines the operators compiled plans execute with. Operators
// follow a pull model: init() prepares the operator, each next() call
// yields one row or None once exhausted, close() releases state. Blocking
// operators (sort, aggregation, hash join builds) drain their input during
// init() and replay from memory.

// Re-export public components
pub mod aggregate;
pub mod filter;
pub mod join;
pub mod limit;
pub mod project;
pub mod scan;
pub mod sort;

pub use self::aggregate::AggregateOperator;
pub use self::filter::FilterOperator;
pub use self::join::{HashJoinOperator, NestedLoopJoinOperator};
pub use self::limit::LimitOperator;
pub use self::project::ProjectOperator;
pub use self::scan::ScanOperator;
pub use self::sort::SortOperator;

use crate::query::executor::result::{QueryResult, Row};

/// Interface implemented by every execution operator.
///
/// Callers must init() before the first next(); calling out of order is an
/// internal error, not a panic.
pub trait Operator: Send {
    /// Prepare the operator (and its inputs) for row production.
    fn init(&mut self) -> QueryResult<()>;

    /// Produce the next row, or None when exhausted.
    fn next(&mut self) -> QueryResult<Option<Row>>;

    /// Release per-query state once the caller is done pulling rows.
    fn close(&mut self) -> QueryResult<()>;
}

/// Owned node of an operator tree.
pub type BoxedOperator = Box<dyn Operator>;
