// SQL Evaluation Engine
//
// An embeddable, in-memory relational query engine: a pre-parsed query AST
// is compiled into a tree of pull-based operators and executed against a
// catalog of immutable tables to produce one result table.

pub mod catalog;
pub mod query;
pub mod storage;

// Re-export key items for convenient access
pub use catalog::Catalog;
pub use catalog::Column;
pub use catalog::DataType;
pub use catalog::Table;
pub use query::ast::Query;
pub use query::executor::engine::ExecutionEngine;
pub use query::executor::result::{QueryError, QueryResult, Row, Value};
pub use query::planner::Planner;
pub use storage::TableStore;
