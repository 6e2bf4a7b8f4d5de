// Query Processing Module
//
// This module contains everything between the wire-format AST and the
// result table: query planning and execution.

// Re-export key components
pub mod ast;
pub mod executor;
pub mod planner;

// Export key public interfaces
pub use ast::Query;
pub use executor::engine::ExecutionEngine;
pub use executor::result::QueryResult;
pub use planner::Planner;
