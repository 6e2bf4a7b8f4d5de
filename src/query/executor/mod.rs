// Query Executor Module
//
// This module is responsible for executing compiled plans and producing
// result tables. It implements the pull-based execution model.

// Re-export public components
pub mod engine;
pub mod eval;
pub mod operators;
pub mod result;

// Export key types
pub use self::engine::ExecutionEngine;
pub use self::operators::Operator;
pub use self::result::QueryResult;
