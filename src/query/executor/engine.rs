// Query Execution Engine
//
// Drives a compiled plan to completion: the root operator is initialized,
// pulled until exhausted, and closed, and the collected rows are paired
// with the compiled output schema. Any error from an operator aborts the
// run; a query never yields a partial result.

use crate::catalog::{Catalog, Table};
use crate::query::ast::Query;
use crate::query::executor::result::QueryResult;
use crate::query::planner::{builder, CompiledQuery, Planner};
use log::info;

/// Evaluates queries against one catalog of loaded tables.
pub struct ExecutionEngine<'a> {
    catalog: &'a Catalog,
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        ExecutionEngine { catalog }
    }

    /// Compile and run `query`, producing its result table.
    pub fn execute(&self, query: &Query) -> QueryResult<Table> {
        let compiled = Planner::new(self.catalog).compile(query)?;
        Self::execute_compiled(compiled)
    }

    /// Run an already compiled query.
    pub fn execute_compiled(compiled: CompiledQuery) -> QueryResult<Table> {
        let (columns, plan) = compiled.into_parts();
        let mut root = builder::build(plan);
        root.init()?;
        let mut rows = Vec::new();
        while let Some(row) = root.next()? {
            rows.push(row);
        }
        root.close()?;
        info!("query produced {} rows over {} columns", rows.len(), columns.len());
        Ok(Table::new(columns, rows))
    }
}
