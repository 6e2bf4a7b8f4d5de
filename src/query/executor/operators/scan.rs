// Table Scan Operator
//
// Produces the rows of a catalog table in storage order.

use crate::catalog::Table;
use crate::query::executor::operators::Operator;
use crate::query::executor::result::{QueryError, QueryResult, Row};
use std::sync::Arc;

/// Reads a table front to back, cloning one row per next() call.
pub struct ScanOperator {
    table: Arc<Table>,
    cursor: usize,
    initialized: bool,
}

impl ScanOperator {
    pub fn new(table: Arc<Table>) -> Self {
        ScanOperator {
            table,
            cursor: 0,
            initialized: false,
        }
    }
}

impl Operator for ScanOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.cursor = 0;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            return Err(QueryError::Internal(
                "scan operator used before init".into(),
            ));
        }
        match self.table.row(self.cursor) {
            Some(row) => {
                self.cursor += 1;
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    fn close(&mut self) -> QueryResult<()> {
        self.initialized = false;
        Ok(())
    }
}
