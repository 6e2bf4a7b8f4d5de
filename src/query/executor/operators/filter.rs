// Filter Operator
//
// Drops rows whose predicate does not come out true. A null predicate
// result drops the row like false does; a non-boolean result is a type
// error, since the predicate was supposed to be a condition.

use crate::query::executor::eval;
use crate::query::executor::operators::{BoxedOperator, Operator};
use crate::query::executor::result::{QueryError, QueryResult, Row, Value};
use crate::query::planner::bound::{BoundExpr, RowLayout};

pub struct FilterOperator {
    input: BoxedOperator,
    predicate: BoundExpr,
    layout: RowLayout,
    initialized: bool,
}

impl FilterOperator {
    pub fn new(input: BoxedOperator, predicate: BoundExpr, layout: RowLayout) -> Self {
        FilterOperator {
            input,
            predicate,
            layout,
            initialized: false,
        }
    }
}

impl Operator for FilterOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.input.init()?;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            return Err(QueryError::Internal(
                "filter operator used before init".into(),
            ));
        }
        while let Some(row) = self.input.next()? {
            match eval::evaluate(&self.predicate, &self.layout, &row)? {
                Value::Boolean(true) => return Ok(Some(row)),
                Value::Boolean(false) | Value::Null => continue,
                other => {
                    return Err(QueryError::type_mismatch_single("where", &other));
                }
            }
        }
        Ok(None)
    }

    fn close(&mut self) -> QueryResult<()> {
        self.initialized = false;
        self.input.close()
    }
}
