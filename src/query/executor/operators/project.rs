// Projection Operator
//
// Maps each input row onto the output row shape: one evaluated expression
// per output column.

use crate::query::executor::eval;
use crate::query::executor::operators::{BoxedOperator, Operator};
use crate::query::executor::result::{QueryError, QueryResult, Row};
use crate::query::planner::bound::{BoundExpr, RowLayout};

pub struct ProjectOperator {
    input: BoxedOperator,
    expressions: Vec<BoundExpr>,
    layout: RowLayout,
    initialized: bool,
}

impl ProjectOperator {
    pub fn new(input: BoxedOperator, expressions: Vec<BoundExpr>, layout: RowLayout) -> Self {
        ProjectOperator {
            input,
            expressions,
            layout,
            initialized: false,
        }
    }
}

impl Operator for ProjectOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.input.init()?;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            return Err(QueryError::Internal(
                "project operator used before init".into(),
            ));
        }
        match self.input.next()? {
            Some(row) => {
                let mut values = Vec::with_capacity(self.expressions.len());
                for expression in &self.expressions {
                    values.push(eval::evaluate(expression, &self.layout, &row)?);
                }
                Ok(Some(Row::new(values)))
            }
            None => Ok(None),
        }
    }

    fn close(&mut self) -> QueryResult<()> {
        self.initialized = false;
        self.input.close()
    }
}
