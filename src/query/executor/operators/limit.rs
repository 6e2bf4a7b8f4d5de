// Limit Operator
//
// Caps the number of rows flowing past. Once the cap is hit, next() stops
// pulling from the input entirely.

use crate::query::executor::operators::{BoxedOperator, Operator};
use crate::query::executor::result::{QueryError, QueryResult, Row};

pub struct LimitOperator {
    input: BoxedOperator,
    limit: usize,
    yielded: usize,
    initialized: bool,
}

impl LimitOperator {
    pub fn new(input: BoxedOperator, limit: usize) -> Self {
        LimitOperator {
            input,
            limit,
            yielded: 0,
            initialized: false,
        }
    }
}

impl Operator for LimitOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.input.init()?;
        self.yielded = 0;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            return Err(QueryError::Internal(
                "limit operator used before init".into(),
            ));
        }
        if self.yielded >= self.limit {
            return Ok(None);
        }
        match self.input.next()? {
            Some(row) => {
                self.yielded += 1;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    fn close(&mut self) -> QueryResult<()> {
        self.initialized = false;
        self.input.close()
    }
}
