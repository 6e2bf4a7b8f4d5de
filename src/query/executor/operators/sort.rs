// Sort Operator
//
// Blocking stable sort over the input's output columns. Keys apply in
// listed order as tie-breaks; nulls order first ascending and last
// descending, per the value model's total order.

use crate::query::executor::operators::{BoxedOperator, Operator};
use crate::query::executor::result::{QueryError, QueryResult, Row, Value};
use std::cmp::Ordering;

/// One sort key: an output column position plus a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: usize,
    pub descending: bool,
}

pub struct SortOperator {
    input: BoxedOperator,
    keys: Vec<SortKey>,
    output: Option<std::vec::IntoIter<Row>>,
    initialized: bool,
}

impl SortOperator {
    pub fn new(input: BoxedOperator, keys: Vec<SortKey>) -> Self {
        SortOperator {
            input,
            keys,
            output: None,
            initialized: false,
        }
    }
}

impl Operator for SortOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.input.init()?;
        let mut rows = Vec::new();
        while let Some(row) = self.input.next()? {
            rows.push(row);
        }
        // sort_by is stable, so equal keys keep their arrival order
        rows.sort_by(|a, b| compare_rows(a, b, &self.keys));
        self.output = Some(rows.into_iter());
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            return Err(QueryError::Internal(
                "sort operator used before init".into(),
            ));
        }
        Ok(self.output.as_mut().and_then(|rows| rows.next()))
    }

    fn close(&mut self) -> QueryResult<()> {
        self.output = None;
        self.initialized = false;
        self.input.close()
    }
}

fn compare_rows(a: &Row, b: &Row, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let left = a.get(key.column).unwrap_or(&Value::Null);
        let right = b.get(key.column).unwrap_or(&Value::Null);
        let mut ordering = left.total_cmp(right);
        if key.descending {
            ordering = ordering.reverse();
        }
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
