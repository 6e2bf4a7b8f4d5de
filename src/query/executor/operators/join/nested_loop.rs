// Nested Loop Join Implementation
//
// Pairs every left row with every right row and keeps the pairs the join
// condition accepts. Works for any condition at O(n*m) cost; without a
// condition it degenerates into the plain cross product.
//
// The right side is materialized once during init() so the left side is
// pulled through exactly once, in order.

use crate::query::executor::eval;
use crate::query::executor::operators::{BoxedOperator, Operator};
use crate::query::executor::result::{QueryError, QueryResult, Row};
use crate::query::executor::result::Value;
use crate::query::planner::bound::{BoundExpr, RowLayout};

pub struct NestedLoopJoinOperator {
    left: BoxedOperator,
    right: BoxedOperator,
    /// Join condition over the combined row; `None` means cross join.
    condition: Option<BoundExpr>,
    layout: RowLayout,
    right_rows: Vec<Row>,
    current_left: Option<Row>,
    right_cursor: usize,
    initialized: bool,
}

impl NestedLoopJoinOperator {
    pub fn new(
        left: BoxedOperator,
        right: BoxedOperator,
        condition: Option<BoundExpr>,
        layout: RowLayout,
    ) -> Self {
        NestedLoopJoinOperator {
            left,
            right,
            condition,
            layout,
            right_rows: Vec::new(),
            current_left: None,
            right_cursor: 0,
            initialized: false,
        }
    }

    /// Whether the condition accepts this pair. Rows whose join keys are
    /// not comparable simply never pair up, matching what an equality
    /// lookup over hashed keys would produce.
    fn accepts(&self, combined: &Row) -> QueryResult<bool> {
        let condition = match &self.condition {
            Some(condition) => condition,
            None => return Ok(true),
        };
        match eval::evaluate(condition, &self.layout, combined) {
            Ok(Value::Boolean(accepted)) => Ok(accepted),
            Ok(_) => Ok(false),
            Err(QueryError::TypeMismatch { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

impl Operator for NestedLoopJoinOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.left.init()?;
        self.right.init()?;
        self.right_rows.clear();
        while let Some(row) = self.right.next()? {
            self.right_rows.push(row);
        }
        self.current_left = self.left.next()?;
        self.right_cursor = 0;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            return Err(QueryError::Internal(
                "nested loop join used before init".into(),
            ));
        }
        loop {
            let left = match &self.current_left {
                Some(row) => row,
                None => return Ok(None),
            };
            match self.right_rows.get(self.right_cursor) {
                Some(right) => {
                    self.right_cursor += 1;
                    let combined = left.concat(right);
                    if self.accepts(&combined)? {
                        return Ok(Some(combined));
                    }
                }
                None => {
                    self.current_left = self.left.next()?;
                    self.right_cursor = 0;
                }
            }
        }
    }

    fn close(&mut self) -> QueryResult<()> {
        self.right_rows.clear();
        self.current_left = None;
        self.initialized = false;
        self.left.close()?;
        self.right.close()
    }
}
