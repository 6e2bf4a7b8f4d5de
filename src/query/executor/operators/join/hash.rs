// Hash Join Implementation
//
// Equality join: one side is drained into a hash table keyed by its join
// expression, the other side probes it. Keys hash through GroupKey, so an
// integer on one side matches the equal float on the other, null keys
// match nothing, and keys the expression cannot produce for a row simply
// exclude that row.
//
// Output order is pinned to left-row-major regardless of which side is
// built: with the right side built the left streams and probes directly;
// with the left side built the probe happens during init() and matches
// are collected per left row, then replayed in left order.

use crate::query::executor::eval;
use crate::query::executor::operators::{BoxedOperator, Operator};
use crate::query::executor::result::{GroupKey, QueryError, QueryResult, Row, Value};
use crate::query::planner::bound::{BoundExpr, RowLayout};
use std::collections::HashMap;

/// Join key for one row, or `None` when the row can never match: a null
/// key, or a key expression that is not defined for this row's types.
fn join_key(expr: &BoundExpr, layout: &RowLayout, row: &Row) -> QueryResult<Option<GroupKey>> {
    match eval::evaluate(expr, layout, row) {
        Ok(Value::Null) => Ok(None),
        Ok(value) => Ok(Some(value.group_key())),
        Err(QueryError::TypeMismatch { .. }) => Ok(None),
        Err(err) => Err(err),
    }
}

enum State {
    Idle,
    /// Right side built; left rows stream through and probe.
    Streaming {
        table: HashMap<GroupKey, Vec<Row>>,
        matches: Vec<Row>,
        match_index: usize,
    },
    /// Left side built; all output rows were produced during init().
    Drained(std::vec::IntoIter<Row>),
}

pub struct HashJoinOperator {
    left: BoxedOperator,
    right: BoxedOperator,
    /// Build the left side instead of the right. The planner picks the
    /// smaller side by estimated row count.
    build_left: bool,
    left_key: BoundExpr,
    left_layout: RowLayout,
    right_key: BoundExpr,
    right_layout: RowLayout,
    state: State,
    initialized: bool,
}

impl HashJoinOperator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        left: BoxedOperator,
        right: BoxedOperator,
        build_left: bool,
        left_key: BoundExpr,
        left_layout: RowLayout,
        right_key: BoundExpr,
        right_layout: RowLayout,
    ) -> Self {
        HashJoinOperator {
            left,
            right,
            build_left,
            left_key,
            left_layout,
            right_key,
            right_layout,
            state: State::Idle,
            initialized: false,
        }
    }

    fn build_right_table(&mut self) -> QueryResult<HashMap<GroupKey, Vec<Row>>> {
        let mut table: HashMap<GroupKey, Vec<Row>> = HashMap::new();
        while let Some(row) = self.right.next()? {
            if let Some(key) = join_key(&self.right_key, &self.right_layout, &row)? {
                table.entry(key).or_default().push(row);
            }
        }
        Ok(table)
    }

    /// Build-left mode runs to completion here: the left side is hashed,
    /// the right side probes it, and every match lands in its left row's
    /// bucket so the flattened output stays in left order.
    fn drain_with_left_built(&mut self) -> QueryResult<Vec<Row>> {
        let mut rows: Vec<Row> = Vec::new();
        let mut index: HashMap<GroupKey, Vec<usize>> = HashMap::new();
        while let Some(row) = self.left.next()? {
            if let Some(key) = join_key(&self.left_key, &self.left_layout, &row)? {
                index.entry(key).or_default().push(rows.len());
                rows.push(row);
            }
        }
        let mut per_left: Vec<Vec<Row>> = vec![Vec::new(); rows.len()];
        while let Some(right) = self.right.next()? {
            let key = match join_key(&self.right_key, &self.right_layout, &right)? {
                Some(key) => key,
                None => continue,
            };
            if let Some(bucket) = index.get(&key) {
                for &at in bucket {
                    per_left[at].push(rows[at].concat(&right));
                }
            }
        }
        Ok(per_left.into_iter().flatten().collect())
    }
}

impl Operator for HashJoinOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.left.init()?;
        self.right.init()?;
        self.state = if self.build_left {
            State::Drained(self.drain_with_left_built()?.into_iter())
        } else {
            State::Streaming {
                table: self.build_right_table()?,
                matches: Vec::new(),
                match_index: 0,
            }
        };
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            return Err(QueryError::Internal("hash join used before init".into()));
        }
        match &mut self.state {
            State::Idle => Err(QueryError::Internal("hash join used before init".into())),
            State::Drained(output) => Ok(output.next()),
            State::Streaming {
                table,
                matches,
                match_index,
            } => loop {
                if let Some(row) = matches.get(*match_index) {
                    *match_index += 1;
                    return Ok(Some(row.clone()));
                }
                let left = match self.left.next()? {
                    Some(row) => row,
                    None => return Ok(None),
                };
                if let Some(key) = join_key(&self.left_key, &self.left_layout, &left)? {
                    if let Some(bucket) = table.get(&key) {
                        *matches = bucket.iter().map(|right| left.concat(right)).collect();
                        *match_index = 0;
                    }
                }
            },
        }
    }

    fn close(&mut self) -> QueryResult<()> {
        self.state = State::Idle;
        self.initialized = false;
        self.left.close()?;
        self.right.close()
    }
}
