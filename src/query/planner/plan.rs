// Physical Query Plan
//
// The compiled form of a query: a tree of operator descriptions with every
// expression bound and every layout fixed. The planner builds it, the
// operator builder turns it into runnable operators, and nothing mutates
// it in between.

use crate::catalog::Table;
use crate::query::executor::operators::aggregate::{AggregateOutput, AggregateSpec};
use crate::query::executor::operators::sort::SortKey;
use crate::query::planner::bound::{BoundExpr, RowLayout};
use std::fmt;
use std::sync::Arc;

/// One node of the compiled plan. Children are owned; the tree is built
/// once per evaluation and consumed by the operator builder.
#[derive(Debug)]
pub enum Plan {
    Scan {
        binding: String,
        table: Arc<Table>,
    },
    Filter {
        input: Box<Plan>,
        predicate: BoundExpr,
        layout: RowLayout,
    },
    Project {
        input: Box<Plan>,
        expressions: Vec<BoundExpr>,
        layout: RowLayout,
    },
    NestedLoopJoin {
        left: Box<Plan>,
        right: Box<Plan>,
        /// `None` is the plain cross product.
        condition: Option<BoundExpr>,
        layout: RowLayout,
    },
    HashJoin {
        left: Box<Plan>,
        right: Box<Plan>,
        build_left: bool,
        left_key: BoundExpr,
        left_layout: RowLayout,
        right_key: BoundExpr,
        right_layout: RowLayout,
    },
    Aggregate {
        input: Box<Plan>,
        group_exprs: Vec<BoundExpr>,
        aggregates: Vec<AggregateSpec>,
        output: Vec<AggregateOutput>,
        layout: RowLayout,
    },
    Sort {
        input: Box<Plan>,
        keys: Vec<SortKey>,
    },
    Limit {
        input: Box<Plan>,
        count: usize,
    },
}

impl Plan {
    /// Estimated output row count, used to pick the build side of a hash
    /// join. Scans are exact; filters inherit their input (selectivity is
    /// not modeled); joins multiply; aggregation output is unknown.
    pub fn estimated_rows(&self) -> Option<usize> {
        match self {
            Plan::Scan { table, .. } => Some(table.row_count()),
            Plan::Filter { input, .. } | Plan::Project { input, .. } => input.estimated_rows(),
            Plan::NestedLoopJoin { left, right, .. } | Plan::HashJoin { left, right, .. } => {
                match (left.estimated_rows(), right.estimated_rows()) {
                    (Some(l), Some(r)) => l.checked_mul(r),
                    _ => None,
                }
            }
            Plan::Aggregate { .. } => None,
            Plan::Sort { input, .. } => input.estimated_rows(),
            Plan::Limit { input, count } => input.estimated_rows().map(|rows| rows.min(*count)),
        }
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match self {
            Plan::Scan { binding, table } => {
                writeln!(f, "{}Scan: {} ({} rows)", pad, binding, table.row_count())
            }
            Plan::Filter { input, predicate, .. } => {
                writeln!(f, "{}Filter: {}", pad, predicate)?;
                input.fmt_node(f, depth + 1)
            }
            Plan::Project { input, expressions, .. } => {
                let list = expressions
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(f, "{}Project: {}", pad, list)?;
                input.fmt_node(f, depth + 1)
            }
            Plan::NestedLoopJoin { left, right, condition, .. } => {
                match condition {
                    Some(condition) => writeln!(f, "{}NestedLoopJoin: {}", pad, condition)?,
                    None => writeln!(f, "{}CrossJoin", pad)?,
                }
                left.fmt_node(f, depth + 1)?;
                right.fmt_node(f, depth + 1)
            }
            Plan::HashJoin { left, right, build_left, left_key, right_key, .. } => {
                writeln!(
                    f,
                    "{}HashJoin (build {}): {} = {}",
                    pad,
                    if *build_left { "left" } else { "right" },
                    left_key,
                    right_key
                )?;
                left.fmt_node(f, depth + 1)?;
                right.fmt_node(f, depth + 1)
            }
            Plan::Aggregate { input, group_exprs, aggregates, .. } => {
                let list = aggregates
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{}Aggregate: [{}]", pad, list)?;
                if !group_exprs.is_empty() {
                    let keys = group_exprs
                        .iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    write!(f, " group by [{}]", keys)?;
                }
                writeln!(f)?;
                input.fmt_node(f, depth + 1)
            }
            Plan::Sort { input, keys } => {
                let list = keys
                    .iter()
                    .map(|key| {
                        format!("#{}{}", key.column, if key.descending { " desc" } else { "" })
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(f, "{}Sort: {}", pad, list)?;
                input.fmt_node(f, depth + 1)
            }
            Plan::Limit { input, count } => {
                writeln!(f, "{}Limit: {}", pad, count)?;
                input.fmt_node(f, depth + 1)
            }
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(f, 0)
    }
}
