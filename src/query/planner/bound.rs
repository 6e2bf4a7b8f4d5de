// Bound Expressions
//
// Expression trees after column resolution. Every column reference has
// been replaced by a (table index, column index) pair, so evaluation works
// purely on row positions and never sees a name again.

use crate::query::ast::{BinaryOp, UnaryOp};
use crate::query::executor::result::{QueryError, QueryResult, Value};
use std::collections::HashSet;
use std::fmt;

/// An expression whose column references are resolved to positions.
///
/// Function calls never appear here: the planner lifts aggregate calls out
/// of the select list before binding and rejects calls anywhere else.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundExpr {
    Literal(Value),
    Column {
        table: usize,
        column: usize,
    },
    Binary {
        op: BinaryOp,
        left: Box<BoundExpr>,
        right: Box<BoundExpr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<BoundExpr>,
    },
    IsNull {
        operand: Box<BoundExpr>,
        negated: bool,
    },
}

impl BoundExpr {
    /// Collect the table indexes this expression touches into `out`.
    pub fn collect_tables(&self, out: &mut HashSet<usize>) {
        match self {
            BoundExpr::Literal(_) => {}
            BoundExpr::Column { table, .. } => {
                out.insert(*table);
            }
            BoundExpr::Binary { left, right, .. } => {
                left.collect_tables(out);
                right.collect_tables(out);
            }
            BoundExpr::Unary { operand, .. } => operand.collect_tables(out),
            BoundExpr::IsNull { operand, .. } => operand.collect_tables(out),
        }
    }

    /// The set of table indexes this expression touches.
    pub fn tables(&self) -> HashSet<usize> {
        let mut out = HashSet::new();
        self.collect_tables(&mut out);
        out
    }

    fn fmt_operand(expr: &BoundExpr, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if matches!(expr, BoundExpr::Binary { .. }) {
            write!(f, "({})", expr)
        } else {
            write!(f, "{}", expr)
        }
    }
}

impl fmt::Display for BoundExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundExpr::Literal(value) => write!(f, "{}", value),
            BoundExpr::Column { table, column } => write!(f, "#{}.{}", table, column),
            BoundExpr::Binary { op, left, right } => {
                BoundExpr::fmt_operand(left, f)?;
                write!(f, " {} ", op)?;
                BoundExpr::fmt_operand(right, f)
            }
            BoundExpr::Unary { op: UnaryOp::Not, operand } => {
                write!(f, "not ")?;
                BoundExpr::fmt_operand(operand, f)
            }
            BoundExpr::Unary { op: UnaryOp::Neg, operand } => {
                write!(f, "-")?;
                BoundExpr::fmt_operand(operand, f)
            }
            BoundExpr::IsNull { operand, negated } => {
                BoundExpr::fmt_operand(operand, f)?;
                write!(f, " is {}null", if *negated { "not " } else { "" })
            }
        }
    }
}

/// Maps a bound column's (table, column) pair to its position in the rows
/// a particular operator sees.
///
/// Rows widen left-to-right as the join chain grows, so each operator gets
/// a layout describing exactly the tables present in its input rows. A
/// filter pushed beneath the chain sees a single table's own rows; the
/// post-join filter sees all of them concatenated.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    offsets: Vec<Option<usize>>,
    width: usize,
}

impl RowLayout {
    /// Layout over the first `visible` tables, concatenated in from-clause
    /// order. `widths` lists every bound table's column count.
    pub fn prefix(widths: &[usize], visible: usize) -> Self {
        let mut offsets = vec![None; widths.len()];
        let mut at = 0;
        for (index, width) in widths.iter().take(visible).enumerate() {
            offsets[index] = Some(at);
            at += width;
        }
        RowLayout {
            offsets,
            width: at,
        }
    }

    /// Layout over one table's own rows, as a pushed-down filter sees them.
    pub fn single(table_count: usize, table: usize, width: usize) -> Self {
        let mut offsets = vec![None; table_count];
        if let Some(offset) = offsets.get_mut(table) {
            *offset = Some(0);
        }
        RowLayout { offsets, width }
    }

    /// Row position of `column` within `table`, or an internal error when
    /// the table is not part of this layout's rows.
    pub fn slot(&self, table: usize, column: usize) -> QueryResult<usize> {
        match self.offsets.get(table).copied().flatten() {
            Some(base) => Ok(base + column),
            None => Err(QueryError::Internal(format!(
                "table #{} is not visible at this point of the plan",
                table
            ))),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }
}
