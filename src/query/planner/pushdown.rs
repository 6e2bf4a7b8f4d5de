// Predicate Pushdown
//
// Splits a bound where-clause into its top-level conjuncts and sorts each
// by the tables it touches. Conjuncts over a single table run directly
// above that table's scan, before any join multiplies the row count; the
// rest are conjoined back into one residual filter above the join chain.
// Disjunctions are never split, so pushdown cannot change which rows pass.

use crate::query::ast::BinaryOp;
use crate::query::planner::bound::BoundExpr;

/// Where each conjunct of the where-clause will be evaluated.
#[derive(Debug)]
pub struct SplitPredicate {
    /// Conjuncts over exactly one table, indexed by that table.
    pub per_table: Vec<Vec<BoundExpr>>,
    /// Conjuncts over several tables or none, kept above the join chain.
    pub residual: Vec<BoundExpr>,
}

/// Flatten top-level `and` nodes into `out`, preserving left-to-right
/// order. Anything else, `or` included, stays whole.
pub fn split_conjuncts(expr: BoundExpr, out: &mut Vec<BoundExpr>) {
    match expr {
        BoundExpr::Binary { op: BinaryOp::And, left, right } => {
            split_conjuncts(*left, out);
            split_conjuncts(*right, out);
        }
        other => out.push(other),
    }
}

/// Assign each conjunct its evaluation site.
pub fn classify(conjuncts: Vec<BoundExpr>, table_count: usize) -> SplitPredicate {
    let mut per_table: Vec<Vec<BoundExpr>> = vec![Vec::new(); table_count];
    let mut residual = Vec::new();
    for conjunct in conjuncts {
        let mut tables = conjunct.tables().into_iter();
        match (tables.next(), tables.next()) {
            (Some(table), None) => per_table[table].push(conjunct),
            _ => residual.push(conjunct),
        }
    }
    SplitPredicate { per_table, residual }
}

/// Rebuild one predicate from a conjunct list. `None` when the list is
/// empty, the single conjunct unchanged, a left-leaning `and` chain
/// otherwise.
pub fn conjoin(conjuncts: Vec<BoundExpr>) -> Option<BoundExpr> {
    conjuncts.into_iter().reduce(|left, right| BoundExpr::Binary {
        op: BinaryOp::And,
        left: Box::new(left),
        right: Box::new(right),
    })
}
