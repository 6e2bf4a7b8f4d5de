// Query Planner Module
//
// Compiles the wire-format AST into an executable plan. Planning binds the
// from-clause, resolves every column reference to a row position, pushes
// single-table where-conjuncts beneath the join chain, turns join
// equalities into hash joins, and shapes the select list into a projection
// or an aggregation. Everything structural is validated here, so execution
// only ever sees well-formed plans.

pub mod bound;
pub mod builder;
pub mod plan;
pub mod pushdown;
pub mod scope;

pub use self::plan::Plan;
pub use self::scope::Scope;

use crate::catalog::{Catalog, Column, DataType};
use crate::query::ast::{
    BinaryOp, ColumnRef, Direction, Expr, JoinKind, OrderKey, Query, SelectItem, TableRef,
    UnaryOp, WhereClause,
};
use crate::query::executor::operators::aggregate::{
    AggregateFunction, AggregateOutput, AggregateSpec,
};
use crate::query::executor::operators::sort::SortKey;
use crate::query::executor::result::{QueryError, QueryResult, Value};
use crate::query::planner::bound::{BoundExpr, RowLayout};
use crate::query::planner::pushdown::SplitPredicate;
use crate::query::planner::scope::Binding;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::mem;
use std::sync::Arc;

/// A query ready to run: the output schema plus the plan that produces it.
#[derive(Debug)]
pub struct CompiledQuery {
    columns: Vec<Column>,
    plan: Plan,
}

impl CompiledQuery {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn into_parts(self) -> (Vec<Column>, Plan) {
        (self.columns, self.plan)
    }
}

/// Compiles queries against one catalog of tables.
pub struct Planner<'a> {
    catalog: &'a Catalog,
}

impl<'a> Planner<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Planner { catalog }
    }

    pub fn compile(&self, query: &Query) -> QueryResult<CompiledQuery> {
        if query.select.is_empty() {
            return Err(QueryError::PlanError("the select list is empty".into()));
        }
        if query.from.is_empty() {
            return Err(QueryError::PlanError("the from clause is empty".into()));
        }
        let limit = match query.limit {
            Some(count) if count < 0 => {
                return Err(QueryError::InvalidArgument(format!(
                    "limit must not be negative, got {}",
                    count
                )));
            }
            other => other.map(|count| count as usize),
        };

        // bind every from-clause source under its binding name
        let mut scope = Scope::new();
        for table_ref in &query.from {
            let table = self
                .catalog
                .get(&table_ref.source)
                .ok_or_else(|| QueryError::UnknownTable(table_ref.source.clone()))?;
            scope.bind(table_ref.binding().to_string(), table)?;
        }
        let widths = scope.widths();
        let table_count = scope.len();

        // validate the join shape and bind each condition while the
        // resolution horizon still matches the growing chain
        if let Some(first) = query.from.first() {
            if first.join.is_some() || first.on.is_some() {
                return Err(QueryError::PlanError(format!(
                    "the first from entry \"{}\" cannot join onto anything",
                    first.binding()
                )));
            }
        }
        let mut conditions: Vec<Option<BoundExpr>> = vec![None];
        for (index, table_ref) in query.from.iter().enumerate().skip(1) {
            conditions.push(bind_join_condition(table_ref, index, &scope)?);
        }

        // bind the where clause and split it into pushable conjuncts
        let mut conjuncts = Vec::new();
        for expr in where_exprs(query) {
            let bound = bind_scalar(expr, &scope, table_count)?;
            pushdown::split_conjuncts(bound, &mut conjuncts);
        }
        let SplitPredicate { mut per_table, residual } =
            pushdown::classify(conjuncts, table_count);

        // assemble the join chain left to right, each scan wrapped in the
        // filters pushed down to it
        let bindings = scope.bindings();
        let mut plan = scan_with_filters(&bindings[0], 0, mem::take(&mut per_table[0]), &widths);
        for index in 1..table_count {
            let right = scan_with_filters(
                &bindings[index],
                index,
                mem::take(&mut per_table[index]),
                &widths,
            );
            plan = join_onto_chain(plan, right, conditions[index].take(), index, &widths);
        }
        if let Some(predicate) = pushdown::conjoin(residual) {
            plan = Plan::Filter {
                input: Box::new(plan),
                predicate,
                layout: RowLayout::prefix(&widths, table_count),
            };
        }

        // shape the select list into a projection or an aggregation
        let (items, had_wildcard) = expand_select(&query.select, &scope)?;
        let group_by = query.group_by.as_deref().unwrap_or(&[]);
        let aggregating = !group_by.is_empty()
            || items.iter().any(|(expr, _)| matches!(expr, Expr::Call { .. }));
        if aggregating && had_wildcard {
            return Err(QueryError::PlanError(
                "\"*\" cannot be combined with aggregation".into(),
            ));
        }
        let (columns, mut plan) = if aggregating {
            plan_aggregate(plan, &items, group_by, &scope, &widths)?
        } else {
            plan_project(plan, &items, &scope, &widths)?
        };

        // order keys address the output schema, not the input tables
        if let Some(order_by) = &query.order_by {
            if !order_by.is_empty() {
                let mut keys = Vec::with_capacity(order_by.len());
                for key in order_by {
                    keys.push(resolve_order_key(key, &items, &columns)?);
                }
                plan = Plan::Sort {
                    input: Box::new(plan),
                    keys,
                };
            }
        }
        if let Some(count) = limit {
            plan = Plan::Limit {
                input: Box::new(plan),
                count,
            };
        }

        debug!("compiled plan:\n{}", plan);
        Ok(CompiledQuery { columns, plan })
    }
}

/// The where clause as a slice of expressions; a bare expression and a
/// one-element list mean the same thing.
fn where_exprs(query: &Query) -> &[Expr] {
    match &query.where_clause {
        None => &[],
        Some(WhereClause::One(expr)) => std::slice::from_ref(expr),
        Some(WhereClause::All(exprs)) => exprs,
    }
}

fn bind_join_condition(
    table_ref: &TableRef,
    index: usize,
    scope: &Scope,
) -> QueryResult<Option<BoundExpr>> {
    match (table_ref.join, &table_ref.on) {
        (Some(JoinKind::Cross), Some(_)) => Err(QueryError::PlanError(format!(
            "cross join with \"{}\" does not take an on condition",
            table_ref.binding()
        ))),
        (Some(JoinKind::Inner), None) => Err(QueryError::PlanError(format!(
            "inner join with \"{}\" requires an on condition",
            table_ref.binding()
        ))),
        (_, Some(on)) => Ok(Some(bind_scalar(on, scope, index + 1)?)),
        (_, None) => Ok(None),
    }
}

fn scan_with_filters(
    binding: &Binding,
    index: usize,
    filters: Vec<BoundExpr>,
    widths: &[usize],
) -> Plan {
    let mut plan = Plan::Scan {
        binding: binding.name.clone(),
        table: Arc::clone(&binding.table),
    };
    if let Some(predicate) = pushdown::conjoin(filters) {
        plan = Plan::Filter {
            input: Box::new(plan),
            predicate,
            layout: RowLayout::single(widths.len(), index, widths[index]),
        };
    }
    plan
}

fn join_onto_chain(
    chain: Plan,
    right: Plan,
    condition: Option<BoundExpr>,
    index: usize,
    widths: &[usize],
) -> Plan {
    if let Some(BoundExpr::Binary { op: BinaryOp::Eq, left, right: right_side }) = &condition {
        if let Some((left_key, right_key)) = split_equi_keys(left, right_side, index) {
            let build_left = build_side_is_left(&chain, &right);
            return Plan::HashJoin {
                left: Box::new(chain),
                right: Box::new(right),
                build_left,
                left_key,
                left_layout: RowLayout::prefix(widths, index),
                right_key,
                right_layout: RowLayout::single(widths.len(), index, widths[index]),
            };
        }
    }
    Plan::NestedLoopJoin {
        left: Box::new(chain),
        right: Box::new(right),
        condition,
        layout: RowLayout::prefix(widths, index + 1),
    }
}

/// When one side of the equality reads only the chain and the other only
/// the table being joined, the condition can drive a hash join. Returns
/// the keys as (chain side, joined side).
fn split_equi_keys(
    a: &BoundExpr,
    b: &BoundExpr,
    joined: usize,
) -> Option<(BoundExpr, BoundExpr)> {
    fn only_chain(tables: &HashSet<usize>, joined: usize) -> bool {
        !tables.is_empty() && tables.iter().all(|table| *table < joined)
    }
    fn only_joined(tables: &HashSet<usize>, joined: usize) -> bool {
        tables.len() == 1 && tables.contains(&joined)
    }

    let a_tables = a.tables();
    let b_tables = b.tables();
    if only_chain(&a_tables, joined) && only_joined(&b_tables, joined) {
        Some((a.clone(), b.clone()))
    } else if only_chain(&b_tables, joined) && only_joined(&a_tables, joined) {
        Some((b.clone(), a.clone()))
    } else {
        None
    }
}

/// Build the hash table on the smaller input. Ties and unknown sizes keep
/// the default of building on the left.
fn build_side_is_left(left: &Plan, right: &Plan) -> bool {
    match (left.estimated_rows(), right.estimated_rows()) {
        (Some(left_rows), Some(right_rows)) => right_rows >= left_rows,
        _ => true,
    }
}

/// Replace every `"*"` select item with one entry per visible column, in
/// binding order. An expanded column whose bare name appears in more than
/// one table is emitted under its qualified name.
fn expand_select(
    select: &[SelectItem],
    scope: &Scope,
) -> QueryResult<(Vec<(Expr, Option<String>)>, bool)> {
    let mut items: Vec<(Expr, Option<String>)> = Vec::new();
    let mut expanded: Vec<usize> = Vec::new();
    let mut had_wildcard = false;
    for item in select {
        match item {
            SelectItem::Wildcard(token) => {
                if token != "*" {
                    return Err(QueryError::PlanError(format!(
                        "unexpected select item \"{}\"",
                        token
                    )));
                }
                had_wildcard = true;
                for binding in scope.bindings() {
                    for column in binding.table.columns() {
                        expanded.push(items.len());
                        items.push((
                            Expr::Column {
                                column: ColumnRef {
                                    table: Some(binding.name.clone()),
                                    name: column.name().to_string(),
                                },
                            },
                            None,
                        ));
                    }
                }
            }
            SelectItem::Expression { expr, alias } => items.push((expr.clone(), alias.clone())),
        }
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for &index in &expanded {
        if let Expr::Column { column } = &items[index].0 {
            *counts.entry(column.name.clone()).or_insert(0) += 1;
        }
    }
    for &index in &expanded {
        let qualified = match &items[index].0 {
            Expr::Column { column } if counts.get(&column.name).copied().unwrap_or(0) > 1 => {
                Some(column.to_string())
            }
            _ => None,
        };
        if qualified.is_some() {
            items[index].1 = qualified;
        }
    }
    Ok((items, had_wildcard))
}

fn plan_project(
    input: Plan,
    items: &[(Expr, Option<String>)],
    scope: &Scope,
    widths: &[usize],
) -> QueryResult<(Vec<Column>, Plan)> {
    let mut expressions = Vec::with_capacity(items.len());
    let mut columns = Vec::with_capacity(items.len());
    for (expr, alias) in items {
        let bound = bind_scalar(expr, scope, scope.len())?;
        columns.push(Column::new(
            output_name(expr, alias),
            infer_kind(&bound, scope),
        ));
        expressions.push(bound);
    }
    check_unique_names(&columns)?;
    Ok((
        columns,
        Plan::Project {
            input: Box::new(input),
            expressions,
            layout: RowLayout::prefix(widths, widths.len()),
        },
    ))
}

/// Plan the select list of an aggregating query. Every item must be an
/// aggregate call or match one of the group keys; the output order follows
/// the select list, not the key list.
fn plan_aggregate(
    input: Plan,
    items: &[(Expr, Option<String>)],
    group_by: &[Expr],
    scope: &Scope,
    widths: &[usize],
) -> QueryResult<(Vec<Column>, Plan)> {
    let mut group_exprs = Vec::with_capacity(group_by.len());
    for expr in group_by {
        group_exprs.push(bind_scalar(expr, scope, scope.len())?);
    }

    let mut aggregates: Vec<AggregateSpec> = Vec::new();
    let mut output = Vec::with_capacity(items.len());
    let mut columns = Vec::with_capacity(items.len());
    for (expr, alias) in items {
        match expr {
            Expr::Call { call, args } => {
                let spec = bind_aggregate(call, args, scope)?;
                let argument_kind = spec.argument.as_ref().map(|arg| infer_kind(arg, scope));
                columns.push(Column::new(
                    output_name(expr, alias),
                    spec.function.result_kind(argument_kind),
                ));
                output.push(AggregateOutput::Aggregate(aggregates.len()));
                aggregates.push(spec);
            }
            scalar => {
                let bound = bind_scalar(scalar, scope, scope.len())?;
                let position =
                    group_exprs.iter().position(|key| *key == bound).ok_or_else(|| {
                        QueryError::PlanError(format!(
                            "\"{}\" must be a group key or an aggregate",
                            scalar
                        ))
                    })?;
                columns.push(Column::new(
                    output_name(scalar, alias),
                    infer_kind(&bound, scope),
                ));
                output.push(AggregateOutput::Key(position));
            }
        }
    }
    check_unique_names(&columns)?;
    Ok((
        columns,
        Plan::Aggregate {
            input: Box::new(input),
            group_exprs,
            aggregates,
            output,
            layout: RowLayout::prefix(widths, widths.len()),
        },
    ))
}

fn bind_aggregate(name: &str, args: &[Expr], scope: &Scope) -> QueryResult<AggregateSpec> {
    let function = AggregateFunction::from_name(name).ok_or_else(|| {
        QueryError::UnsupportedExpression(format!("unknown function \"{}\"", name))
    })?;
    let argument = match args {
        [] if function == AggregateFunction::Count => None,
        [] => {
            return Err(QueryError::PlanError(format!(
                "{} requires an argument",
                function
            )));
        }
        [arg] => Some(bind_scalar(arg, scope, scope.len())?),
        more => {
            return Err(QueryError::PlanError(format!(
                "{} takes one argument, got {}",
                function,
                more.len()
            )));
        }
    };
    Ok(AggregateSpec { function, argument })
}

/// Bind a scalar expression against the first `visible` tables of the
/// scope. Aggregate calls are not scalars; they are handled one level up,
/// in the select list only.
fn bind_scalar(expr: &Expr, scope: &Scope, visible: usize) -> QueryResult<BoundExpr> {
    match expr {
        Expr::Literal { literal } => Ok(BoundExpr::Literal(literal.clone())),
        Expr::Column { column } => {
            let (table, column) = scope.resolve_within(visible, column)?;
            Ok(BoundExpr::Column { table, column })
        }
        Expr::Binary { op, left, right } => Ok(BoundExpr::Binary {
            op: *op,
            left: Box::new(bind_scalar(left, scope, visible)?),
            right: Box::new(bind_scalar(right, scope, visible)?),
        }),
        Expr::Unary { op, operand } => Ok(BoundExpr::Unary {
            op: *op,
            operand: Box::new(bind_scalar(operand, scope, visible)?),
        }),
        Expr::IsNull { is_null } => Ok(BoundExpr::IsNull {
            operand: Box::new(bind_scalar(is_null, scope, visible)?),
            negated: false,
        }),
        Expr::IsNotNull { is_not_null } => Ok(BoundExpr::IsNull {
            operand: Box::new(bind_scalar(is_not_null, scope, visible)?),
            negated: true,
        }),
        Expr::Call { call, .. } => {
            if AggregateFunction::from_name(call).is_some() {
                Err(QueryError::PlanError(format!(
                    "aggregate {} is only allowed as a top-level select item",
                    expr
                )))
            } else {
                Err(QueryError::UnsupportedExpression(format!(
                    "unknown function \"{}\"",
                    call
                )))
            }
        }
    }
}

/// Output name of one select item: the alias wins, an unaliased column
/// keeps its bare name, anything else uses its rendered text.
fn output_name(expr: &Expr, alias: &Option<String>) -> String {
    match alias {
        Some(alias) => alias.clone(),
        None => match expr {
            Expr::Column { column } => column.name.clone(),
            other => other.to_string(),
        },
    }
}

fn check_unique_names(columns: &[Column]) -> QueryResult<()> {
    for (index, column) in columns.iter().enumerate() {
        if columns[..index].iter().any(|c| c.name() == column.name()) {
            return Err(QueryError::PlanError(format!(
                "output column \"{}\" appears more than once; give it an alias",
                column.name()
            )));
        }
    }
    Ok(())
}

/// Label the result schema. Inference is lenient: it never fails, and a
/// kind it cannot pin down (a null literal, say) is labeled str.
fn infer_kind(expr: &BoundExpr, scope: &Scope) -> DataType {
    match expr {
        BoundExpr::Literal(value) => match value {
            Value::Integer(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Boolean(_) => DataType::Bool,
            Value::Text(_) | Value::Null => DataType::Str,
        },
        BoundExpr::Column { table, column } => scope
            .binding(*table)
            .and_then(|binding| binding.table.columns().get(*column))
            .map(|column| column.data_type())
            .unwrap_or(DataType::Str),
        BoundExpr::Binary { op, left, right } => match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                if infer_kind(left, scope) == DataType::Float
                    || infer_kind(right, scope) == DataType::Float
                {
                    DataType::Float
                } else {
                    DataType::Int
                }
            }
            _ => DataType::Bool,
        },
        BoundExpr::Unary { op: UnaryOp::Neg, operand } => infer_kind(operand, scope),
        BoundExpr::Unary { op: UnaryOp::Not, .. } => DataType::Bool,
        BoundExpr::IsNull { .. } => DataType::Bool,
    }
}

/// Resolve one order key against the output: first a structural match
/// against the select items, then a bare name against the output columns.
fn resolve_order_key(
    key: &OrderKey,
    items: &[(Expr, Option<String>)],
    columns: &[Column],
) -> QueryResult<SortKey> {
    let descending = key.dir == Direction::Desc;
    if let Some(column) = items.iter().position(|(expr, _)| *expr == key.expr) {
        return Ok(SortKey { column, descending });
    }
    if let Expr::Column { column } = &key.expr {
        if column.table.is_none() {
            if let Some(position) = columns.iter().position(|c| c.name() == column.name) {
                return Ok(SortKey {
                    column: position,
                    descending,
                });
            }
        }
    }
    Err(QueryError::UnresolvedColumn(key.expr.to_string()))
}
