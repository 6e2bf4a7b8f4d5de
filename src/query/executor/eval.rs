// Expression Evaluation
//
// Evaluates bound expressions against a single row. Null propagates
// through arithmetic and comparisons; and/or/not follow three-valued
// logic; arithmetic on integers is checked and division by zero always
// errors. Evaluation fails fast: the first error aborts the row.

use crate::query::ast::{BinaryOp, UnaryOp};
use crate::query::executor::result::{QueryError, QueryResult, Row, Value};
use crate::query::planner::bound::{BoundExpr, RowLayout};
use std::cmp::Ordering;

/// Evaluate `expr` against `row`, whose shape is described by `layout`.
pub fn evaluate(expr: &BoundExpr, layout: &RowLayout, row: &Row) -> QueryResult<Value> {
    match expr {
        BoundExpr::Literal(value) => Ok(value.clone()),
        BoundExpr::Column { table, column } => {
            let slot = layout.slot(*table, *column)?;
            match row.get(slot) {
                Some(value) => Ok(value.clone()),
                None => Err(QueryError::Internal(format!(
                    "row of width {} has no slot {}",
                    row.len(),
                    slot
                ))),
            }
        }
        BoundExpr::Binary { op, left, right } => {
            let left = evaluate(left, layout, row)?;
            let right = evaluate(right, layout, row)?;
            apply_binary(*op, left, right)
        }
        BoundExpr::Unary { op, operand } => {
            let value = evaluate(operand, layout, row)?;
            apply_unary(*op, value)
        }
        BoundExpr::IsNull { operand, negated } => {
            let value = evaluate(operand, layout, row)?;
            Ok(Value::Boolean(value.is_null() != *negated))
        }
    }
}

fn apply_binary(op: BinaryOp, left: Value, right: Value) -> QueryResult<Value> {
    match op {
        BinaryOp::And => logical_and(left, right),
        BinaryOp::Or => logical_or(left, right),
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge => {
            if left.is_null() || right.is_null() {
                return Ok(Value::Null);
            }
            comparison(op, &left, &right)
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            if left.is_null() || right.is_null() {
                return Ok(Value::Null);
            }
            arithmetic(op, &left, &right)
        }
    }
}

/// Three-valued conjunction: false dominates, then null.
fn logical_and(left: Value, right: Value) -> QueryResult<Value> {
    match (truth(&left), truth(&right)) {
        (Some(l), Some(r)) => Ok(match (l, r) {
            (Some(false), _) | (_, Some(false)) => Value::Boolean(false),
            (Some(true), Some(true)) => Value::Boolean(true),
            _ => Value::Null,
        }),
        _ => Err(QueryError::type_mismatch("and", &left, &right)),
    }
}

/// Three-valued disjunction: true dominates, then null.
fn logical_or(left: Value, right: Value) -> QueryResult<Value> {
    match (truth(&left), truth(&right)) {
        (Some(l), Some(r)) => Ok(match (l, r) {
            (Some(true), _) | (_, Some(true)) => Value::Boolean(true),
            (Some(false), Some(false)) => Value::Boolean(false),
            _ => Value::Null,
        }),
        _ => Err(QueryError::type_mismatch("or", &left, &right)),
    }
}

/// Truth value of a logic operand: `None` when the value is not usable in
/// logic at all, `Some(None)` for null, `Some(Some(b))` for booleans.
fn truth(value: &Value) -> Option<Option<bool>> {
    match value {
        Value::Null => Some(None),
        Value::Boolean(b) => Some(Some(*b)),
        _ => None,
    }
}

fn comparison(op: BinaryOp, left: &Value, right: &Value) -> QueryResult<Value> {
    let ordering = left
        .compare(right)
        .ok_or_else(|| QueryError::type_mismatch(op.symbol(), left, right))?;
    let outcome = match op {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::Ne => ordering != Ordering::Equal,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Ge => ordering != Ordering::Less,
        _ => return Err(QueryError::Internal(format!("{} is not a comparison", op))),
    };
    Ok(Value::Boolean(outcome))
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> QueryResult<Value> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => integer_arithmetic(op, *a, *b),
        (Value::Integer(a), Value::Float(b)) => float_arithmetic(op, *a as f64, *b),
        (Value::Float(a), Value::Integer(b)) => float_arithmetic(op, *a, *b as f64),
        (Value::Float(a), Value::Float(b)) => float_arithmetic(op, *a, *b),
        _ => Err(QueryError::type_mismatch(op.symbol(), left, right)),
    }
}

/// Checked 64-bit arithmetic. Integer division truncates toward zero;
/// `i64::MIN / -1` counts as overflow like the other operators.
fn integer_arithmetic(op: BinaryOp, a: i64, b: i64) -> QueryResult<Value> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => {
            if b == 0 {
                return Err(QueryError::DivisionByZero);
            }
            a.checked_div(b)
        }
        _ => return Err(QueryError::Internal(format!("{} is not arithmetic", op))),
    };
    result
        .map(Value::Integer)
        .ok_or_else(|| QueryError::NumericOverflow(op.symbol().to_string()))
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> QueryResult<Value> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(QueryError::DivisionByZero);
            }
            a / b
        }
        _ => return Err(QueryError::Internal(format!("{} is not arithmetic", op))),
    };
    Ok(Value::Float(result))
}

fn apply_unary(op: UnaryOp, value: Value) -> QueryResult<Value> {
    match op {
        UnaryOp::Not => match value {
            Value::Null => Ok(Value::Null),
            Value::Boolean(b) => Ok(Value::Boolean(!b)),
            other => Err(QueryError::type_mismatch_single("not", &other)),
        },
        UnaryOp::Neg => match value {
            Value::Null => Ok(Value::Null),
            Value::Integer(i) => i
                .checked_neg()
                .map(Value::Integer)
                .ok_or_else(|| QueryError::NumericOverflow("-".into())),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(QueryError::type_mismatch_single("-", &other)),
        },
    }
}
