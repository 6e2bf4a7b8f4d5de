// Query AST
//
// The pre-parsed query shape the engine accepts. The types here mirror the
// JSON wire format one-to-one: hosts either build the tree directly or
// deserialize it from JSON with serde.

use crate::query::executor::result::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete query: what to select, from where, and how to shape the
/// output. Only `select` and `from` are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub select: Vec<SelectItem>,
    pub from: Vec<TableRef>,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<WhereClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<Vec<Expr>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Vec<OrderKey>>,
    /// Checked for non-negativity at plan time, so a bad value surfaces as
    /// a query error rather than a parse failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

/// One select-list entry: the wildcard string `"*"` or an expression with
/// an optional output alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectItem {
    Wildcard(String),
    Expression {
        expr: Expr,
        #[serde(rename = "as", default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
    },
}

/// One from-clause entry. The first entry names the driving table; every
/// later entry joins another table onto the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRef {
    pub source: String,
    #[serde(rename = "as", default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<JoinKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<Expr>,
}

impl TableRef {
    /// The name this table binds to in the query: the alias when present,
    /// otherwise the source name.
    pub fn binding(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Inner,
    Cross,
}

/// The where clause: one expression, or a list treated as a conjunction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WhereClause {
    One(Expr),
    All(Vec<Expr>),
}

/// One order-by entry; direction defaults to ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderKey {
    pub expr: Expr,
    #[serde(default)]
    pub dir: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// An expression tree node.
///
/// Each variant carries a distinct key set, so the untagged serde form
/// picks the right shape from the JSON object's keys alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expr {
    Literal {
        literal: Value,
    },
    Column {
        column: ColumnRef,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Call {
        call: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
    IsNull {
        is_null: Box<Expr>,
    },
    IsNotNull {
        is_not_null: Box<Expr>,
    },
}

/// A column reference, optionally qualified with a table binding name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub name: String,
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "and")]
    And,
    #[serde(rename = "or")]
    Or,
}

impl BinaryOp {
    /// The operator as written in the wire format, also used in error
    /// messages.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "not")]
    Not,
    #[serde(rename = "-")]
    Neg,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::Neg => "-",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl Expr {
    /// Render a sub-expression, parenthesizing nested binary operators so
    /// the text keeps the tree's grouping.
    fn fmt_operand(expr: &Expr, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if matches!(expr, Expr::Binary { .. }) {
            write!(f, "({})", expr)
        } else {
            write!(f, "{}", expr)
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal { literal } => write!(f, "{}", literal),
            Expr::Column { column } => write!(f, "{}", column),
            Expr::Binary { op, left, right } => {
                Expr::fmt_operand(left, f)?;
                write!(f, " {} ", op)?;
                Expr::fmt_operand(right, f)
            }
            Expr::Unary { op: UnaryOp::Not, operand } => {
                write!(f, "not ")?;
                Expr::fmt_operand(operand, f)
            }
            Expr::Unary { op: UnaryOp::Neg, operand } => {
                write!(f, "-")?;
                Expr::fmt_operand(operand, f)
            }
            Expr::Call { call, args } => {
                if args.is_empty() {
                    write!(f, "{}(*)", call)
                } else {
                    write!(f, "{}(", call)?;
                    for (index, arg) in args.iter().enumerate() {
                        if index > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ")")
                }
            }
            Expr::IsNull { is_null } => {
                Expr::fmt_operand(is_null, f)?;
                write!(f, " is null")
            }
            Expr::IsNotNull { is_not_null } => {
                Expr::fmt_operand(is_not_null, f)?;
                write!(f, " is not null")
            }
        }
    }
}
