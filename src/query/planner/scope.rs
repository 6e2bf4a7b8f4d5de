// Name Resolution Scope
//
// The scope binds the from-clause's tables, in order, under their binding
// names (alias or source name) and resolves column references against them.

use crate::catalog::Table;
use crate::query::ast::ColumnRef;
use crate::query::executor::result::{QueryError, QueryResult};
use std::sync::Arc;

/// One from-clause binding: a name and the table behind it.
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub table: Arc<Table>,
}

/// The tables a query's expressions can reference, in from-clause order.
#[derive(Debug, Default)]
pub struct Scope {
    bindings: Vec<Binding>,
}

impl Scope {
    pub fn new() -> Self {
        Scope {
            bindings: Vec::new(),
        }
    }

    /// Add a binding. Binding names must be unique within one query.
    pub fn bind(&mut self, name: String, table: Arc<Table>) -> QueryResult<()> {
        if self.bindings.iter().any(|b| b.name == name) {
            return Err(QueryError::PlanError(format!(
                "table binding \"{}\" is used more than once; give one of them an alias",
                name
            )));
        }
        self.bindings.push(Binding { name, table });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn binding(&self, index: usize) -> Option<&Binding> {
        self.bindings.get(index)
    }

    /// Column counts of every bound table, in binding order.
    pub fn widths(&self) -> Vec<usize> {
        self.bindings.iter().map(|b| b.table.width()).collect()
    }

    /// Resolve a column reference against every binding.
    pub fn resolve(&self, column: &ColumnRef) -> QueryResult<(usize, usize)> {
        self.resolve_within(self.bindings.len(), column)
    }

    /// Resolve a column reference against the first `visible` bindings.
    ///
    /// Join conditions resolve with a shortened horizon: the tables already
    /// in the chain plus the one being joined. A qualified reference to a
    /// binding beyond that horizon is a planning error rather than an
    /// unknown table, since the name exists in the query.
    pub fn resolve_within(&self, visible: usize, column: &ColumnRef) -> QueryResult<(usize, usize)> {
        let visible = visible.min(self.bindings.len());
        match &column.table {
            Some(table_name) => {
                match self.bindings[..visible]
                    .iter()
                    .position(|b| &b.name == table_name)
                {
                    Some(index) => match self.bindings[index].table.column_index(&column.name) {
                        Some(col) => Ok((index, col)),
                        None => Err(QueryError::UnresolvedColumn(column.to_string())),
                    },
                    None => {
                        if self.bindings[visible..].iter().any(|b| &b.name == table_name) {
                            Err(QueryError::PlanError(format!(
                                "join condition references table \"{}\" before it is joined",
                                table_name
                            )))
                        } else {
                            Err(QueryError::UnknownTable(table_name.clone()))
                        }
                    }
                }
            }
            None => {
                let mut matches = self.bindings[..visible]
                    .iter()
                    .enumerate()
                    .filter_map(|(index, binding)| {
                        binding
                            .table
                            .column_index(&column.name)
                            .map(|col| (index, col))
                    });
                match (matches.next(), matches.next()) {
                    (Some(found), None) => Ok(found),
                    (None, _) => Err(QueryError::UnresolvedColumn(column.name.clone())),
                    (Some(_), Some(_)) => {
                        let tables = self.bindings[..visible]
                            .iter()
                            .filter(|b| b.table.column_index(&column.name).is_some())
                            .map(|b| format!("\"{}\"", b.name))
                            .collect::<Vec<_>>()
                            .join(", ");
                        Err(QueryError::AmbiguousColumn(column.name.clone(), tables))
                    }
                }
            }
        }
    }
}
