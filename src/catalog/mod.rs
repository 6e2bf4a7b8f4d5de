//! Catalog Management Module
//!
//! This module holds the named tables a query can read: the catalog maps
//! table names to immutable, shareable table instances.

pub mod column;
pub mod schema;
pub mod table;

// Re-export key types
pub use self::column::Column;
pub use self::schema::DataType;
pub use self::table::Table;

use crate::query::executor::result::{QueryError, QueryResult};
use std::collections::HashMap;
use std::sync::Arc;

/// The set of tables visible to a query, keyed by source name.
///
/// Tables are stored behind `Arc` so a plan can hold onto the ones it
/// scans without copying rows; the catalog itself stays immutable while
/// queries run against it.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: HashMap<String, Arc<Table>>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            tables: HashMap::new(),
        }
    }

    /// Make a table visible under `name`. Registering the same name twice
    /// is an error; hosts that want replacement can build a fresh catalog.
    pub fn register(&mut self, name: impl Into<String>, table: Table) -> QueryResult<()> {
        let name = name.into();
        if self.tables.contains_key(&name) {
            return Err(QueryError::InvalidArgument(format!(
                "table \"{}\" is already registered",
                name
            )));
        }
        self.tables.insert(name, Arc::new(table));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<Table>> {
        self.tables.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
