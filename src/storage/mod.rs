//! Table Store
//!
//! The boundary between the engine and the filesystem: a folder of
//! `<name>.table.json` files acts as the table source, and results or
//! errors are written in the evaluator's output format. Nothing else in
//! the crate touches the filesystem; hosts that keep tables elsewhere can
//! fill a catalog themselves and skip this module entirely.

use crate::catalog::{Catalog, Table};
use crate::query::ast::Query;
use crate::query::executor::result::{QueryError, QueryResult};
use log::info;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Loads tables by name from one folder.
pub struct TableStore {
    folder: PathBuf,
}

impl TableStore {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        TableStore {
            folder: folder.into(),
        }
    }

    /// Path of the file backing `name`.
    pub fn table_path(&self, name: &str) -> PathBuf {
        self.folder.join(format!("{}.table.json", name))
    }

    /// Load one table and check its structural invariants. A missing file
    /// means the table does not exist; an unreadable or malformed file is
    /// a bad argument, not an unknown table.
    pub fn load(&self, name: &str) -> QueryResult<Table> {
        let path = self.table_path(name);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(QueryError::UnknownTable(name.to_string()));
            }
            Err(err) => {
                return Err(QueryError::InvalidArgument(format!(
                    "cannot read table \"{}\" from {}: {}",
                    name,
                    path.display(),
                    err
                )));
            }
        };
        let table: Table = serde_json::from_str(&contents).map_err(|err| {
            QueryError::InvalidArgument(format!("table \"{}\" is malformed: {}", name, err))
        })?;
        table.validate(name)?;
        Ok(table)
    }

    /// Load every distinct source the query names into `catalog`. A source
    /// aliased several times is read once.
    pub fn load_for_query(&self, query: &Query, catalog: &mut Catalog) -> QueryResult<()> {
        for table_ref in &query.from {
            if catalog.contains(&table_ref.source) {
                continue;
            }
            let table = self.load(&table_ref.source)?;
            info!(
                "loaded table \"{}\": {} rows",
                table_ref.source,
                table.row_count()
            );
            catalog.register(table_ref.source.clone(), table)?;
        }
        Ok(())
    }
}

/// Write `table` in the output format: the column list and each row on a
/// line of their own, four-space indented, with a trailing newline.
pub fn write_table(path: &Path, table: &Table) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut out = BufWriter::new(file);
    write!(out, "[\n    {}", serde_json::to_string(table.columns())?)?;
    for row in table.rows() {
        write!(out, ",\n    {}", serde_json::to_string(row)?)?;
    }
    out.write_all(b"\n]\n")?;
    out.flush()
}

/// Write `error` the way the evaluator reports a failed query.
pub fn write_error(path: &Path, error: &QueryError) -> io::Result<()> {
    fs::write(path, format!("ERROR: {}.\n", error))
}
