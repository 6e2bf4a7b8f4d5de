use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use sqleval::storage::{self, TableStore};
use sqleval::{Catalog, ExecutionEngine, Query, QueryResult, Table};

/// Evaluate one JSON-encoded query against a folder of tables.
///
/// The result, or the error a failed evaluation produced, is written to
/// the output file. An evaluation error is a produced result and exits
/// zero; only process-level problems (bad usage, unreadable input,
/// unwritable output) exit nonzero.
#[derive(Parser)]
#[command(author, version, about = "sqleval - evaluate a JSON-encoded SQL query against a folder of tables")]
struct Cli {
    /// Folder holding the <name>.table.json files
    table_folder: PathBuf,

    /// File holding the query as JSON
    sql_json_file: PathBuf,

    /// File the result table (or error) is written to
    output_file: PathBuf,
}

fn evaluate(store: &TableStore, query: &Query) -> QueryResult<Table> {
    let mut catalog = Catalog::new();
    store.load_for_query(query, &mut catalog)?;
    ExecutionEngine::new(&catalog).execute(query)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let query_text = fs::read_to_string(&cli.sql_json_file)
        .with_context(|| format!("cannot read query file {}", cli.sql_json_file.display()))?;
    let query: Query = serde_json::from_str(&query_text)
        .with_context(|| format!("query file {} does not hold a query", cli.sql_json_file.display()))?;

    let store = TableStore::new(&cli.table_folder);
    match evaluate(&store, &query) {
        Ok(table) => storage::write_table(&cli.output_file, &table)
            .with_context(|| format!("cannot write result to {}", cli.output_file.display()))?,
        Err(error) => storage::write_error(&cli.output_file, &error)
            .with_context(|| format!("cannot write error to {}", cli.output_file.display()))?,
    }
    Ok(())
}
