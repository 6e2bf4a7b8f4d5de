use anyhow::Result;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::process::Command;

fn write_json(path: &Path, value: serde_json::Value) -> Result<()> {
    fs::write(path, value.to_string())?;
    Ok(())
}

/// Test that the CLI evaluates a query end to end and writes the result file
#[test]
fn test_cli_writes_the_result_file() -> Result<()> {
    // Build the CLI binary
    let status = Command::new("cargo")
        .args(["build", "--bin", "sqleval"])
        .status()?;

    assert!(status.success(), "Failed to build sqleval binary");

    let temp_dir = tempfile::tempdir()?;
    let tables = temp_dir.path().join("tables");
    fs::create_dir_all(&tables)?;
    write_json(
        &tables.join("users.table.json"),
        json!([
            [["id", "int"], ["name", "str"]],
            [1, "alice"],
            [2, "bob"]
        ]),
    )?;
    write_json(
        &tables.join("orders.table.json"),
        json!([
            [["user_id", "int"], ["total", "float"]],
            [1, 10.0],
            [2, 2.5],
            [1, 0.5]
        ]),
    )?;

    let query_path = temp_dir.path().join("query.json");
    write_json(
        &query_path,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}},
                       {"expr": {"call": "sum", "args": [{"column": {"name": "total"}}]},
                        "as": "spent"}],
            "from": [
                {"source": "users"},
                {"source": "orders", "join": "inner",
                 "on": {"op": "=", "left": {"column": {"name": "id"}},
                        "right": {"column": {"name": "user_id"}}}}
            ],
            "group_by": [{"column": {"name": "name"}}]
        }),
    )?;

    let output_path = temp_dir.path().join("result.json");
    let output = Command::new("target/debug/sqleval")
        .arg(&tables)
        .arg(&query_path)
        .arg(&output_path)
        .output()?;

    assert!(output.status.success(), "CLI query evaluation failed");

    // one row per column set and per result row, four-space indented
    let written = fs::read_to_string(&output_path)?;
    assert_eq!(
        written,
        "[\n    [[\"name\",\"str\"],[\"spent\",\"float\"]],\n    [\"alice\",10.5],\n    [\"bob\",2.5]\n]\n"
    );
    Ok(())
}

/// Test that a failing query still exits zero and reports through the file
#[test]
fn test_cli_reports_query_errors_in_the_output_file() -> Result<()> {
    // Build the CLI binary
    let status = Command::new("cargo")
        .args(["build", "--bin", "sqleval"])
        .status()?;

    assert!(status.success(), "Failed to build sqleval binary");

    let temp_dir = tempfile::tempdir()?;
    let tables = temp_dir.path().join("tables");
    fs::create_dir_all(&tables)?;

    let query_path = temp_dir.path().join("query.json");
    write_json(
        &query_path,
        json!({"select": ["*"], "from": [{"source": "ghost"}]}),
    )?;

    let output_path = temp_dir.path().join("result.json");
    let output = Command::new("target/debug/sqleval")
        .arg(&tables)
        .arg(&query_path)
        .arg(&output_path)
        .output()?;

    // evaluation errors are part of the contract, not a process failure
    assert!(output.status.success(), "CLI should exit zero on query errors");
    assert_eq!(
        fs::read_to_string(&output_path)?,
        "ERROR: Unknown table name \"ghost\".\n"
    );
    Ok(())
}

/// Test that missing arguments fail with a usage message
#[test]
fn test_cli_requires_three_arguments() -> Result<()> {
    // Build the CLI binary
    let status = Command::new("cargo")
        .args(["build", "--bin", "sqleval"])
        .status()?;

    assert!(status.success(), "Failed to build sqleval binary");

    let output = Command::new("target/debug/sqleval").output()?;
    assert!(!output.status.success(), "CLI should reject missing arguments");

    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("Usage:"), "Usage message not found");
    Ok(())
}

/// Test that an unreadable or malformed query file is a process error
#[test]
fn test_cli_fails_on_bad_query_files() -> Result<()> {
    // Build the CLI binary
    let status = Command::new("cargo")
        .args(["build", "--bin", "sqleval"])
        .status()?;

    assert!(status.success(), "Failed to build sqleval binary");

    let temp_dir = tempfile::tempdir()?;
    let tables = temp_dir.path().join("tables");
    fs::create_dir_all(&tables)?;
    let output_path = temp_dir.path().join("result.json");

    // missing query file
    let output = Command::new("target/debug/sqleval")
        .arg(&tables)
        .arg(temp_dir.path().join("missing.json"))
        .arg(&output_path)
        .output()?;
    assert!(!output.status.success(), "CLI should fail on a missing query file");
    assert!(
        String::from_utf8(output.stderr)?.contains("cannot read query"),
        "Expected a read error on stderr"
    );

    // malformed query JSON
    let query_path = temp_dir.path().join("query.json");
    fs::write(&query_path, "{ not json")?;
    let output = Command::new("target/debug/sqleval")
        .arg(&tables)
        .arg(&query_path)
        .arg(&output_path)
        .output()?;
    assert!(!output.status.success(), "CLI should fail on malformed query JSON");
    assert!(
        String::from_utf8(output.stderr)?.contains("does not hold a query"),
        "Expected a parse error on stderr"
    );
    Ok(())
}

/// Test CLI help output
#[test]
fn test_cli_help_output() -> Result<()> {
    // Build the CLI binary
    let status = Command::new("cargo")
        .args(["build", "--bin", "sqleval"])
        .status()?;

    assert!(status.success(), "Failed to build sqleval binary");

    let output = Command::new("target/debug/sqleval").args(["--help"]).output()?;
    assert!(output.status.success(), "CLI help command failed");

    let output_str = String::from_utf8(output.stdout)?;
    assert!(output_str.contains("Usage:"), "Help usage section not found");
    assert!(output_str.contains("table"), "Table folder argument not described");
    Ok(())
}
