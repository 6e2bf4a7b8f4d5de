use anyhow::Result;
use serde_json::json;
use sqleval::QueryError;

// Declare the common module for test utilities using a path attribute
#[path = "../common/mod.rs"]
mod common;

fn people() -> serde_json::Value {
    json!([
        [["id", "int"], ["name", "str"], ["age", "int"], ["active", "bool"]],
        [1, "alice", 34, true],
        [2, "bob", null, false],
        [3, "carol", 19, true],
        [4, "dave", 27, null]
    ])
}

#[test]
fn test_select_single_row_by_key() -> Result<()> {
    let catalog = common::catalog(&[("t", json!([[["id", "int"]], [1], [2], [3]]))])?;
    let result = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "id"}}}],
            "from": [{"source": "t"}],
            "where": {"op": "=", "left": {"column": {"name": "id"}}, "right": {"literal": 2}}
        }),
    )?;
    assert_eq!(common::columns_json(&result), json!([["id", "int"]]));
    assert_eq!(common::rows_json(&result), json!([[2]]));
    Ok(())
}

#[test]
fn test_identity_preserves_schema_and_row_order() -> Result<()> {
    let catalog = common::catalog(&[("people", people())])?;
    let result = common::evaluate(
        &catalog,
        json!({"select": ["*"], "from": [{"source": "people"}]}),
    )?;
    assert_eq!(serde_json::to_value(&result)?, people());
    Ok(())
}

#[test]
fn test_projection_computes_and_renames() -> Result<()> {
    let catalog = common::catalog(&[("people", people())])?;
    let result = common::evaluate(
        &catalog,
        json!({
            "select": [
                {"expr": {"column": {"name": "name"}}, "as": "who"},
                {"expr": {"op": "+", "left": {"column": {"name": "age"}},
                          "right": {"literal": 1}}, "as": "next_age"}
            ],
            "from": [{"source": "people"}]
        }),
    )?;
    assert_eq!(
        common::columns_json(&result),
        json!([["who", "str"], ["next_age", "int"]])
    );
    assert_eq!(
        common::rows_json(&result),
        json!([["alice", 35], ["bob", null], ["carol", 20], ["dave", 28]])
    );
    Ok(())
}

#[test]
fn test_where_list_is_a_conjunction() -> Result<()> {
    let catalog = common::catalog(&[("people", people())])?;
    let result = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}}],
            "from": [{"source": "people"}],
            "where": [
                {"op": ">=", "left": {"column": {"name": "age"}}, "right": {"literal": 20}},
                {"column": {"name": "active"}}
            ]
        }),
    )?;
    assert_eq!(common::rows_json(&result), json!([["alice"]]));
    Ok(())
}

#[test]
fn test_null_never_equals_anything() -> Result<()> {
    let catalog = common::catalog(&[("people", people())])?;
    let result = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}}],
            "from": [{"source": "people"}],
            "where": {"op": "=", "left": {"column": {"name": "age"}}, "right": {"literal": null}}
        }),
    )?;
    assert_eq!(common::rows_json(&result), json!([]));
    Ok(())
}

#[test]
fn test_is_null_and_is_not_null() -> Result<()> {
    let catalog = common::catalog(&[("people", people())])?;
    let nulls = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}}],
            "from": [{"source": "people"}],
            "where": {"is_null": {"column": {"name": "age"}}}
        }),
    )?;
    assert_eq!(common::rows_json(&nulls), json!([["bob"]]));

    let others = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}}],
            "from": [{"source": "people"}],
            "where": {"is_not_null": {"column": {"name": "age"}}}
        }),
    )?;
    assert_eq!(
        common::rows_json(&others),
        json!([["alice"], ["carol"], ["dave"]])
    );
    Ok(())
}

#[test]
fn test_three_valued_and_or() -> Result<()> {
    let catalog = common::catalog(&[("people", people())])?;
    // false dominates and: the null active value never shows through
    let ands = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"op": "and", "left": {"column": {"name": "active"}},
                                 "right": {"op": ">", "left": {"column": {"name": "age"}},
                                           "right": {"literal": 100}}}, "as": "v"}],
            "from": [{"source": "people"}]
        }),
    )?;
    assert_eq!(
        common::rows_json(&ands),
        json!([[false], [false], [false], [false]])
    );

    // true dominates or; unknown stays unknown
    let ors = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"op": "or", "left": {"column": {"name": "active"}},
                                 "right": {"op": ">", "left": {"column": {"name": "age"}},
                                           "right": {"literal": 100}}}, "as": "v"}],
            "from": [{"source": "people"}]
        }),
    )?;
    assert_eq!(
        common::rows_json(&ors),
        json!([[true], [null], [true], [null]])
    );
    Ok(())
}

#[test]
fn test_order_by_puts_nulls_first_ascending() -> Result<()> {
    let catalog = common::catalog(&[("people", people())])?;
    let ascending = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}}],
            "from": [{"source": "people"}],
            "order_by": [{"expr": {"column": {"name": "age"}}}]
        }),
    )?;
    assert_eq!(
        common::rows_json(&ascending),
        json!([["bob"], ["carol"], ["dave"], ["alice"]])
    );

    let descending = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}}],
            "from": [{"source": "people"}],
            "order_by": [{"expr": {"column": {"name": "age"}}, "dir": "desc"}]
        }),
    )?;
    assert_eq!(
        common::rows_json(&descending),
        json!([["alice"], ["dave"], ["carol"], ["bob"]])
    );
    Ok(())
}

#[test]
fn test_sort_is_stable_for_equal_keys() -> Result<()> {
    let catalog = common::catalog(&[("people", people())])?;
    // null sorts before false, false before true; alice stays before carol
    let result = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}}],
            "from": [{"source": "people"}],
            "order_by": [{"expr": {"column": {"name": "active"}}}]
        }),
    )?;
    assert_eq!(
        common::rows_json(&result),
        json!([["dave"], ["bob"], ["alice"], ["carol"]])
    );
    Ok(())
}

#[test]
fn test_limit_truncates_after_sorting() -> Result<()> {
    let catalog = common::catalog(&[("people", people())])?;
    let query = |limit: i64| {
        json!({
            "select": [{"expr": {"column": {"name": "name"}}}],
            "from": [{"source": "people"}],
            "order_by": [{"expr": {"column": {"name": "age"}}, "dir": "desc"}],
            "limit": limit
        })
    };
    let top_two = common::evaluate(&catalog, query(2))?;
    assert_eq!(common::rows_json(&top_two), json!([["alice"], ["dave"]]));

    let all = common::evaluate(&catalog, query(100))?;
    assert_eq!(all.row_count(), 4);

    let none = common::evaluate(&catalog, query(0))?;
    assert_eq!(none.row_count(), 0);
    assert_eq!(common::columns_json(&none), json!([["name", "str"]]));
    Ok(())
}

#[test]
fn test_division_by_zero_aborts() -> Result<()> {
    let catalog = common::catalog(&[("t", json!([[["n", "int"]], [1]]))])?;
    let by_int_zero = common::evaluate_err(
        &catalog,
        json!({
            "select": [{"expr": {"op": "/", "left": {"column": {"name": "n"}},
                                 "right": {"literal": 0}}}],
            "from": [{"source": "t"}]
        }),
    );
    assert_eq!(by_int_zero, QueryError::DivisionByZero);

    let by_float_zero = common::evaluate_err(
        &catalog,
        json!({
            "select": [{"expr": {"op": "/", "left": {"column": {"name": "n"}},
                                 "right": {"literal": 0.0}}}],
            "from": [{"source": "t"}]
        }),
    );
    assert_eq!(by_float_zero, QueryError::DivisionByZero);
    Ok(())
}

#[test]
fn test_integer_overflow_aborts() -> Result<()> {
    let catalog = common::catalog(&[("t", json!([[["n", "int"]], [i64::MAX]]))])?;
    let err = common::evaluate_err(
        &catalog,
        json!({
            "select": [{"expr": {"op": "+", "left": {"column": {"name": "n"}},
                                 "right": {"literal": 1}}}],
            "from": [{"source": "t"}]
        }),
    );
    assert!(matches!(err, QueryError::NumericOverflow(_)));
    Ok(())
}

#[test]
fn test_incompatible_comparison_aborts_with_kinds() -> Result<()> {
    let catalog = common::catalog(&[("people", people())])?;
    let err = common::evaluate_err(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}}],
            "from": [{"source": "people"}],
            "where": {"op": ">", "left": {"column": {"name": "age"}}, "right": {"literal": "x"}}
        }),
    );
    assert_eq!(err.to_string(), "Incompatible types to \">\": int and str");
    Ok(())
}

#[test]
fn test_where_value_must_be_boolean() -> Result<()> {
    let catalog = common::catalog(&[("people", people())])?;
    let err = common::evaluate_err(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}}],
            "from": [{"source": "people"}],
            "where": {"literal": 1}
        }),
    );
    assert_eq!(err.to_string(), "Incompatible types to \"where\": int");
    Ok(())
}

#[test]
fn test_integers_and_floats_compare_by_value() -> Result<()> {
    let catalog = common::catalog(&[("m", json!([[["f", "float"]], [2.0], [2.5]]))])?;
    let result = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "f"}}}],
            "from": [{"source": "m"}],
            "where": {"op": "=", "left": {"column": {"name": "f"}}, "right": {"literal": 2}}
        }),
    )?;
    assert_eq!(common::rows_json(&result), json!([[2.0]]));
    Ok(())
}

#[test]
fn test_empty_table_keeps_its_schema() -> Result<()> {
    let catalog = common::catalog(&[("empty", json!([[["id", "int"], ["name", "str"]]]))])?;
    let result = common::evaluate(
        &catalog,
        json!({"select": ["*"], "from": [{"source": "empty"}]}),
    )?;
    assert_eq!(result.row_count(), 0);
    assert_eq!(
        common::columns_json(&result),
        json!([["id", "int"], ["name", "str"]])
    );
    Ok(())
}

#[test]
fn test_evaluation_is_repeatable() -> Result<()> {
    let catalog = common::catalog(&[("people", people())])?;
    let query = json!({
        "select": [{"expr": {"column": {"name": "name"}}},
                   {"expr": {"column": {"name": "age"}}}],
        "from": [{"source": "people"}],
        "where": {"op": ">", "left": {"column": {"name": "id"}}, "right": {"literal": 1}},
        "order_by": [{"expr": {"column": {"name": "name"}}}]
    });
    let first = common::evaluate(&catalog, query.clone())?;
    let second = common::evaluate(&catalog, query)?;
    assert_eq!(
        serde_json::to_value(&first)?,
        serde_json::to_value(&second)?
    );
    Ok(())
}
