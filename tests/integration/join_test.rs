use anyhow::Result;
use serde_json::json;
use sqleval::QueryError;

// Declare the common module for test utilities using a path attribute
#[path = "../common/mod.rs"]
mod common;

fn users() -> serde_json::Value {
    json!([
        [["id", "int"], ["name", "str"]],
        [1, "alice"],
        [2, "bob"],
        [3, "carol"]
    ])
}

fn orders() -> serde_json::Value {
    json!([
        [["user_id", "int"], ["total", "float"]],
        [1, 10.0],
        [3, 2.5],
        [1, 0.5],
        [null, 9.9]
    ])
}

#[test]
fn test_comma_join_with_where_equality() -> Result<()> {
    let catalog = common::catalog(&[
        ("a", json!([[["x", "int"]], [1], [2]])),
        ("b", json!([[["y", "int"]], [2], [3]])),
    ])?;
    let result = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "x"}}}, {"expr": {"column": {"name": "y"}}}],
            "from": [{"source": "a"}, {"source": "b"}],
            "where": {"op": "=", "left": {"column": {"name": "x"}},
                      "right": {"column": {"name": "y"}}}
        }),
    )?;
    assert_eq!(
        common::columns_json(&result),
        json!([["x", "int"], ["y", "int"]])
    );
    assert_eq!(common::rows_json(&result), json!([[2, 2]]));
    Ok(())
}

#[test]
fn test_cross_join_is_left_major() -> Result<()> {
    let catalog = common::catalog(&[("users", users()), ("orders", orders())])?;
    let result = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}},
                       {"expr": {"column": {"name": "total"}}}],
            "from": [{"source": "users"}, {"source": "orders", "join": "cross"}]
        }),
    )?;
    assert_eq!(result.row_count(), 12);
    // every left row is paired with the whole right side before the next
    assert_eq!(
        common::rows_json(&result),
        json!([
            ["alice", 10.0], ["alice", 2.5], ["alice", 0.5], ["alice", 9.9],
            ["bob", 10.0], ["bob", 2.5], ["bob", 0.5], ["bob", 9.9],
            ["carol", 10.0], ["carol", 2.5], ["carol", 0.5], ["carol", 9.9]
        ])
    );
    Ok(())
}

#[test]
fn test_inner_join_on_equality() -> Result<()> {
    let catalog = common::catalog(&[("users", users()), ("orders", orders())])?;
    let result = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}},
                       {"expr": {"column": {"name": "total"}}}],
            "from": [
                {"source": "users"},
                {"source": "orders", "join": "inner",
                 "on": {"op": "=", "left": {"column": {"name": "id"}},
                        "right": {"column": {"name": "user_id"}}}}
            ]
        }),
    )?;
    // left-major: all of alice's matches in right order, then carol's
    assert_eq!(
        common::rows_json(&result),
        json!([["alice", 10.0], ["alice", 0.5], ["carol", 2.5]])
    );
    Ok(())
}

#[test]
fn test_on_join_and_where_join_agree() -> Result<()> {
    let catalog = common::catalog(&[("users", users()), ("orders", orders())])?;
    let with_on = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}},
                       {"expr": {"column": {"name": "total"}}}],
            "from": [
                {"source": "users"},
                {"source": "orders", "join": "inner",
                 "on": {"op": "=", "left": {"column": {"name": "id"}},
                        "right": {"column": {"name": "user_id"}}}}
            ]
        }),
    )?;
    let with_where = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}},
                       {"expr": {"column": {"name": "total"}}}],
            "from": [{"source": "users"}, {"source": "orders"}],
            "where": {"op": "=", "left": {"column": {"name": "id"}},
                      "right": {"column": {"name": "user_id"}}}
        }),
    )?;
    assert_eq!(common::rows_json(&with_on), common::rows_json(&with_where));
    Ok(())
}

#[test]
fn test_join_order_is_left_major_for_either_build_side() -> Result<()> {
    let catalog = common::catalog(&[("users", users()), ("orders", orders())])?;
    // orders is larger than users, so this join builds on the right; the
    // output still follows the left (orders) row order
    let result = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "total"}}},
                       {"expr": {"column": {"name": "name"}}}],
            "from": [
                {"source": "orders"},
                {"source": "users", "join": "inner",
                 "on": {"op": "=", "left": {"column": {"name": "user_id"}},
                        "right": {"column": {"name": "id"}}}}
            ]
        }),
    )?;
    assert_eq!(
        common::rows_json(&result),
        json!([[10.0, "alice"], [2.5, "carol"], [0.5, "alice"]])
    );
    Ok(())
}

#[test]
fn test_null_keys_never_join() -> Result<()> {
    let catalog = common::catalog(&[
        ("l", json!([[["k", "int"]], [1], [null]])),
        ("r", json!([[["k", "int"]], [null], [1]])),
    ])?;
    let result = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"table": "l", "name": "k"}}, "as": "lk"},
                       {"expr": {"column": {"table": "r", "name": "k"}}, "as": "rk"}],
            "from": [
                {"source": "l"},
                {"source": "r", "join": "inner",
                 "on": {"op": "=", "left": {"column": {"table": "l", "name": "k"}},
                        "right": {"column": {"table": "r", "name": "k"}}}}
            ]
        }),
    )?;
    assert_eq!(common::rows_json(&result), json!([[1, 1]]));
    Ok(())
}

#[test]
fn test_theta_join_on_inequality() -> Result<()> {
    let catalog = common::catalog(&[
        ("a", json!([[["x", "int"]], [1], [2]])),
        ("b", json!([[["y", "int"]], [2], [3]])),
    ])?;
    let result = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "x"}}}, {"expr": {"column": {"name": "y"}}}],
            "from": [
                {"source": "a"},
                {"source": "b", "join": "inner",
                 "on": {"op": "<", "left": {"column": {"name": "x"}},
                        "right": {"column": {"name": "y"}}}}
            ]
        }),
    )?;
    assert_eq!(common::rows_json(&result), json!([[1, 2], [1, 3], [2, 3]]));
    Ok(())
}

#[test]
fn test_three_table_chain() -> Result<()> {
    let catalog = common::catalog(&[
        ("users", users()),
        ("orders", orders()),
        (
            "regions",
            json!([[["rid", "int"], ["region", "str"]], [1, "north"], [3, "south"]]),
        ),
    ])?;
    let result = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}},
                       {"expr": {"column": {"name": "total"}}},
                       {"expr": {"column": {"name": "region"}}}],
            "from": [
                {"source": "users"},
                {"source": "orders", "join": "inner",
                 "on": {"op": "=", "left": {"column": {"name": "id"}},
                        "right": {"column": {"name": "user_id"}}}},
                {"source": "regions", "join": "inner",
                 "on": {"op": "=", "left": {"column": {"name": "id"}},
                        "right": {"column": {"name": "rid"}}}}
            ]
        }),
    )?;
    assert_eq!(
        common::rows_json(&result),
        json!([
            ["alice", 10.0, "north"],
            ["alice", 0.5, "north"],
            ["carol", 2.5, "south"]
        ])
    );
    Ok(())
}

#[test]
fn test_self_join_with_aliases() -> Result<()> {
    let catalog = common::catalog(&[("users", users())])?;
    let result = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"table": "a", "name": "name"}}, "as": "first"},
                       {"expr": {"column": {"table": "b", "name": "name"}}, "as": "second"}],
            "from": [
                {"source": "users", "as": "a"},
                {"source": "users", "as": "b", "join": "inner",
                 "on": {"op": "=", "left": {"column": {"table": "a", "name": "id"}},
                        "right": {"column": {"table": "b", "name": "id"}}}}
            ]
        }),
    )?;
    assert_eq!(
        common::rows_json(&result),
        json!([["alice", "alice"], ["bob", "bob"], ["carol", "carol"]])
    );
    Ok(())
}

#[test]
fn test_mismatched_on_keys_join_nothing() -> Result<()> {
    let catalog = common::catalog(&[
        ("users", users()),
        ("labels", json!([[["label", "str"]], ["1"], ["x"]])),
    ])?;
    // keys of different kinds never compare equal in an on condition
    let result = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}}],
            "from": [
                {"source": "users"},
                {"source": "labels", "join": "inner",
                 "on": {"op": "=", "left": {"column": {"name": "id"}},
                        "right": {"column": {"name": "label"}}}}
            ]
        }),
    )?;
    assert_eq!(result.row_count(), 0);
    Ok(())
}

#[test]
fn test_mismatched_where_comparison_still_aborts() -> Result<()> {
    let catalog = common::catalog(&[
        ("users", users()),
        ("labels", json!([[["label", "str"]], ["1"], ["x"]])),
    ])?;
    // the same comparison in a where clause is a filter and fails loudly
    let err = common::evaluate_err(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}}],
            "from": [{"source": "users"}, {"source": "labels"}],
            "where": {"op": "=", "left": {"column": {"name": "id"}},
                      "right": {"column": {"name": "label"}}}
        }),
    );
    assert_eq!(err.to_string(), "Incompatible types to \"=\": int and str");
    Ok(())
}

#[test]
fn test_joining_an_empty_table_yields_nothing() -> Result<()> {
    let catalog = common::catalog(&[
        ("users", users()),
        ("empty", json!([[["user_id", "int"]]])),
    ])?;
    for from in [
        json!([
            {"source": "users"},
            {"source": "empty", "join": "inner",
             "on": {"op": "=", "left": {"column": {"name": "id"}},
                    "right": {"column": {"name": "user_id"}}}}
        ]),
        json!([
            {"source": "empty"},
            {"source": "users", "join": "inner",
             "on": {"op": "=", "left": {"column": {"name": "user_id"}},
                    "right": {"column": {"name": "id"}}}}
        ]),
    ] {
        let result = common::evaluate(
            &catalog,
            json!({
                "select": [{"expr": {"column": {"name": "name"}}}],
                "from": from
            }),
        )?;
        assert_eq!(result.row_count(), 0);
    }
    Ok(())
}

#[test]
fn test_pushed_filters_and_residual_agree_with_unpushed_plan() -> Result<()> {
    let catalog = common::catalog(&[("users", users()), ("orders", orders())])?;
    // single-table conjuncts run beneath the join, the cross-table one
    // above it; the result must match the unsplit conjunction
    let result = common::evaluate(
        &catalog,
        json!({
            "select": [{"expr": {"column": {"name": "name"}}},
                       {"expr": {"column": {"name": "total"}}}],
            "from": [{"source": "users"}, {"source": "orders"}],
            "where": [
                {"op": "!=", "left": {"column": {"name": "name"}}, "right": {"literal": "bob"}},
                {"op": ">", "left": {"column": {"name": "total"}}, "right": {"literal": 1.0}},
                {"op": "=", "left": {"column": {"name": "id"}},
                 "right": {"column": {"name": "user_id"}}}
            ]
        }),
    )?;
    assert_eq!(
        common::rows_json(&result),
        json!([["alice", 10.0], ["carol", 2.5]])
    );
    Ok(())
}

#[test]
fn test_unknown_table_in_join() -> Result<()> {
    let catalog = common::catalog(&[("users", users())])?;
    let err = common::evaluate_err(
        &catalog,
        json!({
            "select": ["*"],
            "from": [{"source": "users"}, {"source": "ghost", "join": "cross"}]
        }),
    );
    assert_eq!(err, QueryError::UnknownTable("ghost".into()));
    Ok(())
}
