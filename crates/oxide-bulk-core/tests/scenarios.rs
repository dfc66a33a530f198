//! End-to-end scenarios: extractor, builder and rewriter together.

mod common;
use common::*;

use oxide_bulk_core::{
    AssignmentExtractor, ColumnAssignment, CompiledQuery, Dialect, EntityContract, IgnoreSet,
    Initializer, NameMatching, SqlValue, TableNameRewriter, TranspileError,
};

fn sys_function_contract() -> EntityContract {
    EntityContract::new("sys_function")
        .key("id", "id")
        .field("name", "name")
}

// ===================================================================
// Scenario A: literal assignment on SQL Server
// ===================================================================

#[test]
fn test_update_sys_function_on_sql_server() {
    let contract = sys_function_contract();
    let assignments = AssignmentExtractor::new(&contract, NameMatching::Exact)
        .extract(&Initializer::new().set("name", "x"), &IgnoreSet::new())
        .unwrap();

    let statement = update(
        &sys_function_query(&Dialect::SqlServer),
        &assignments,
        &IgnoreSet::new(),
        &Dialect::SqlServer,
    );

    assert_eq!(
        statement.sql(),
        "UPDATE sys_function SET name = @s0 FROM (SELECT id, name FROM sys_function WHERE id = @b0) AS src WHERE sys_function.id = src.id"
    );
    assert_eq!(parameter_markers(&statement), vec!["@s0", "@b0"]);
    assert_eq!(
        statement.parameters()[0].value,
        SqlValue::Text(String::from("x"))
    );
    assert_eq!(statement.parameters()[1].value, SqlValue::Int(42));
}

// ===================================================================
// Scenario B: ignored key on MySQL
// ===================================================================

#[test]
fn test_ignored_key_is_never_assigned_on_mysql() {
    let contract = sys_function_contract();
    let init = Initializer::new().set("id", 7_i64).set("name", "x");
    let ignore = IgnoreSet::new().with("id");
    let assignments = AssignmentExtractor::new(&contract, NameMatching::Exact)
        .extract(&init, &ignore)
        .unwrap();
    assert_eq!(assignments.len(), 1);

    let statement = update(
        &sys_function_query(&Dialect::MySql),
        &assignments,
        &ignore,
        &Dialect::MySql,
    );

    assert_eq!(
        statement.sql(),
        "UPDATE sys_function INNER JOIN (SELECT id, name FROM sys_function WHERE id = @b0) AS src ON sys_function.id = src.id SET sys_function.name = @s0"
    );
    let set_list = statement.sql().split(" SET ").nth(1).unwrap();
    assert!(!set_list.contains(".id ="));
    assert_eq!(statement.parameters().len(), 2);
}

#[test]
fn test_builder_ignore_set_applies_to_raw_assignments() {
    let statement = update(
        &sys_function_query(&Dialect::MySql),
        &[
            ColumnAssignment::literal("id", 7_i64),
            ColumnAssignment::literal("name", "x"),
        ],
        &IgnoreSet::new().with("id"),
        &Dialect::MySql,
    );
    assert!(statement.sql().ends_with("SET sys_function.name = @s0"));
}

// ===================================================================
// Scenario C: delete on PostgreSQL
// ===================================================================

#[test]
fn test_delete_on_postgres_keeps_only_base_parameters() {
    let query = CompiledQuery::new("SELECT id FROM t WHERE status = $1", "t")
        .parameter("$1", "stale")
        .key("id");

    let statement = delete(&query, &Dialect::PostgreSql);

    assert_eq!(
        statement.sql(),
        "DELETE FROM t USING (SELECT id FROM t WHERE status = $1) AS src WHERE t.id = src.id"
    );
    assert_eq!(parameter_markers(&statement), vec!["$1"]);
    assert_eq!(
        statement.parameters()[0].value,
        SqlValue::Text(String::from("stale"))
    );
}

// ===================================================================
// Scenario D: GROUP BY is rejected
// ===================================================================

#[test]
fn test_group_by_is_rejected_on_every_dialect() {
    for dialect in &DIALECTS {
        let query = CompiledQuery::new("SELECT id FROM orders GROUP BY id", "orders").key("id");
        let err = update_err(&query, &[ColumnAssignment::literal("state", 1_i32)], dialect);
        assert_eq!(
            err,
            TranspileError::UnsupportedQueryShape {
                table: String::from("orders"),
                clause: String::from("GROUP BY"),
            }
        );
    }
}

// ===================================================================
// Sharded delete: builder output goes through the rewriter
// ===================================================================

#[test]
fn test_sharding_annotation_survives_the_builder() {
    let query = CompiledQuery::new(
        "-- shard:orders:orders_2024\nSELECT orders.id FROM orders WHERE orders.placed < @p0",
        "orders",
    )
    .parameter("@p0", "2024-01-01")
    .key("id");

    let statement = delete(&query, &Dialect::SqlServer);
    let sql = TableNameRewriter::default()
        .intercept(statement.sql(), &Dialect::SqlServer)
        .unwrap();

    assert_eq!(
        sql,
        "-- shard:orders:orders_2024\nDELETE orders_2024 FROM orders_2024 INNER JOIN (SELECT orders_2024.id FROM orders_2024 WHERE orders_2024.placed < @b0) AS src ON orders_2024.id = src.id"
    );
}

// ===================================================================
// Sharded tables whose logical name is a keyword
// ===================================================================

#[test]
fn test_keyword_named_shard_update_on_mysql() {
    let query = CompiledQuery::new(
        "-- shard:user:user_2024\nSELECT id, name FROM user WHERE id = @p0",
        "user",
    )
    .parameter("@p0", 5_i64)
    .key("id");

    let statement = update(
        &query,
        &[ColumnAssignment::literal("name", "x")],
        &IgnoreSet::new(),
        &Dialect::MySql,
    );
    let sql = TableNameRewriter::default()
        .intercept(statement.sql(), &Dialect::MySql)
        .unwrap();

    assert_eq!(
        sql,
        "-- shard:user:user_2024\nUPDATE `user_2024` INNER JOIN (SELECT id, name FROM user_2024 WHERE id = @b0) AS src ON `user_2024`.id = src.id SET `user_2024`.name = @s0"
    );
}

#[test]
fn test_keyword_named_shard_delete_on_postgres() {
    let query = CompiledQuery::new(
        "-- shard:key:key_2024\nSELECT id FROM key WHERE id = $1",
        "key",
    )
    .parameter("$1", 5_i64)
    .key("id");

    let statement = delete(&query, &Dialect::PostgreSql);
    let sql = TableNameRewriter::default()
        .intercept(statement.sql(), &Dialect::PostgreSql)
        .unwrap();

    assert_eq!(
        sql,
        "-- shard:key:key_2024\nDELETE FROM \"key_2024\" USING (SELECT id FROM key_2024 WHERE id = $1) AS src WHERE \"key_2024\".id = src.id"
    );
}
