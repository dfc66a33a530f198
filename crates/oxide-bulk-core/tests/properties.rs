//! Properties that hold for every dialect and input.

mod common;
use common::*;

use oxide_bulk_core::{
    AssignmentExtractor, ColumnAssignment, CompiledQuery, Dialect, EntityContract, IgnoreSet,
    Initializer, NameMatching, ShardingTag, ShardingTags, TableNameRewriter,
};

fn assignments() -> Vec<ColumnAssignment> {
    vec![
        ColumnAssignment::literal("name", "x"),
        ColumnAssignment::parameter("note", "note", "y"),
        ColumnAssignment::literal("flag", true),
    ]
}

fn two_parameter_query(dialect: &Dialect) -> CompiledQuery {
    let (a, b) = if *dialect == Dialect::PostgreSql {
        ("$1", "$2")
    } else {
        ("@p0", "@p1")
    };
    CompiledQuery::new(
        format!("SELECT t.id FROM t INNER JOIN u ON u.t_id = t.id WHERE u.kind = {a} AND t.created > {b}"),
        "t",
    )
    .parameter(a, "k")
    .parameter(b, 5_i64)
    .key("id")
}

#[test]
fn test_parameter_count_is_base_plus_assignments() {
    for dialect in &DIALECTS {
        let query = two_parameter_query(dialect);
        for ignore in [
            IgnoreSet::new(),
            IgnoreSet::new().with("note"),
            IgnoreSet::new().with("name").with("flag"),
        ] {
            let kept = assignments()
                .iter()
                .filter(|a| !ignore.contains(&a.name, NameMatching::Exact))
                .count();
            let statement = update(&query, &assignments(), &ignore, dialect);
            assert_eq!(statement.parameters().len(), kept + query.parameters.len());

            let listed = parameter_markers(&statement);
            let mut unique = listed.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), listed.len(), "duplicate markers in {listed:?}");

            let mut in_text = text_markers(&statement, dialect);
            in_text.sort();
            assert_eq!(in_text, unique);
        }
    }
}

#[test]
fn test_ignored_columns_never_reach_the_set_list() {
    for dialect in &DIALECTS {
        let ignore = IgnoreSet::new().with("note");
        let statement = update(&two_parameter_query(dialect), &assignments(), &ignore, dialect);
        assert!(!statement.sql().contains("note"), "{}", statement.sql());
    }
}

#[test]
fn test_building_twice_is_byte_identical() {
    for dialect in &DIALECTS {
        let query = two_parameter_query(dialect);
        let first = update(&query, &assignments(), &IgnoreSet::new(), dialect);
        let second = update(&query, &assignments(), &IgnoreSet::new(), dialect);
        assert_eq!(first, second);
        assert_eq!(delete(&query, dialect), delete(&query, dialect));
    }
}

#[test]
fn test_hostile_values_are_only_bound() {
    let hostile = "'); DROP TABLE t; --";
    for dialect in &DIALECTS {
        let statement = update(
            &two_parameter_query(dialect),
            &[ColumnAssignment::literal("name", hostile)],
            &IgnoreSet::new(),
            dialect,
        );
        assert!(!statement.sql().contains("DROP"));
    }
}

#[test]
fn test_projection_and_whole_instance_agree() {
    struct SysFunction {
        id: i64,
        name: String,
    }

    impl oxide_bulk_core::Entity for SysFunction {
        const TABLE: &'static str = "sys_function";
        const FIELDS: &'static [oxide_bulk_core::FieldDef] = &[
            oxide_bulk_core::FieldDef {
                member: "id",
                column: "id",
                primary_key: true,
            },
            oxide_bulk_core::FieldDef {
                member: "name",
                column: "name",
                primary_key: false,
            },
        ];

        fn values(&self) -> Vec<oxide_bulk_core::SqlValue> {
            vec![
                oxide_bulk_core::SqlValue::Int(self.id),
                oxide_bulk_core::SqlValue::Text(self.name.clone()),
            ]
        }
    }

    let contract: EntityContract = <SysFunction as oxide_bulk_core::Entity>::contract();
    let extractor = AssignmentExtractor::new(&contract, NameMatching::Exact);
    let ignore = IgnoreSet::new().with("id");

    let whole = extractor
        .extract(
            &Initializer::from_entity(&SysFunction {
                id: 1,
                name: String::from("x"),
            }),
            &ignore,
        )
        .unwrap();
    let projection = extractor
        .extract(&Initializer::new().set("id", 1_i64).set("name", "x"), &ignore)
        .unwrap();
    assert_eq!(whole, projection);
}

// ===================================================================
// Table-name rewriter
// ===================================================================

#[test]
fn test_rewrite_is_idempotent() {
    let rewriter = TableNameRewriter::default();
    let tags = ShardingTags::new(
        [
            ShardingTag::new("orders", "orders_2024"),
            ShardingTag::new("order", "order_2024"),
        ],
        NameMatching::Exact,
    )
    .unwrap();
    let texts = [
        "SELECT * FROM orders WHERE note = 'orders'",
        "UPDATE \"order\" SET x = $1 FROM (SELECT id FROM \"order\") AS src WHERE \"order\".id = src.id",
        "DELETE FROM order_items WHERE order_id IN (SELECT id FROM orders)",
    ];
    for dialect in &DIALECTS {
        for text in texts {
            let once = rewriter.rewrite(text, &tags, dialect);
            assert_eq!(rewriter.rewrite(&once, &tags, dialect), once);
        }
    }
}

#[test]
fn test_rewrite_leaves_longer_identifiers_alone() {
    let rewriter = TableNameRewriter::default();
    let tags = ShardingTags::new([ShardingTag::new("orders", "orders_2024")], NameMatching::Exact)
        .unwrap();
    for dialect in &DIALECTS {
        let out = rewriter.rewrite(
            "SELECT o.id FROM orders o JOIN order_items i ON i.order_id = o.id JOIN orders_archive a ON a.id = o.id",
            &tags,
            dialect,
        );
        assert_eq!(
            out,
            "SELECT o.id FROM orders_2024 o JOIN order_items i ON i.order_id = o.id JOIN orders_archive a ON a.id = o.id"
        );
    }
}
