#![allow(dead_code)]

use oxide_bulk_core::lexer::{Lexer, TokenKind};
use oxide_bulk_core::{
    build_delete_statement, build_update_statement, ColumnAssignment, CompiledQuery, Dialect,
    IgnoreSet, MutationStatement, TranspileError,
};

pub const DIALECTS: [Dialect; 3] = [Dialect::SqlServer, Dialect::MySql, Dialect::PostgreSql];

/// The filtered `sys_function` lookup used across the scenarios, with the
/// dialect's native marker.
pub fn sys_function_query(dialect: &Dialect) -> CompiledQuery {
    let marker = if *dialect == Dialect::PostgreSql { "$1" } else { "@p0" };
    CompiledQuery::new(
        format!("SELECT id, name FROM sys_function WHERE id = {marker}"),
        "sys_function",
    )
    .parameter(marker, 42_i64)
    .key("id")
}

pub fn update(
    query: &CompiledQuery,
    assignments: &[ColumnAssignment],
    ignore: &IgnoreSet,
    dialect: &Dialect,
) -> MutationStatement {
    build_update_statement(query, assignments, ignore, dialect)
        .unwrap_or_else(|e| panic!("Failed to build update for: {}\nError: {e:?}", query.sql))
}

pub fn update_err(
    query: &CompiledQuery,
    assignments: &[ColumnAssignment],
    dialect: &Dialect,
) -> TranspileError {
    build_update_statement(query, assignments, &IgnoreSet::new(), dialect)
        .expect_err(&format!("Expected an error for: {}", query.sql))
}

pub fn delete(query: &CompiledQuery, dialect: &Dialect) -> MutationStatement {
    build_delete_statement(query, dialect)
        .unwrap_or_else(|e| panic!("Failed to build delete for: {}\nError: {e:?}", query.sql))
}

/// Markers of the parameter list, in list order.
pub fn parameter_markers(statement: &MutationStatement) -> Vec<String> {
    statement
        .parameters()
        .iter()
        .map(|p| p.marker.clone())
        .collect()
}

/// Distinct markers found by lexing the statement text again.
pub fn text_markers(statement: &MutationStatement, dialect: &Dialect) -> Vec<String> {
    let mut markers: Vec<String> = Vec::new();
    for token in Lexer::with_options(statement.sql(), dialect.lexer_options()).tokenize() {
        if let TokenKind::Placeholder(marker) = token.kind {
            if !markers.contains(&marker) {
                markers.push(marker);
            }
        }
    }
    markers
}
