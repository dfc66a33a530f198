//! # oxide-bulk-core
//!
//! Turns a filtered SELECT into a single UPDATE or DELETE statement, and
//! rewrites logical table names into physical (sharded) ones.
//!
//! This crate provides:
//! - An assignment extractor resolving `member = value` bindings against an
//!   entity contract
//! - Per-engine dialect descriptors (SQL Server, MySQL, PostgreSQL)
//! - A mutation builder wrapping the SELECT as a derived table joined back on
//!   the key column
//! - A token-level table-name rewriter driven by `shard:` annotations
//!
//! Nothing here performs I/O; every type is `Send + Sync`.
//!
//! ## Bulk update
//!
//! ```rust
//! use oxide_bulk_core::{
//!     build_update_statement, AssignmentExtractor, CompiledQuery, Dialect, EntityContract,
//!     IgnoreSet, Initializer, NameMatching,
//! };
//!
//! let contract = EntityContract::new("sys_function")
//!     .key("id", "id")
//!     .field("name", "name");
//! let query = CompiledQuery::new("SELECT id, name FROM sys_function WHERE id = @p0", "sys_function")
//!     .parameter("@p0", 7_i64)
//!     .key("id");
//!
//! let assignments = AssignmentExtractor::new(&contract, NameMatching::Exact)
//!     .extract(&Initializer::new().set("name", "x"), &IgnoreSet::new())
//!     .unwrap();
//! let statement =
//!     build_update_statement(&query, &assignments, &IgnoreSet::new(), &Dialect::SqlServer).unwrap();
//!
//! assert_eq!(
//!     statement.sql(),
//!     "UPDATE sys_function SET name = @s0 FROM (SELECT id, name FROM sys_function WHERE id = @b0) AS src WHERE sys_function.id = src.id"
//! );
//! ```
//!
//! ## SQL Injection Prevention
//!
//! Values are always bound. The text of a value never reaches the statement:
//!
//! ```rust
//! use oxide_bulk_core::{build_update_statement, ColumnAssignment, CompiledQuery, Dialect, IgnoreSet};
//!
//! let query = CompiledQuery::new("SELECT id FROM users", "users").key("id");
//! let hostile = "'; DROP TABLE users; --";
//! let statement = build_update_statement(
//!     &query,
//!     &[ColumnAssignment::literal("name", hostile)],
//!     &IgnoreSet::new(),
//!     &Dialect::PostgreSql,
//! )
//! .unwrap();
//!
//! assert!(!statement.sql().contains("DROP"));
//! assert_eq!(statement.parameters().len(), 1);
//! ```

pub mod assignment;
pub mod config;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod lexer;
pub mod mutation;
pub mod query;
pub mod shard;
pub mod value;

pub use assignment::{
    AssignmentExtractor, AssignmentValue, ColumnAssignment, IgnoreSet, Initializer,
    InitializerVisitor, MemberBinding, ValueExpr,
};
pub use config::{NameMatching, TranspileConfig};
pub use dialect::{Dialect, DialectDescriptor};
pub use entity::{Entity, EntityContract, Field, FieldDef};
pub use error::{Result, TranspileError};
pub use mutation::{build_delete_statement, build_update_statement, MutationBuilder, MutationStatement};
pub use query::CompiledQuery;
pub use shard::{ShardingTag, ShardingTags, TableNameRewriter};
pub use value::{Parameter, SqlValue, ToSqlValue};
