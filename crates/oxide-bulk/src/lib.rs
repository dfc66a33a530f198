//! # oxide-bulk
//!
//! Bulk UPDATE and DELETE in a single round trip, on top of `oxide-bulk-core`
//! and sqlx.
//!
//! This crate provides:
//! - `Q` filters and a lazy [`QuerySet`] compiled into a native-marker SELECT
//! - Sharding through [`QuerySet::tag_with`] and the table-name rewriter
//! - The [`Executor`] trait with a sqlx-backed [`Connection`] for PostgreSQL
//!   and MySQL
//! - A [`Session`] running extract, build, rewrite and execute in order
//!
//! ## Example
//!
//! ```ignore
//! use oxide_bulk::{Connection, QuerySet, Session, Q};
//! use oxide_bulk_core::{IgnoreSet, Initializer, TranspileConfig};
//! use oxide_bulk_derive::Entity;
//!
//! #[derive(Entity)]
//! struct SysFunction {
//!     #[column(primary_key)]
//!     id: i64,
//!     name: String,
//! }
//!
//! let session = Session::new(
//!     Connection::connect("postgres://localhost/app").await?,
//!     TranspileConfig::default(),
//! );
//! let rows = session
//!     .update(
//!         &QuerySet::<SysFunction>::new().filter(Q::eq("id", 42)),
//!         &Initializer::new().set("name", "x"),
//!         &IgnoreSet::new(),
//!     )
//!     .await?;
//! ```

pub mod error;
pub mod executor;
pub mod query;
pub mod queryset;
pub mod session;

pub use error::{BulkError, Result};
pub use executor::{Connection, Executor};
pub use query::{CompareOp, FilterExpr, Q};
pub use queryset::QuerySet;
pub use session::{PreparedMutation, Session};
