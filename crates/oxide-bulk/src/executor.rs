//! Execution of rendered statements.
//!
//! The [`Executor`] trait is the only place a statement meets a database.
//! [`Connection`] implements it over sqlx pools for PostgreSQL and MySQL;
//! other engines (SQL Server has no sqlx driver) plug in by implementing the
//! trait themselves.

use oxide_bulk_core::value::to_positional;
use oxide_bulk_core::{Dialect, Parameter, SqlValue, TranspileError};
use sqlx::mysql::{MySqlArguments, MySqlPool};
use sqlx::postgres::{PgArguments, PgPool};
use sqlx::query::Query;
use tracing::debug;
use url::Url;

use crate::error::{BulkError, Result};

/// Runs a non-query statement and reports the affected row count.
#[allow(async_fn_in_trait)]
pub trait Executor {
    /// Dialect of the connection, fixed for its lifetime.
    fn dialect(&self) -> Dialect;

    /// Executes `sql` with `parameters` bound to its markers.
    async fn execute(&self, sql: &str, parameters: &[Parameter]) -> Result<u64>;
}

/// A pooled sqlx connection.
#[derive(Debug, Clone)]
pub enum Connection {
    /// PostgreSQL pool.
    Postgres(PgPool),
    /// MySQL pool.
    MySql(MySqlPool),
}

impl Connection {
    /// Connects to the database at `url`; the scheme picks the driver.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::Url`] for a malformed URL,
    /// [`BulkError::UnsupportedScheme`] when no driver matches the scheme,
    /// and [`BulkError::Database`] when the pool cannot connect.
    pub async fn connect(url: &str) -> Result<Self> {
        let parsed = Url::parse(url)?;

        match Dialect::from_provider(parsed.scheme()) {
            Dialect::PostgreSql => Ok(Self::Postgres(PgPool::connect(url).await?)),
            Dialect::MySql => Ok(Self::MySql(MySqlPool::connect(url).await?)),
            Dialect::SqlServer | Dialect::Unsupported(_) => {
                Err(BulkError::UnsupportedScheme(String::from(parsed.scheme())))
            }
        }
    }
}

impl Executor for Connection {
    fn dialect(&self) -> Dialect {
        match self {
            Self::Postgres(_) => Dialect::PostgreSql,
            Self::MySql(_) => Dialect::MySql,
        }
    }

    async fn execute(&self, sql: &str, parameters: &[Parameter]) -> Result<u64> {
        match self {
            Self::Postgres(pool) => {
                let mut query = sqlx::query(sql);
                for value in numbered_values(parameters)? {
                    query = bind_pg(query, value);
                }
                Ok(query.execute(pool).await?.rows_affected())
            }
            Self::MySql(pool) => {
                let (positional, values) =
                    to_positional(sql, parameters, Dialect::MySql.lexer_options())?;
                debug!(sql = %positional, "converted markers to positional");
                let mut query = sqlx::query(&positional);
                for value in values {
                    query = bind_mysql(query, value);
                }
                Ok(query.execute(pool).await?.rows_affected())
            }
        }
    }
}

/// Orders the values of `$n` markers by `n`, which must run from 1 without
/// gaps.
fn numbered_values(parameters: &[Parameter]) -> Result<Vec<SqlValue>> {
    let mut numbered = parameters
        .iter()
        .map(|p| {
            p.marker
                .strip_prefix('$')
                .and_then(|n| n.parse::<usize>().ok())
                .map(|n| (n, p.value.clone()))
                .ok_or_else(|| {
                    TranspileError::Configuration(format!(
                        "`{}` is not a numbered marker",
                        p.marker
                    ))
                })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    numbered.sort_by_key(|(n, _)| *n);

    if numbered.iter().enumerate().any(|(i, (n, _))| *n != i + 1) {
        return Err(TranspileError::Configuration(String::from(
            "numbered markers must run from $1 without gaps",
        ))
        .into());
    }
    Ok(numbered.into_iter().map(|(_, value)| value).collect())
}

/// Binds a SqlValue parameter to a PostgreSQL query.
fn bind_pg(
    query: Query<'_, sqlx::Postgres, PgArguments>,
    value: SqlValue,
) -> Query<'_, sqlx::Postgres, PgArguments> {
    match value {
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

/// Binds a SqlValue parameter to a MySQL query.
fn bind_mysql(
    query: Query<'_, sqlx::MySql, MySqlArguments>,
    value: SqlValue,
) -> Query<'_, sqlx::MySql, MySqlArguments> {
    match value {
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}
