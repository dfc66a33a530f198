//! Error types for the transpiler.

use thiserror::Error;

/// Errors raised while turning a query into a mutation statement or while
/// preparing a table-name rewrite.
///
/// Every variant describes a structurally invalid request. None of them is
/// transient, so callers should surface them rather than retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranspileError {
    /// The base query contains a construct the builder cannot rewrite.
    #[error("unsupported query shape on table `{table}`: {clause}")]
    UnsupportedQueryShape {
        /// Root table of the query.
        table: String,
        /// The offending clause or construct.
        clause: String,
    },

    /// The entity does not have exactly one key column.
    #[error("unsupported key shape on table `{table}`: expected one key column, found {found}")]
    UnsupportedKeyShape {
        /// Root table of the query.
        table: String,
        /// Number of key columns declared.
        found: usize,
    },

    /// The request references something the entity contract does not know,
    /// or a sharding tag is malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No column is left to assign once ignored columns are removed.
    #[error("nothing to update on table `{table}`: no column left after applying ignores")]
    EmptyMutation {
        /// Root table of the query.
        table: String,
    },

    /// The dialect has no registered statement templates.
    #[error("dialect `{0}` has no mutation templates")]
    UnsupportedDialect(String),
}

impl TranspileError {
    pub(crate) fn shape(table: &str, clause: impl Into<String>) -> Self {
        Self::UnsupportedQueryShape {
            table: String::from(table),
            clause: clause.into(),
        }
    }
}

/// Result type alias for transpiler operations.
pub type Result<T> = std::result::Result<T, TranspileError>;
