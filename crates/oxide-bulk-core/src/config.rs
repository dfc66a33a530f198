//! Transpiler configuration.

use serde::{Deserialize, Serialize};

/// How names from the caller are compared with names in SQL text and in the
/// entity contract.
///
/// Engines disagree on identifier case sensitivity (MySQL table names follow
/// the file system, SQL Server follows the collation), so the choice is made
/// by configuration instead of per dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatching {
    /// Byte-for-byte comparison.
    #[default]
    Exact,
    /// ASCII case-insensitive comparison.
    CaseInsensitive,
}

impl NameMatching {
    /// Returns true if the two names are equal under this rule.
    #[must_use]
    pub fn matches(self, a: &str, b: &str) -> bool {
        match self {
            Self::Exact => a == b,
            Self::CaseInsensitive => a.eq_ignore_ascii_case(b),
        }
    }
}

/// Settings shared by the mutation builder and the table-name rewriter.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use oxide_bulk_core::{NameMatching, TranspileConfig};
///
/// let config: TranspileConfig =
///     serde_json::from_str(r#"{ "name_matching": "case_insensitive" }"#).unwrap();
/// assert_eq!(config.name_matching, NameMatching::CaseInsensitive);
/// assert_eq!(config.source_alias, "src");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranspileConfig {
    /// Comparison rule for ignore sets, member names, key projection and
    /// sharding tags.
    pub name_matching: NameMatching,
    /// Alias given to the derived table built from the base query.
    pub source_alias: String,
    /// First field of a sharding annotation (`<marker>:<logical>:<physical>`).
    pub shard_marker: String,
}

impl Default for TranspileConfig {
    fn default() -> Self {
        Self {
            name_matching: NameMatching::Exact,
            source_alias: String::from("src"),
            shard_marker: String::from("shard"),
        }
    }
}

impl TranspileConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name comparison rule.
    #[must_use]
    pub const fn name_matching(mut self, matching: NameMatching) -> Self {
        self.name_matching = matching;
        self
    }

    /// Sets the derived-table alias.
    #[must_use]
    pub fn source_alias(mut self, alias: impl Into<String>) -> Self {
        self.source_alias = alias.into();
        self
    }

    /// Sets the sharding annotation marker.
    #[must_use]
    pub fn shard_marker(mut self, marker: impl Into<String>) -> Self {
        self.shard_marker = marker.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matching() {
        assert!(NameMatching::Exact.matches("Orders", "Orders"));
        assert!(!NameMatching::Exact.matches("Orders", "orders"));
        assert!(NameMatching::CaseInsensitive.matches("Orders", "ORDERS"));
        assert!(!NameMatching::CaseInsensitive.matches("orders", "order"));
    }

    #[test]
    fn test_defaults() {
        let config = TranspileConfig::default();
        assert_eq!(config.name_matching, NameMatching::Exact);
        assert_eq!(config.source_alias, "src");
        assert_eq!(config.shard_marker, "shard");
    }

    #[test]
    fn test_builder_methods() {
        let config = TranspileConfig::new()
            .name_matching(NameMatching::CaseInsensitive)
            .source_alias("m")
            .shard_marker("partition");
        assert_eq!(config.name_matching, NameMatching::CaseInsensitive);
        assert_eq!(config.source_alias, "m");
        assert_eq!(config.shard_marker, "partition");
    }
}
