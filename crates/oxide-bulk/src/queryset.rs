//! QuerySet: the filtered SELECT a bulk mutation is built from.
//!
//! A QuerySet is lazy. It only becomes SQL when compiled for a dialect, and
//! the result is a [`CompiledQuery`] ready for the mutation builder: the
//! entity's columns, a WHERE clause with native markers, and one
//! `-- shard:<logical>:<physical>` line per sharding tag at its head.

use std::marker::PhantomData;

use oxide_bulk_core::{
    CompiledQuery, Dialect, Entity, Result, ShardingTag, ShardingTags, TranspileConfig,
};

use crate::query::{FilterExpr, FilterWriter, Q};

/// A lazy, chainable filter over one entity.
///
/// # Example
///
/// ```ignore
/// use oxide_bulk::{QuerySet, Q};
/// use oxide_bulk_core::ShardingTag;
///
/// let qs = QuerySet::<Order>::new()
///     .filter(Q::eq("status", "stale"))
///     .exclude(Q::eq("pinned", true))
///     .tag_with(ShardingTag::new("orders", "orders_2024"));
/// ```
#[derive(Debug)]
pub struct QuerySet<E: Entity> {
    /// Filter expressions (combined with AND)
    filters: Vec<FilterExpr>,
    /// Exclude expressions (combined with AND, then negated)
    excludes: Vec<FilterExpr>,
    /// Sharding annotations
    tags: Vec<ShardingTag>,
    /// Phantom data for the entity type
    _marker: PhantomData<E>,
}

// Manual Clone implementation to avoid E: Clone bound
impl<E: Entity> Clone for QuerySet<E> {
    fn clone(&self) -> Self {
        Self {
            filters: self.filters.clone(),
            excludes: self.excludes.clone(),
            tags: self.tags.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E: Entity> Default for QuerySet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> QuerySet<E> {
    /// Creates a QuerySet matching every row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            filters: Vec::new(),
            excludes: Vec::new(),
            tags: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Keeps rows matching `q`.
    #[must_use]
    pub fn filter(mut self, q: Q) -> Self {
        self.filters.push(q.into_expr());
        self
    }

    /// Drops rows matching `q`.
    #[must_use]
    pub fn exclude(mut self, q: Q) -> Self {
        self.excludes.push(q.into_expr());
        self
    }

    /// Routes the query to a physical table.
    #[must_use]
    pub fn tag_with(mut self, tag: ShardingTag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Sharding tags attached so far.
    #[must_use]
    pub fn tags(&self) -> &[ShardingTag] {
        &self.tags
    }

    /// Compiles the QuerySet into a SELECT for `dialect`.
    ///
    /// # Errors
    ///
    /// - [`oxide_bulk_core::TranspileError::UnsupportedDialect`] if the dialect
    ///   has no descriptor.
    /// - [`oxide_bulk_core::TranspileError::Configuration`] if a filter names
    ///   an unknown member or the tags do not validate.
    pub fn compile(&self, dialect: &Dialect, config: &TranspileConfig) -> Result<CompiledQuery> {
        let descriptor = dialect.descriptor()?;
        let contract = E::contract();
        let tags = ShardingTags::new(self.tags.iter().cloned(), config.name_matching)?;

        let mut writer = FilterWriter::new(descriptor, &contract, config.name_matching);
        let columns = contract
            .fields()
            .iter()
            .map(|f| writer.column(&f.member))
            .collect::<Result<Vec<_>>>()?;

        let mut conditions = Vec::with_capacity(self.filters.len() + self.excludes.len());
        for filter in &self.filters {
            conditions.push(writer.write(filter)?);
        }
        for exclude in &self.excludes {
            conditions.push(format!("NOT ({})", writer.write(exclude)?));
        }

        let mut sql = String::new();
        for tag in &tags {
            sql.push_str("-- ");
            sql.push_str(&tag.annotation(&config.shard_marker));
            sql.push('\n');
        }
        sql.push_str("SELECT ");
        sql.push_str(&columns.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(writer.table());
        match conditions.as_slice() {
            [] => {}
            [single] => {
                sql.push_str(" WHERE ");
                sql.push_str(single);
            }
            many => {
                sql.push_str(" WHERE ");
                let wrapped: Vec<String> = many.iter().map(|c| format!("({c})")).collect();
                sql.push_str(&wrapped.join(" AND "));
            }
        }

        Ok(CompiledQuery {
            sql,
            parameters: writer.into_parameters(),
            root_table: String::from(contract.table()),
            key_columns: contract.key_columns(),
        })
    }
}
