//! Session: runs bulk mutations against an executor.
//!
//! Every mutation goes through the same pipeline: the QuerySet is compiled
//! for the executor's dialect, the initializer is resolved into column
//! assignments, the builder wraps the SELECT into one UPDATE or DELETE, and
//! the table-name rewriter routes sharded tables before the statement is
//! sent.

use oxide_bulk_core::{
    AssignmentExtractor, Entity, IgnoreSet, Initializer, MutationBuilder, MutationStatement,
    Parameter, TableNameRewriter, TranspileConfig,
};
use tracing::{debug, info};

use crate::error::Result;
use crate::executor::Executor;
use crate::queryset::QuerySet;

/// A statement ready to be sent, after table-name rewriting.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedMutation {
    /// Statement text.
    pub sql: String,
    /// Bound values in parameter-list order.
    pub parameters: Vec<Parameter>,
}

/// Bulk update and delete over one executor.
#[derive(Debug)]
pub struct Session<X: Executor> {
    executor: X,
    config: TranspileConfig,
    builder: MutationBuilder,
    rewriter: TableNameRewriter,
}

impl<X: Executor> Session<X> {
    /// Creates a session sharing `config` between the builder and the
    /// rewriter.
    pub fn new(executor: X, config: TranspileConfig) -> Self {
        Self {
            executor,
            builder: MutationBuilder::new(config.clone()),
            rewriter: TableNameRewriter::new(config.clone()),
            config,
        }
    }

    /// Replaces the table-name rewriter.
    #[must_use]
    pub fn with_rewriter(mut self, rewriter: TableNameRewriter) -> Self {
        self.rewriter = rewriter;
        self
    }

    /// Returns the underlying executor.
    pub const fn executor(&self) -> &X {
        &self.executor
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &TranspileConfig {
        &self.config
    }

    /// Renders the UPDATE for `queryset` without running it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BulkError::Transpile`] when the QuerySet, the
    /// initializer or the ignore set cannot produce a statement.
    pub fn render_update<E: Entity>(
        &self,
        queryset: &QuerySet<E>,
        initializer: &Initializer,
        ignore: &IgnoreSet,
    ) -> Result<PreparedMutation> {
        let dialect = self.executor.dialect();
        let query = queryset.compile(&dialect, &self.config)?;
        let contract = E::contract();
        let assignments = AssignmentExtractor::new(&contract, self.config.name_matching)
            .extract(initializer, ignore)?;
        // The extractor already dropped ignored members.
        let statement =
            self.builder
                .build_update(&query, &assignments, &IgnoreSet::new(), &dialect)?;
        self.route(statement, &dialect)
    }

    /// Renders the DELETE for `queryset` without running it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BulkError::Transpile`] when the QuerySet cannot be
    /// wrapped into a DELETE.
    pub fn render_delete<E: Entity>(&self, queryset: &QuerySet<E>) -> Result<PreparedMutation> {
        let dialect = self.executor.dialect();
        let query = queryset.compile(&dialect, &self.config)?;
        let statement = self.builder.build_delete(&query, &dialect)?;
        self.route(statement, &dialect)
    }

    /// Sets the bound members on every row the QuerySet selects.
    ///
    /// # Errors
    ///
    /// Everything [`Session::render_update`] returns, plus the executor's
    /// errors.
    pub async fn update<E: Entity>(
        &self,
        queryset: &QuerySet<E>,
        initializer: &Initializer,
        ignore: &IgnoreSet,
    ) -> Result<u64> {
        let prepared = self.render_update(queryset, initializer, ignore)?;
        self.run(E::TABLE, "update", &prepared).await
    }

    /// Copies every field of `entity` onto the rows the QuerySet selects.
    ///
    /// Key columns are never assigned; the rest of `ignore` applies as
    /// usual.
    ///
    /// # Errors
    ///
    /// See [`Session::update`].
    pub async fn update_with_entity<E: Entity>(
        &self,
        queryset: &QuerySet<E>,
        entity: &E,
        ignore: &IgnoreSet,
    ) -> Result<u64> {
        let matching = self.config.name_matching;
        let ignore = E::contract()
            .key_columns()
            .into_iter()
            .fold(ignore.clone(), |set, key| {
                if set.contains(&key, matching) {
                    set
                } else {
                    set.with(key)
                }
            });
        self.update(queryset, &Initializer::from_entity(entity), &ignore)
            .await
    }

    /// Deletes every row the QuerySet selects.
    ///
    /// # Errors
    ///
    /// Everything [`Session::render_delete`] returns, plus the executor's
    /// errors.
    pub async fn delete<E: Entity>(&self, queryset: &QuerySet<E>) -> Result<u64> {
        let prepared = self.render_delete(queryset)?;
        self.run(E::TABLE, "delete", &prepared).await
    }

    /// Routes arbitrary command text through the rewriter, then runs it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BulkError::Transpile`] for malformed sharding
    /// annotations, plus the executor's errors.
    pub async fn execute(&self, sql: &str, parameters: &[Parameter]) -> Result<u64> {
        let dialect = self.executor.dialect();
        let routed = self.rewriter.intercept(sql, &dialect)?;
        debug!(dialect = %dialect, sql = %routed, "executing command");
        self.executor.execute(&routed, parameters).await
    }

    fn route(
        &self,
        statement: MutationStatement,
        dialect: &oxide_bulk_core::Dialect,
    ) -> Result<PreparedMutation> {
        let (sql, parameters) = statement.into_parts();
        let sql = self.rewriter.intercept(&sql, dialect)?;
        Ok(PreparedMutation { sql, parameters })
    }

    async fn run(&self, table: &str, operation: &str, prepared: &PreparedMutation) -> Result<u64> {
        debug!(
            table,
            operation,
            sql = %prepared.sql,
            parameters = prepared.parameters.len(),
            "executing bulk mutation"
        );
        let rows = self
            .executor
            .execute(&prepared.sql, &prepared.parameters)
            .await?;
        info!(table, operation, rows, "bulk mutation applied");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_bulk_core::{Dialect, FieldDef, SqlValue};

    struct Offline(Dialect);

    impl Executor for Offline {
        fn dialect(&self) -> Dialect {
            self.0.clone()
        }

        async fn execute(&self, _sql: &str, _parameters: &[Parameter]) -> Result<u64> {
            Ok(0)
        }
    }

    struct Widget;

    impl Entity for Widget {
        const TABLE: &'static str = "widgets";
        const FIELDS: &'static [FieldDef] = &[
            FieldDef {
                member: "id",
                column: "id",
                primary_key: true,
            },
            FieldDef {
                member: "label",
                column: "label",
                primary_key: false,
            },
        ];

        fn values(&self) -> Vec<SqlValue> {
            vec![SqlValue::Int(1), SqlValue::Text(String::from("w"))]
        }
    }

    #[test]
    fn test_render_update_on_sqlserver() {
        let session = Session::new(Offline(Dialect::SqlServer), TranspileConfig::default());
        let prepared = session
            .render_update(
                &QuerySet::<Widget>::new().filter(crate::Q::eq("id", 3)),
                &Initializer::new().set("label", "x"),
                &IgnoreSet::new(),
            )
            .unwrap();
        assert_eq!(
            prepared.sql,
            "UPDATE widgets SET label = @s0 FROM (SELECT widgets.id, widgets.label FROM widgets WHERE widgets.id = @b0) AS src WHERE widgets.id = src.id"
        );
        let markers: Vec<_> = prepared.parameters.iter().map(|p| p.marker.as_str()).collect();
        assert_eq!(markers, vec!["@s0", "@b0"]);
    }

    #[test]
    fn test_render_delete_routes_shards() {
        let session = Session::new(Offline(Dialect::PostgreSql), TranspileConfig::default());
        let qs = QuerySet::<Widget>::new()
            .tag_with(oxide_bulk_core::ShardingTag::new("widgets", "widgets_eu"));
        let prepared = session.render_delete(&qs).unwrap();
        assert!(prepared.sql.starts_with("-- shard:widgets:widgets_eu\n"));
        assert!(prepared
            .sql
            .contains("DELETE FROM widgets_eu USING (SELECT widgets_eu.id, widgets_eu.label FROM widgets_eu) AS src"));
        assert!(!prepared.sql.contains(" widgets."));
    }
}
