//! Mutation builder.
//!
//! Wraps a validated base SELECT into one UPDATE or DELETE statement for a
//! dialect. The base query becomes a derived table joined back to the root
//! table on the key column, so matching rows are never loaded by the caller.
//!
//! Markers are renamed so the two parameter sources cannot collide: SET
//! values use the `s` namespace (`@s0`, `@s1`, ...) and the base query's own
//! parameters move to the `b` namespace (`@b0`, ...). PostgreSQL numbers all
//! of them, assignments first (`$1..$k`, then `$k+1..`).

use tracing::debug;

use crate::assignment::{ColumnAssignment, IgnoreSet};
use crate::config::TranspileConfig;
use crate::dialect::{Dialect, DialectDescriptor, Namespace, Template, TemplateArgs};
use crate::error::{Result, TranspileError};
use crate::query::{BaseSelect, CompiledQuery};
use crate::value::Parameter;

/// A rendered mutation and the values it binds.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationStatement {
    sql: String,
    parameters: Vec<Parameter>,
}

impl MutationStatement {
    /// SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound parameters, assignment values first.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Splits the statement into its text and parameters.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<Parameter>) {
        (self.sql, self.parameters)
    }
}

/// Builds UPDATE and DELETE statements from compiled queries.
///
/// The builder is stateless apart from its configuration and can be shared
/// between threads.
#[derive(Debug, Clone, Default)]
pub struct MutationBuilder {
    config: TranspileConfig,
}

impl MutationBuilder {
    /// Creates a builder.
    #[must_use]
    pub const fn new(config: TranspileConfig) -> Self {
        Self { config }
    }

    /// The builder's configuration.
    #[must_use]
    pub const fn config(&self) -> &TranspileConfig {
        &self.config
    }

    /// Builds an UPDATE setting `assignments` on every row `query` selects.
    ///
    /// Assignments flagged `ignored` or named in `ignore` are left out.
    ///
    /// # Errors
    ///
    /// - [`TranspileError::UnsupportedDialect`] if the dialect has no
    ///   templates.
    /// - [`TranspileError::UnsupportedKeyShape`] unless the query has exactly
    ///   one key column.
    /// - [`TranspileError::UnsupportedQueryShape`] if the base query cannot
    ///   be wrapped.
    /// - [`TranspileError::Configuration`] if a column is assigned twice.
    /// - [`TranspileError::EmptyMutation`] if no assignment is left.
    pub fn build_update(
        &self,
        query: &CompiledQuery,
        assignments: &[ColumnAssignment],
        ignore: &IgnoreSet,
        dialect: &Dialect,
    ) -> Result<MutationStatement> {
        let matching = self.config.name_matching;
        let parts = self.prepare(query, dialect)?;

        if let Some(unknown) = ignore.iter().find(|name| {
            !assignments.iter().any(|a| matching.matches(&a.name, name))
                && !query.key_columns.iter().any(|k| matching.matches(k, name))
        }) {
            return Err(TranspileError::Configuration(format!(
                "ignored column `{unknown}` is neither assigned nor a key of `{}`",
                query.root_table
            )));
        }

        let kept: Vec<&ColumnAssignment> = assignments
            .iter()
            .filter(|a| !a.ignored && !ignore.contains(&a.name, matching))
            .collect();
        if kept.is_empty() {
            return Err(TranspileError::EmptyMutation {
                table: query.root_table.clone(),
            });
        }
        for (i, assignment) in kept.iter().enumerate() {
            if kept[..i].iter().any(|a| matching.matches(&a.name, &assignment.name)) {
                return Err(TranspileError::Configuration(format!(
                    "column `{}` of `{}` is assigned twice",
                    assignment.name, query.root_table
                )));
            }
        }

        let descriptor = parts.descriptor;
        let mut parameters = Vec::with_capacity(kept.len() + query.parameters.len());
        let mut set_list = Vec::with_capacity(kept.len());
        for (i, assignment) in kept.iter().enumerate() {
            let marker = descriptor.marker(Namespace::Assignment, i, kept.len());
            let column = descriptor.identifier(&assignment.name);
            if descriptor.qualify_set_targets {
                set_list.push(format!("{}.{column} = {marker}", parts.table));
            } else {
                set_list.push(format!("{column} = {marker}"));
            }
            parameters.push(Parameter {
                marker,
                value: assignment.value.value().clone(),
            });
        }

        let statement = parts.render(
            query,
            &descriptor.update,
            &set_list.join(", "),
            kept.len(),
            parameters,
        );
        debug!(
            table = %query.root_table,
            dialect = descriptor.name,
            sql = %statement.sql,
            parameters = statement.parameters.len(),
            "built update statement"
        );
        Ok(statement)
    }

    /// Builds a DELETE removing every row `query` selects.
    ///
    /// # Errors
    ///
    /// Same as [`MutationBuilder::build_update`], except that there are no
    /// assignments to check.
    pub fn build_delete(&self, query: &CompiledQuery, dialect: &Dialect) -> Result<MutationStatement> {
        let parts = self.prepare(query, dialect)?;
        let descriptor = parts.descriptor;
        let statement = parts.render(query, &descriptor.delete, "", 0, Vec::new());
        debug!(
            table = %query.root_table,
            dialect = descriptor.name,
            sql = %statement.sql,
            parameters = statement.parameters.len(),
            "built delete statement"
        );
        Ok(statement)
    }

    fn prepare<'q>(&self, query: &'q CompiledQuery, dialect: &Dialect) -> Result<Parts<'q>> {
        let descriptor = dialect.descriptor()?;

        let [key] = query.key_columns.as_slice() else {
            return Err(TranspileError::UnsupportedKeyShape {
                table: query.root_table.clone(),
                found: query.key_columns.len(),
            });
        };

        for (i, parameter) in query.parameters.iter().enumerate() {
            if query.parameters[..i].iter().any(|p| p.marker == parameter.marker) {
                return Err(TranspileError::shape(
                    &query.root_table,
                    format!("marker `{}` is bound twice", parameter.marker),
                ));
            }
        }

        let base = BaseSelect::analyze(query, key, descriptor.lexer, self.config.name_matching)?;

        Ok(Parts {
            descriptor,
            base,
            table: descriptor.identifier(&query.root_table),
            key: descriptor.identifier(key),
            alias: descriptor.identifier(&self.alias_for(&query.root_table)),
        })
    }

    /// The derived-table alias, suffixed until it differs from the root
    /// table's name.
    fn alias_for(&self, table: &str) -> String {
        let short = table.rsplit('.').next().unwrap_or(table);
        let collides =
            |alias: &str| alias.eq_ignore_ascii_case(table) || alias.eq_ignore_ascii_case(short);

        let base = self.config.source_alias.as_str();
        if !collides(base) {
            return String::from(base);
        }
        (0_usize..)
            .map(|n| format!("{base}_{n}"))
            .find(|alias| !collides(alias))
            .unwrap_or_else(|| String::from(base))
    }
}

/// Everything a template needs, resolved once per statement.
struct Parts<'q> {
    descriptor: &'static DialectDescriptor,
    base: BaseSelect<'q>,
    table: String,
    key: String,
    alias: String,
}

impl Parts<'_> {
    /// Renames the base query's markers, renders the template and appends
    /// the base parameters after `parameters`.
    fn render(
        self,
        query: &CompiledQuery,
        template: &Template,
        assignments: &str,
        assignment_count: usize,
        mut parameters: Vec<Parameter>,
    ) -> MutationStatement {
        let descriptor = self.descriptor;
        let base_marker = |index: usize| descriptor.marker(Namespace::Base, index, assignment_count);

        let body = self.base.body;
        let mut base_select = String::with_capacity(body.len() + 8);
        let mut copied = 0;
        for (span, index) in &self.base.markers {
            base_select.push_str(&body[copied..span.start]);
            base_select.push_str(&base_marker(*index));
            copied = span.end;
        }
        base_select.push_str(&body[copied..]);

        parameters.extend(query.parameters.iter().enumerate().map(|(i, p)| Parameter {
            marker: base_marker(i),
            value: p.value.clone(),
        }));

        let mut sql = self.base.header;
        sql.push_str(&template.render(&TemplateArgs {
            table: &self.table,
            alias: &self.alias,
            key: &self.key,
            base_select: &base_select,
            assignments,
        }));

        MutationStatement { sql, parameters }
    }
}

/// Builds an UPDATE with the default configuration.
///
/// # Errors
///
/// See [`MutationBuilder::build_update`].
pub fn build_update_statement(
    query: &CompiledQuery,
    assignments: &[ColumnAssignment],
    ignore: &IgnoreSet,
    dialect: &Dialect,
) -> Result<MutationStatement> {
    MutationBuilder::default().build_update(query, assignments, ignore, dialect)
}

/// Builds a DELETE with the default configuration.
///
/// # Errors
///
/// See [`MutationBuilder::build_delete`].
pub fn build_delete_statement(query: &CompiledQuery, dialect: &Dialect) -> Result<MutationStatement> {
    MutationBuilder::default().build_delete(query, dialect)
}
