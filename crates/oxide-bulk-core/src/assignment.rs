//! Column assignments for bulk updates.
//!
//! The caller describes "set these members to these values" as an
//! [`Initializer`]: an ordered list of member bindings. The
//! [`AssignmentExtractor`] walks it against an [`EntityContract`], resolves
//! every member to its storage column and produces [`ColumnAssignment`]s.
//! Values are never turned into SQL text; the mutation builder binds each of
//! them as a parameter.

use tracing::debug;

use crate::config::NameMatching;
use crate::entity::{Entity, EntityContract};
use crate::error::{Result, TranspileError};
use crate::value::{SqlValue, ToSqlValue};

/// Right-hand side of a member binding.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    /// A constant known when the initializer is built.
    Constant(SqlValue),
    /// A value captured from a named variable of the caller.
    Captured {
        /// Name of the captured variable.
        name: String,
        /// Its value.
        value: SqlValue,
    },
}

/// One `member = value` binding.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberBinding {
    /// Member or column name.
    pub member: String,
    /// Bound value.
    pub value: ValueExpr,
}

/// An ordered field-to-value tree describing the SET list of an update.
///
/// ```
/// use oxide_bulk_core::Initializer;
///
/// let new_name = String::from("renamed");
/// let init = Initializer::new()
///     .set("enabled", true)
///     .capture("name", "new_name", &new_name);
/// assert_eq!(init.bindings().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Initializer {
    bindings: Vec<MemberBinding>,
}

impl Initializer {
    /// Creates an empty initializer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a member to a constant.
    #[must_use]
    pub fn set(mut self, member: impl Into<String>, value: impl ToSqlValue) -> Self {
        self.bindings.push(MemberBinding {
            member: member.into(),
            value: ValueExpr::Constant(value.to_sql_value()),
        });
        self
    }

    /// Binds a member to a captured variable.
    #[must_use]
    pub fn capture(
        mut self,
        member: impl Into<String>,
        name: impl Into<String>,
        value: impl ToSqlValue,
    ) -> Self {
        self.bindings.push(MemberBinding {
            member: member.into(),
            value: ValueExpr::Captured {
                name: name.into(),
                value: value.to_sql_value(),
            },
        });
        self
    }

    /// Binds every declared member of an entity instance, in declaration
    /// order.
    #[must_use]
    pub fn from_entity<E: Entity>(entity: &E) -> Self {
        let bindings = E::FIELDS
            .iter()
            .zip(entity.values())
            .map(|(field, value)| MemberBinding {
                member: String::from(field.member),
                value: ValueExpr::Constant(value),
            })
            .collect();
        Self { bindings }
    }

    /// Bindings in source order.
    #[must_use]
    pub fn bindings(&self) -> &[MemberBinding] {
        &self.bindings
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Walks the bindings in order.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first error of the visitor.
    pub fn accept<V: InitializerVisitor>(&self, visitor: &mut V) -> Result<()> {
        self.bindings
            .iter()
            .try_for_each(|binding| visitor.visit_binding(binding))
    }
}

/// Visitor over the bindings of an [`Initializer`].
pub trait InitializerVisitor {
    /// Called once per binding, in source order.
    ///
    /// # Errors
    ///
    /// An error aborts the walk.
    fn visit_binding(&mut self, binding: &MemberBinding) -> Result<()>;
}

/// Value of a resolved assignment. Both kinds are bound as parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentValue {
    /// A constant.
    Literal(SqlValue),
    /// A captured variable.
    ParameterRef {
        /// Name of the captured variable.
        source: String,
        /// Its value.
        value: SqlValue,
    },
}

impl AssignmentValue {
    /// The value to bind.
    #[must_use]
    pub const fn value(&self) -> &SqlValue {
        match self {
            Self::Literal(value) | Self::ParameterRef { value, .. } => value,
        }
    }
}

/// One `column = value` entry of a SET list.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnAssignment {
    /// Storage column.
    pub name: String,
    /// Value to bind.
    pub value: AssignmentValue,
    /// The column is excluded from the SET list.
    pub ignored: bool,
}

impl ColumnAssignment {
    /// Creates an assignment of a constant.
    pub fn literal(name: impl Into<String>, value: impl ToSqlValue) -> Self {
        Self {
            name: name.into(),
            value: AssignmentValue::Literal(value.to_sql_value()),
            ignored: false,
        }
    }

    /// Creates an assignment of a captured variable.
    pub fn parameter(
        name: impl Into<String>,
        source: impl Into<String>,
        value: impl ToSqlValue,
    ) -> Self {
        Self {
            name: name.into(),
            value: AssignmentValue::ParameterRef {
                source: source.into(),
                value: value.to_sql_value(),
            },
            ignored: false,
        }
    }
}

/// Columns excluded from an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    names: Vec<String>,
}

impl IgnoreSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a name.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    /// Returns true if `name` is in the set under the given rule.
    #[must_use]
    pub fn contains(&self, name: &str, matching: NameMatching) -> bool {
        self.names.iter().any(|n| matching.matches(n, name))
    }

    /// Iterates over the names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Resolves initializers against an entity contract.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentExtractor<'a> {
    contract: &'a EntityContract,
    matching: NameMatching,
}

impl<'a> AssignmentExtractor<'a> {
    /// Creates an extractor for one contract.
    #[must_use]
    pub const fn new(contract: &'a EntityContract, matching: NameMatching) -> Self {
        Self { contract, matching }
    }

    /// Resolves every binding and flags the ignored ones.
    ///
    /// # Errors
    ///
    /// Returns [`TranspileError::Configuration`] if an ignore entry or a
    /// bound member is unknown to the contract, or if two bindings resolve
    /// to the same column.
    pub fn annotate(
        &self,
        initializer: &Initializer,
        ignore: &IgnoreSet,
    ) -> Result<Vec<ColumnAssignment>> {
        let ignored = ignore
            .iter()
            .map(|name| {
                self.contract
                    .resolve(name, self.matching)
                    .map(|field| field.column.clone())
                    .ok_or_else(|| {
                        TranspileError::Configuration(format!(
                            "ignored column `{name}` is not a column of `{}`",
                            self.contract.table()
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut collector = Collector {
            extractor: self,
            ignored: &ignored,
            assignments: Vec::with_capacity(initializer.bindings().len()),
        };
        initializer.accept(&mut collector)?;
        Ok(collector.assignments)
    }

    /// Resolves the bindings and drops the ignored ones.
    ///
    /// # Errors
    ///
    /// Everything [`AssignmentExtractor::annotate`] returns, plus
    /// [`TranspileError::EmptyMutation`] if no column is left.
    pub fn extract(
        &self,
        initializer: &Initializer,
        ignore: &IgnoreSet,
    ) -> Result<Vec<ColumnAssignment>> {
        let mut assignments = self.annotate(initializer, ignore)?;
        assignments.retain(|a| !a.ignored);
        if assignments.is_empty() {
            return Err(TranspileError::EmptyMutation {
                table: String::from(self.contract.table()),
            });
        }
        debug!(
            table = self.contract.table(),
            columns = ?assignments.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
            "extracted assignments"
        );
        Ok(assignments)
    }
}

struct Collector<'e, 'a> {
    extractor: &'e AssignmentExtractor<'a>,
    ignored: &'e [String],
    assignments: Vec<ColumnAssignment>,
}

impl InitializerVisitor for Collector<'_, '_> {
    fn visit_binding(&mut self, binding: &MemberBinding) -> Result<()> {
        let contract = self.extractor.contract;
        let field = contract
            .resolve(&binding.member, self.extractor.matching)
            .ok_or_else(|| {
                TranspileError::Configuration(format!(
                    "`{}` is not a member of `{}`",
                    binding.member,
                    contract.table()
                ))
            })?;

        if self.assignments.iter().any(|a| a.name == field.column) {
            return Err(TranspileError::Configuration(format!(
                "column `{}` of `{}` is assigned twice",
                field.column,
                contract.table()
            )));
        }

        let value = match &binding.value {
            ValueExpr::Constant(value) => AssignmentValue::Literal(value.clone()),
            ValueExpr::Captured { name, value } => AssignmentValue::ParameterRef {
                source: name.clone(),
                value: value.clone(),
            },
        };
        self.assignments.push(ColumnAssignment {
            name: field.column.clone(),
            value,
            ignored: self.ignored.contains(&field.column),
        });
        Ok(())
    }
}
