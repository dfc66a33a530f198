//! Entity contracts.
//!
//! An entity contract maps the members a caller writes (`name`, `isActive`)
//! to the storage columns they live in (`name`, `is_active`) and says which
//! column is the key. Contracts are usually produced by
//! `#[derive(Entity)]`, but can be built by hand for tables without a Rust
//! type.

use crate::config::NameMatching;
use crate::value::SqlValue;

/// Compile-time description of one entity member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Member name as written by the caller.
    pub member: &'static str,
    /// Storage column.
    pub column: &'static str,
    /// Part of the key.
    pub primary_key: bool,
}

/// A type mapped to one table.
///
/// # Example
///
/// ```ignore
/// use oxide_bulk_derive::Entity;
///
/// #[derive(Entity)]
/// #[entity(table = "sys_function")]
/// struct SysFunction {
///     #[column(primary_key)]
///     id: i64,
///     name: String,
///     #[column(name = "is_enabled")]
///     enabled: bool,
/// }
/// ```
pub trait Entity {
    /// Table name.
    const TABLE: &'static str;

    /// Declared members, in declaration order.
    const FIELDS: &'static [FieldDef];

    /// Values of every declared member, in `FIELDS` order.
    fn values(&self) -> Vec<SqlValue>;

    /// Runtime contract of this entity.
    #[must_use]
    fn contract() -> EntityContract {
        EntityContract::from_fields(Self::TABLE, Self::FIELDS)
    }
}

/// One resolved member of a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Member name.
    pub member: String,
    /// Storage column.
    pub column: String,
    /// Part of the key.
    pub primary_key: bool,
}

/// Runtime entity contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityContract {
    table: String,
    fields: Vec<Field>,
}

impl EntityContract {
    /// Creates an empty contract for a table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
        }
    }

    /// Builds a contract from static field definitions.
    #[must_use]
    pub fn from_fields(table: &str, fields: &[FieldDef]) -> Self {
        Self {
            table: String::from(table),
            fields: fields
                .iter()
                .map(|f| Field {
                    member: String::from(f.member),
                    column: String::from(f.column),
                    primary_key: f.primary_key,
                })
                .collect(),
        }
    }

    /// Adds a member stored in `column`.
    #[must_use]
    pub fn field(mut self, member: impl Into<String>, column: impl Into<String>) -> Self {
        self.fields.push(Field {
            member: member.into(),
            column: column.into(),
            primary_key: false,
        });
        self
    }

    /// Adds a key member stored in `column`.
    #[must_use]
    pub fn key(mut self, member: impl Into<String>, column: impl Into<String>) -> Self {
        self.fields.push(Field {
            member: member.into(),
            column: column.into(),
            primary_key: true,
        });
        self
    }

    /// Table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// All fields, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Storage columns of the key.
    #[must_use]
    pub fn key_columns(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.primary_key)
            .map(|f| f.column.clone())
            .collect()
    }

    /// Storage columns of every field.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.column.as_str()).collect()
    }

    /// Finds a field by member name, falling back to its column name.
    #[must_use]
    pub fn resolve(&self, name: &str, matching: NameMatching) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| matching.matches(&f.member, name))
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|f| matching.matches(&f.column, name))
            })
    }
}
