//! Q objects for query filtering.
//!
//! Q objects allow building filter expressions that can be combined with
//! AND, OR, and NOT operators. Field names are entity members or storage
//! columns; they are resolved against the entity contract when the query is
//! compiled, and every value becomes a bound parameter.

use std::fmt;

use oxide_bulk_core::dialect::{DialectDescriptor, MarkerStyle};
use oxide_bulk_core::{
    EntityContract, NameMatching, Parameter, Result, SqlValue, ToSqlValue, TranspileError,
};

/// A filter expression that can be combined with other expressions.
///
/// # Example
///
/// ```
/// use oxide_bulk::Q;
///
/// // Simple equality
/// let filter = Q::eq("status", "active");
///
/// // Boolean logic
/// let filter = Q::eq("status", "active")
///     .and(Q::gt("age", 18).or(Q::eq("verified", true)));
///
/// // NOT expressions
/// let filter = Q::eq("deleted", true).not();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Q {
    expr: FilterExpr,
}

/// Filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// Simple comparison: field op value
    Comparison {
        field: String,
        op: CompareOp,
        value: SqlValue,
    },
    /// IS NULL check
    IsNull { field: String },
    /// IS NOT NULL check
    IsNotNull { field: String },
    /// IN list check
    InList {
        field: String,
        values: Vec<SqlValue>,
    },
    /// NOT IN list check
    NotInList {
        field: String,
        values: Vec<SqlValue>,
    },
    /// LIKE pattern match
    Like { field: String, pattern: String },
    /// BETWEEN range check
    Between {
        field: String,
        low: SqlValue,
        high: SqlValue,
    },
    /// AND combination
    And(Box<FilterExpr>, Box<FilterExpr>),
    /// OR combination
    Or(Box<FilterExpr>, Box<FilterExpr>),
    /// NOT negation
    Not(Box<FilterExpr>),
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (<>)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        })
    }
}

impl Q {
    fn compare<V: ToSqlValue>(field: &str, op: CompareOp, value: V) -> Self {
        Self {
            expr: FilterExpr::Comparison {
                field: String::from(field),
                op,
                value: value.to_sql_value(),
            },
        }
    }

    /// Creates an equality filter (field = value).
    pub fn eq<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    /// Creates an inequality filter (field <> value).
    pub fn ne<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    /// Creates a greater-than filter (field > value).
    pub fn gt<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    /// Creates a greater-than-or-equal filter (field >= value).
    pub fn gte<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Gte, value)
    }

    /// Creates a less-than filter (field < value).
    pub fn lt<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    /// Creates a less-than-or-equal filter (field <= value).
    pub fn lte<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Lte, value)
    }

    /// Creates an IS NULL filter.
    #[must_use]
    pub fn is_null(field: &str) -> Self {
        Self {
            expr: FilterExpr::IsNull {
                field: String::from(field),
            },
        }
    }

    /// Creates an IS NOT NULL filter.
    #[must_use]
    pub fn is_not_null(field: &str) -> Self {
        Self {
            expr: FilterExpr::IsNotNull {
                field: String::from(field),
            },
        }
    }

    /// Creates an IN list filter. An empty list matches nothing.
    pub fn in_list<V: ToSqlValue>(field: &str, values: Vec<V>) -> Self {
        Self {
            expr: FilterExpr::InList {
                field: String::from(field),
                values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            },
        }
    }

    /// Creates a NOT IN list filter. An empty list matches everything.
    pub fn not_in_list<V: ToSqlValue>(field: &str, values: Vec<V>) -> Self {
        Self {
            expr: FilterExpr::NotInList {
                field: String::from(field),
                values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            },
        }
    }

    /// Creates a LIKE filter. Use `%` for wildcard matching.
    #[must_use]
    pub fn like(field: &str, pattern: &str) -> Self {
        Self {
            expr: FilterExpr::Like {
                field: String::from(field),
                pattern: String::from(pattern),
            },
        }
    }

    /// Creates a contains filter (LIKE %value%).
    #[must_use]
    pub fn contains(field: &str, value: &str) -> Self {
        Self::like(field, &format!("%{value}%"))
    }

    /// Creates a starts-with filter (LIKE value%).
    #[must_use]
    pub fn startswith(field: &str, value: &str) -> Self {
        Self::like(field, &format!("{value}%"))
    }

    /// Creates a BETWEEN filter (low <= field <= high).
    pub fn between<V: ToSqlValue>(field: &str, low: V, high: V) -> Self {
        Self {
            expr: FilterExpr::Between {
                field: String::from(field),
                low: low.to_sql_value(),
                high: high.to_sql_value(),
            },
        }
    }

    /// Combines this filter with another using AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self {
            expr: FilterExpr::And(Box::new(self.expr), Box::new(other.expr)),
        }
    }

    /// Combines this filter with another using OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            expr: FilterExpr::Or(Box::new(self.expr), Box::new(other.expr)),
        }
    }

    /// Negates this filter with NOT.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self {
            expr: FilterExpr::Not(Box::new(self.expr)),
        }
    }

    /// Returns the internal filter expression.
    #[must_use]
    pub fn into_expr(self) -> FilterExpr {
        self.expr
    }
}

impl From<Q> for FilterExpr {
    fn from(q: Q) -> Self {
        q.expr
    }
}

/// Renders filter expressions for one dialect and entity, collecting the
/// bound values in marker order.
pub(crate) struct FilterWriter<'a> {
    descriptor: &'static DialectDescriptor,
    contract: &'a EntityContract,
    matching: NameMatching,
    table: String,
    parameters: Vec<Parameter>,
}

impl<'a> FilterWriter<'a> {
    pub(crate) fn new(
        descriptor: &'static DialectDescriptor,
        contract: &'a EntityContract,
        matching: NameMatching,
    ) -> Self {
        Self {
            descriptor,
            contract,
            matching,
            table: descriptor.identifier(contract.table()),
            parameters: Vec::new(),
        }
    }

    /// Rendered root table.
    pub(crate) fn table(&self) -> &str {
        &self.table
    }

    /// Table-qualified storage column of a member.
    pub(crate) fn column(&self, field: &str) -> Result<String> {
        let resolved = self.contract.resolve(field, self.matching).ok_or_else(|| {
            TranspileError::Configuration(format!(
                "`{field}` is not a member of `{}`",
                self.contract.table()
            ))
        })?;
        Ok(format!(
            "{}.{}",
            self.table,
            self.descriptor.identifier(&resolved.column)
        ))
    }

    fn bind(&mut self, value: SqlValue) -> String {
        let index = self.parameters.len();
        let marker = match self.descriptor.markers {
            MarkerStyle::Named => format!("@p{index}"),
            MarkerStyle::Numbered => format!("${}", index + 1),
        };
        self.parameters.push(Parameter {
            marker: marker.clone(),
            value,
        });
        marker
    }

    fn bind_all(&mut self, values: &[SqlValue]) -> String {
        values
            .iter()
            .map(|v| self.bind(v.clone()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Renders one expression.
    pub(crate) fn write(&mut self, expr: &FilterExpr) -> Result<String> {
        Ok(match expr {
            FilterExpr::Comparison { field, op, value } => {
                let column = self.column(field)?;
                format!("{column} {op} {}", self.bind(value.clone()))
            }
            FilterExpr::IsNull { field } => format!("{} IS NULL", self.column(field)?),
            FilterExpr::IsNotNull { field } => format!("{} IS NOT NULL", self.column(field)?),
            FilterExpr::InList { field, values } => {
                let column = self.column(field)?;
                if values.is_empty() {
                    String::from("1 = 0")
                } else {
                    format!("{column} IN ({})", self.bind_all(values))
                }
            }
            FilterExpr::NotInList { field, values } => {
                let column = self.column(field)?;
                if values.is_empty() {
                    String::from("1 = 1")
                } else {
                    format!("{column} NOT IN ({})", self.bind_all(values))
                }
            }
            FilterExpr::Like { field, pattern } => {
                let column = self.column(field)?;
                format!("{column} LIKE {}", self.bind(SqlValue::Text(pattern.clone())))
            }
            FilterExpr::Between { field, low, high } => {
                let column = self.column(field)?;
                let low = self.bind(low.clone());
                let high = self.bind(high.clone());
                format!("{column} BETWEEN {low} AND {high}")
            }
            FilterExpr::And(left, right) => {
                let left = self.write(left)?;
                let right = self.write(right)?;
                format!("({left}) AND ({right})")
            }
            FilterExpr::Or(left, right) => {
                let left = self.write(left)?;
                let right = self.write(right)?;
                format!("({left}) OR ({right})")
            }
            FilterExpr::Not(inner) => format!("NOT ({})", self.write(inner)?),
        })
    }

    /// Values bound so far, in marker order.
    pub(crate) fn into_parameters(self) -> Vec<Parameter> {
        self.parameters
    }
}
