//! SQL values and bound parameters.
//!
//! Values only ever reach the database as bound parameters. A [`SqlValue`]
//! has no inline SQL rendering.

use serde::Serialize;

use crate::error::{Result, TranspileError};
use crate::lexer::{Lexer, LexerOptions, TokenKind};

/// A SQL value that can be bound to a parameter marker.
///
/// Serializes as the plain JSON value (`null`, `true`, `42`, `"x"`, blobs as
/// a byte array).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

macro_rules! impl_to_sql_value_int {
    ($($ty:ty),+) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }
        )+
    };
}

impl_to_sql_value_int!(i8, i16, i32, u8, u16, u32);

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for &String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        self.map_or(SqlValue::Null, ToSqlValue::to_sql_value)
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

/// A value bound to one marker of a statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// The marker exactly as written in the SQL text (`@p0`, `$1`).
    pub marker: String,
    /// The bound value.
    pub value: SqlValue,
}

impl Parameter {
    /// Creates a parameter.
    pub fn new(marker: impl Into<String>, value: impl ToSqlValue) -> Self {
        Self {
            marker: marker.into(),
            value: value.to_sql_value(),
        }
    }
}

/// Rewrites every marker of `sql` into a positional `?` and returns the
/// values in the order the markers appear.
///
/// Drivers that only understand positional markers (MySQL through sqlx) need
/// this: the MySQL templates place the base query's markers before the SET
/// markers in the text, so list order and text order differ. A marker that
/// appears twice binds its value twice.
///
/// # Errors
///
/// Returns [`TranspileError::Configuration`] if the text uses a marker that
/// has no parameter.
pub fn to_positional(
    sql: &str,
    parameters: &[Parameter],
    options: LexerOptions,
) -> Result<(String, Vec<SqlValue>)> {
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::with_capacity(parameters.len());
    let mut copied = 0;

    for token in Lexer::with_options(sql, options.keep_comments(false)).tokenize() {
        let TokenKind::Placeholder(marker) = &token.kind else {
            continue;
        };
        let parameter = parameters
            .iter()
            .find(|p| &p.marker == marker)
            .ok_or_else(|| {
                TranspileError::Configuration(format!("marker `{marker}` has no bound value"))
            })?;
        out.push_str(&sql[copied..token.span.start]);
        out.push('?');
        copied = token.span.end;
        values.push(parameter.value.clone());
    }
    out.push_str(&sql[copied..]);

    Ok((out, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_serialize_as_plain_json() {
        let params = vec![
            Parameter::new("@s0", "x"),
            Parameter::new("@s1", None::<i64>),
            Parameter::new("$1", 7_i64),
            Parameter::new("$2", vec![1_u8, 2]),
        ];
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            serde_json::json!([
                { "marker": "@s0", "value": "x" },
                { "marker": "@s1", "value": null },
                { "marker": "$1", "value": 7 },
                { "marker": "$2", "value": [1, 2] },
            ])
        );
    }

    #[test]
    fn test_to_sql_value_conversions() {
        assert_eq!(true.to_sql_value(), SqlValue::Bool(true));
        assert_eq!(42_i32.to_sql_value(), SqlValue::Int(42));
        assert_eq!(7_u8.to_sql_value(), SqlValue::Int(7));
        assert_eq!(2.5_f64.to_sql_value(), SqlValue::Float(2.5));
        assert_eq!("x".to_sql_value(), SqlValue::Text(String::from("x")));
        assert_eq!(None::<i32>.to_sql_value(), SqlValue::Null);
        assert_eq!(Some(42_i64).to_sql_value(), SqlValue::Int(42));
        assert_eq!(vec![1_u8, 2].to_sql_value(), SqlValue::Blob(vec![1, 2]));
    }

    #[test]
    fn test_to_positional_follows_text_order() {
        let params = vec![Parameter::new("@s0", "x"), Parameter::new("@b0", 7_i64)];
        let (sql, values) = to_positional(
            "UPDATE t INNER JOIN (SELECT id FROM t WHERE id = @b0) AS src ON t.id = src.id SET t.name = @s0",
            &params,
            LexerOptions::default(),
        )
        .unwrap();
        assert_eq!(
            sql,
            "UPDATE t INNER JOIN (SELECT id FROM t WHERE id = ?) AS src ON t.id = src.id SET t.name = ?"
        );
        assert_eq!(
            values,
            vec![SqlValue::Int(7), SqlValue::Text(String::from("x"))]
        );
    }

    #[test]
    fn test_to_positional_leaves_strings_alone() {
        let params = vec![Parameter::new("@b0", 1_i64)];
        let (sql, values) =
            to_positional("SELECT '@b0' WHERE id = @b0", &params, LexerOptions::default()).unwrap();
        assert_eq!(sql, "SELECT '@b0' WHERE id = ?");
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_to_positional_unknown_marker() {
        let err = to_positional("SELECT @p9", &[], LexerOptions::default()).unwrap_err();
        assert!(matches!(err, TranspileError::Configuration(_)));
    }
}
