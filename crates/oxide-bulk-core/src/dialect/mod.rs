//! SQL dialect support.
//!
//! Each supported engine is described by a static [`DialectDescriptor`]:
//! how it quotes identifiers, how it spells parameter markers, how its
//! comments and strings lex, and the two statement templates the mutation
//! builder fills in. Adding an engine means adding one descriptor file.

mod mysql;
mod postgres;
mod sqlserver;
mod template;

use std::fmt;

pub use mysql::MYSQL;
pub use postgres::POSTGRES;
pub use sqlserver::SQL_SERVER;
pub use template::{Segment, Template, TemplateArgs};

use crate::error::{Result, TranspileError};
use crate::lexer::{Keyword, LexerOptions};

/// Target database engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Microsoft SQL Server.
    SqlServer,
    /// MySQL and MariaDB.
    MySql,
    /// PostgreSQL.
    PostgreSql,
    /// Any other provider, kept by name.
    Unsupported(String),
}

impl Dialect {
    /// Maps a provider name or URL scheme to a dialect.
    ///
    /// ```
    /// use oxide_bulk_core::Dialect;
    ///
    /// assert_eq!(Dialect::from_provider("Npgsql"), Dialect::PostgreSql);
    /// assert_eq!(Dialect::from_provider("mariadb"), Dialect::MySql);
    /// assert_eq!(
    ///     Dialect::from_provider("sqlite"),
    ///     Dialect::Unsupported(String::from("sqlite"))
    /// );
    /// ```
    #[must_use]
    pub fn from_provider(name: &str) -> Self {
        let name = name.trim();
        let lower = name.to_ascii_lowercase();
        if lower.contains("sqlserver") || lower.contains("sqlclient") || lower == "mssql" {
            Self::SqlServer
        } else if lower.contains("mysql") || lower.contains("mariadb") {
            Self::MySql
        } else if lower.contains("postgres") || lower.contains("npgsql") || lower == "pg" {
            Self::PostgreSql
        } else {
            Self::Unsupported(String::from(name))
        }
    }

    /// Returns the dialect name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::SqlServer => SQL_SERVER.name,
            Self::MySql => MYSQL.name,
            Self::PostgreSql => POSTGRES.name,
            Self::Unsupported(name) => name,
        }
    }

    /// Returns the statement descriptor of a supported dialect.
    ///
    /// # Errors
    ///
    /// Returns [`TranspileError::UnsupportedDialect`] for
    /// [`Dialect::Unsupported`].
    pub fn descriptor(&self) -> Result<&'static DialectDescriptor> {
        match self {
            Self::SqlServer => Ok(&SQL_SERVER),
            Self::MySql => Ok(&MYSQL),
            Self::PostgreSql => Ok(&POSTGRES),
            Self::Unsupported(name) => Err(TranspileError::UnsupportedDialect(name.clone())),
        }
    }

    /// Lexer options for command text of this dialect. Unsupported
    /// dialects lex as ANSI SQL.
    #[must_use]
    pub fn lexer_options(&self) -> LexerOptions {
        self.descriptor().map(|d| d.lexer).unwrap_or_default()
    }

    /// Identifier quote characters. Unsupported dialects use ANSI double
    /// quotes.
    #[must_use]
    pub fn quote_chars(&self) -> (char, char) {
        self.descriptor().map_or(('"', '"'), |d| d.quote)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a dialect spells parameter markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    /// `@name` markers (SQL Server, MySQL connectors).
    Named,
    /// `$n` markers, numbered from 1 (PostgreSQL).
    Numbered,
}

/// Where a marker of a mutation statement comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// A SET assignment.
    Assignment,
    /// A parameter of the base query.
    Base,
}

/// Static description of one engine.
#[derive(Debug)]
pub struct DialectDescriptor {
    /// Canonical dialect name.
    pub name: &'static str,
    /// Opening and closing identifier quote.
    pub quote: (char, char),
    /// Marker spelling.
    pub markers: MarkerStyle,
    /// Lexing rules for this engine's command text.
    pub lexer: LexerOptions,
    /// SET targets are written `table.column`.
    pub qualify_set_targets: bool,
    /// UPDATE template.
    pub update: Template,
    /// DELETE template.
    pub delete: Template,
}

impl DialectDescriptor {
    /// Marker for the `index`-th parameter of a namespace. Numbered markers
    /// put every assignment before the base parameters, so base markers are
    /// offset by `assignment_count`.
    #[must_use]
    pub fn marker(&self, namespace: Namespace, index: usize, assignment_count: usize) -> String {
        match (self.markers, namespace) {
            (MarkerStyle::Named, Namespace::Assignment) => format!("@s{index}"),
            (MarkerStyle::Named, Namespace::Base) => format!("@b{index}"),
            (MarkerStyle::Numbered, Namespace::Assignment) => format!("${}", index + 1),
            (MarkerStyle::Numbered, Namespace::Base) => {
                format!("${}", assignment_count + index + 1)
            }
        }
    }

    /// Renders a possibly dotted name, quoting the parts that need it.
    #[must_use]
    pub fn identifier(&self, name: &str) -> String {
        render_identifier(name, self.quote)
    }
}

/// Returns true if `part` must be quoted to be read back as one identifier.
#[must_use]
pub fn needs_quoting(part: &str) -> bool {
    let mut chars = part.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    !plain || Keyword::from_str(part).is_some()
}

/// Quotes one identifier part, doubling the closing quote inside it.
#[must_use]
pub fn quote_identifier(part: &str, (open, close): (char, char)) -> String {
    let mut quoted = String::with_capacity(part.len() + 2);
    quoted.push(open);
    for c in part.chars() {
        if c == close {
            quoted.push(close);
        }
        quoted.push(c);
    }
    quoted.push(close);
    quoted
}

/// Renders `schema.table` style names part by part.
#[must_use]
pub fn render_identifier(name: &str, quote: (char, char)) -> String {
    name.split('.')
        .map(|part| {
            if needs_quoting(part) {
                quote_identifier(part, quote)
            } else {
                String::from(part)
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_provider() {
        assert_eq!(Dialect::from_provider("sqlserver"), Dialect::SqlServer);
        assert_eq!(
            Dialect::from_provider("Microsoft.Data.SqlClient"),
            Dialect::SqlServer
        );
        assert_eq!(Dialect::from_provider("mssql"), Dialect::SqlServer);
        assert_eq!(
            Dialect::from_provider("Pomelo.EntityFrameworkCore.MySql"),
            Dialect::MySql
        );
        assert_eq!(Dialect::from_provider("postgresql"), Dialect::PostgreSql);
        assert_eq!(Dialect::from_provider(" postgres "), Dialect::PostgreSql);
        assert_eq!(
            Dialect::from_provider("Oracle"),
            Dialect::Unsupported(String::from("Oracle"))
        );
    }

    #[test]
    fn test_templates_have_their_holes() {
        for dialect in [Dialect::SqlServer, Dialect::MySql, Dialect::PostgreSql] {
            let descriptor = dialect.descriptor().unwrap();
            let Template(update) = descriptor.update;
            let Template(delete) = descriptor.delete;
            for hole in [Segment::Table, Segment::Alias, Segment::Key, Segment::BaseSelect] {
                assert!(update.contains(&hole), "{dialect} UPDATE lacks {hole:?}");
                assert!(delete.contains(&hole), "{dialect} DELETE lacks {hole:?}");
            }
            assert!(update.contains(&Segment::Assignments), "{dialect}");
            assert!(!delete.contains(&Segment::Assignments), "{dialect}");
        }
    }

    #[test]
    fn test_unsupported_has_no_descriptor() {
        let dialect = Dialect::Unsupported(String::from("sqlite"));
        assert_eq!(
            dialect.descriptor().unwrap_err(),
            TranspileError::UnsupportedDialect(String::from("sqlite"))
        );
        assert_eq!(dialect.lexer_options(), LexerOptions::default());
        assert_eq!(dialect.quote_chars(), ('"', '"'));
    }

    #[test]
    fn test_markers() {
        let pg = Dialect::PostgreSql.descriptor().unwrap();
        assert_eq!(pg.marker(Namespace::Assignment, 0, 2), "$1");
        assert_eq!(pg.marker(Namespace::Base, 0, 2), "$3");

        let mssql = Dialect::SqlServer.descriptor().unwrap();
        assert_eq!(mssql.marker(Namespace::Assignment, 1, 2), "@s1");
        assert_eq!(mssql.marker(Namespace::Base, 0, 2), "@b0");
    }

    #[test]
    fn test_needs_quoting() {
        assert!(!needs_quoting("sys_function"));
        assert!(!needs_quoting("_tmp1"));
        assert!(needs_quoting("order"));
        assert!(needs_quoting("Order"));
        assert!(needs_quoting("first name"));
        assert!(needs_quoting("1st"));
        assert!(needs_quoting(""));
    }

    #[test]
    fn test_render_identifier() {
        assert_eq!(render_identifier("users", ('"', '"')), "users");
        assert_eq!(render_identifier("dbo.order", ('[', ']')), "dbo.[order]");
        assert_eq!(render_identifier("we\"ird", ('"', '"')), "\"we\"\"ird\"");
        assert_eq!(render_identifier("a]b", ('[', ']')), "[a]]b]");
    }

    #[test]
    fn test_descriptor_lexing() {
        assert!(SQL_SERVER.lexer.bracket_identifiers);
        assert!(MYSQL.lexer.backslash_escapes);
        assert!(MYSQL.qualify_set_targets);
        assert!(!POSTGRES.qualify_set_targets);
        assert_eq!(POSTGRES.markers, MarkerStyle::Numbered);
    }
}
