//! SQL Server statement shapes.

use super::template::{Segment, Template};
use super::{DialectDescriptor, MarkerStyle};
use crate::lexer::LexerOptions;

/// `UPDATE t SET ... FROM (<select>) AS src WHERE t.key = src.key`
const UPDATE: Template = Template(&[
    Segment::Text("UPDATE "),
    Segment::Table,
    Segment::Text(" SET "),
    Segment::Assignments,
    Segment::Text(" FROM ("),
    Segment::BaseSelect,
    Segment::Text(") AS "),
    Segment::Alias,
    Segment::Text(" WHERE "),
    Segment::Table,
    Segment::Text("."),
    Segment::Key,
    Segment::Text(" = "),
    Segment::Alias,
    Segment::Text("."),
    Segment::Key,
]);

/// `DELETE t FROM t INNER JOIN (<select>) AS src ON t.key = src.key`
const DELETE: Template = Template(&[
    Segment::Text("DELETE "),
    Segment::Table,
    Segment::Text(" FROM "),
    Segment::Table,
    Segment::Text(" INNER JOIN ("),
    Segment::BaseSelect,
    Segment::Text(") AS "),
    Segment::Alias,
    Segment::Text(" ON "),
    Segment::Table,
    Segment::Text("."),
    Segment::Key,
    Segment::Text(" = "),
    Segment::Alias,
    Segment::Text("."),
    Segment::Key,
]);

pub static SQL_SERVER: DialectDescriptor = DialectDescriptor {
    name: "sqlserver",
    quote: ('[', ']'),
    markers: MarkerStyle::Named,
    lexer: LexerOptions {
        bracket_identifiers: true,
        backslash_escapes: false,
        double_quoted_strings: false,
        hash_comments: false,
        keep_comments: false,
    },
    qualify_set_targets: false,
    update: UPDATE,
    delete: DELETE,
};
