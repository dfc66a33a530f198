//! PostgreSQL statement shapes.

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

/// `DELETE FROM t USING (<select>) AS src WHERE t.key = src.key`
const DELETE: Template = Template(&[
    Segment::Text("DELETE FROM "),
    Segment::Table,
    Segment::Text(" USING ("),
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

pub static POSTGRES: DialectDescriptor = DialectDescriptor {
    name: "postgresql",
    quote: ('"', '"'),
    markers: MarkerStyle::Numbered,
    lexer: LexerOptions {
        bracket_identifiers: false,
        backslash_escapes: false,
        double_quoted_strings: false,
        hash_comments: false,
        keep_comments: false,
    },
    qualify_set_targets: false,
    update: UPDATE,
    delete: DELETE,
};
