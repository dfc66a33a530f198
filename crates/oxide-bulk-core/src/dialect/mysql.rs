//! MySQL statement shapes.
//!
//! MySQL has no `UPDATE ... FROM`; both statements join the derived table.
//! SET targets are qualified because an unqualified column that also exists
//! in the derived table is ambiguous in a multi-table UPDATE.

use super::template::{Segment, Template};
use super::{DialectDescriptor, MarkerStyle};
use crate::lexer::LexerOptions;

/// `UPDATE t INNER JOIN (<select>) AS src ON t.key = src.key SET ...`
const UPDATE: Template = Template(&[
    Segment::Text("UPDATE "),
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
    Segment::Text(" SET "),
    Segment::Assignments,
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

pub static MYSQL: DialectDescriptor = DialectDescriptor {
    name: "mysql",
    quote: ('`', '`'),
    markers: MarkerStyle::Named,
    lexer: LexerOptions {
        bracket_identifiers: false,
        backslash_escapes: true,
        double_quoted_strings: true,
        hash_comments: true,
        keep_comments: false,
    },
    qualify_set_targets: true,
    update: UPDATE,
    delete: DELETE,
};
