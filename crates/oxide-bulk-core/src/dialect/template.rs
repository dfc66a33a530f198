//! Statement templates as data.
//!
//! A template is a fixed sequence of literal text and named holes. Rendering
//! concatenates the pieces; caller-provided text is never searched for
//! placeholders, so a `{key}` inside a string literal of the base query stays
//! what it is.

/// One piece of a statement template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// Literal SQL text.
    Text(&'static str),
    /// The mutated table.
    Table,
    /// The alias of the derived table.
    Alias,
    /// The key column.
    Key,
    /// The renumbered base SELECT.
    BaseSelect,
    /// The comma-joined SET list.
    Assignments,
}

/// A statement template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template(pub &'static [Segment]);

/// Values substituted into a template's holes. All identifiers are expected
/// to be quoted already.
#[derive(Debug, Clone, Copy)]
pub struct TemplateArgs<'a> {
    /// Rendered table name.
    pub table: &'a str,
    /// Rendered derived-table alias.
    pub alias: &'a str,
    /// Rendered key column.
    pub key: &'a str,
    /// Base SELECT text.
    pub base_select: &'a str,
    /// Rendered SET list; empty for DELETE.
    pub assignments: &'a str,
}

impl Template {
    /// Renders the template.
    #[must_use]
    pub fn render(&self, args: &TemplateArgs<'_>) -> String {
        let mut sql = String::with_capacity(args.base_select.len() + 128);
        for segment in self.0 {
            sql.push_str(match segment {
                Segment::Text(text) => text,
                Segment::Table => args.table,
                Segment::Alias => args.alias,
                Segment::Key => args.key,
                Segment::BaseSelect => args.base_select,
                Segment::Assignments => args.assignments,
            });
        }
        sql
    }
}
