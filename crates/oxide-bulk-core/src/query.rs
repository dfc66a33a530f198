//! Compiled base queries and their shape checks.
//!
//! A [`CompiledQuery`] is what an ORM query compiler hands over: SELECT text,
//! the parameters it binds, the root table and its key columns. Before a
//! mutation is built around it, [`BaseSelect::analyze`] checks that the text
//! is the narrow shape the templates can wrap: one SELECT over one root
//! table, filtered but not grouped, ordered, combined or windowed.

use crate::config::NameMatching;
use crate::error::{Result, TranspileError};
use crate::lexer::{Keyword, Lexer, LexerOptions, Span, Token, TokenKind};
use crate::value::{Parameter, ToSqlValue};

/// A SELECT produced by a query compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// SELECT text using the dialect's native markers.
    pub sql: String,
    /// Parameters bound by `sql`, in their original order.
    pub parameters: Vec<Parameter>,
    /// Table the mutation targets.
    pub root_table: String,
    /// Key columns of the root table.
    pub key_columns: Vec<String>,
}

impl CompiledQuery {
    /// Creates a query without parameters or key columns.
    pub fn new(sql: impl Into<String>, root_table: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            parameters: Vec::new(),
            root_table: root_table.into(),
            key_columns: Vec::new(),
        }
    }

    /// Adds a bound parameter.
    #[must_use]
    pub fn parameter(mut self, marker: impl Into<String>, value: impl ToSqlValue) -> Self {
        self.parameters.push(Parameter::new(marker, value));
        self
    }

    /// Adds a key column.
    #[must_use]
    pub fn key(mut self, column: impl Into<String>) -> Self {
        self.key_columns.push(column.into());
        self
    }
}

/// A validated base SELECT, split into the parts a template needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BaseSelect<'q> {
    /// Comments found outside the statement, rendered one per line.
    pub header: String,
    /// Statement text from `SELECT` to its last token.
    pub body: &'q str,
    /// Marker occurrences, with spans relative to `body`.
    pub markers: Vec<(Span, usize)>,
}

impl<'q> BaseSelect<'q> {
    /// Validates `query` and locates its markers. Each marker is paired
    /// with the index of its parameter in `query.parameters`.
    pub(crate) fn analyze(
        query: &'q CompiledQuery,
        key: &str,
        options: LexerOptions,
        matching: NameMatching,
    ) -> Result<Self> {
        let table = query.root_table.as_str();
        let source = query.sql.as_str();
        let all = Lexer::with_options(source, options.keep_comments(true)).tokenize();

        let mut code: Vec<&Token> = Vec::with_capacity(all.len());
        for token in &all {
            match &token.kind {
                TokenKind::Comment(_) | TokenKind::Eof => {}
                TokenKind::Error(message) => return Err(TranspileError::shape(table, message.clone())),
                _ => code.push(token),
            }
        }

        match code.first() {
            Some(first) if first.is_keyword(Keyword::Select) => {}
            Some(first) => {
                return Err(TranspileError::shape(
                    table,
                    format!("statement starts with `{}`, expected SELECT", first.span.slice(source)),
                ));
            }
            None => return Err(TranspileError::shape(table, "empty query text")),
        }

        let end = check_clauses(&code, table, source)?;
        let code = &code[..end];
        check_projection(code, table, key, source, matching)?;

        let start = code[0].span.start;
        let stop = code[end - 1].span.end;

        let mut header = String::new();
        for token in &all {
            if let TokenKind::Comment(body) = &token.kind {
                if token.span.start < start || token.span.start >= stop {
                    if token.span.slice(source).starts_with("/*") {
                        header.push_str("/* ");
                        header.push_str(body);
                        header.push_str(" */\n");
                    } else {
                        header.push_str("-- ");
                        header.push_str(body);
                        header.push('\n');
                    }
                }
            }
        }

        let mut markers = Vec::new();
        for token in code {
            match &token.kind {
                TokenKind::Placeholder(marker) => {
                    let index = query
                        .parameters
                        .iter()
                        .position(|p| &p.marker == marker)
                        .ok_or_else(|| {
                            TranspileError::shape(table, format!("marker `{marker}` has no bound parameter"))
                        })?;
                    markers.push((
                        Span::new(token.span.start - start, token.span.end - start),
                        index,
                    ));
                }
                TokenKind::Question => {
                    return Err(TranspileError::shape(table, "positional `?` marker"));
                }
                _ => {}
            }
        }

        Ok(Self {
            header,
            body: &source[start..stop],
            markers,
        })
    }
}

/// Rejects unsupported clauses and returns the number of tokens that make up
/// the statement (a trailing `;` is not part of it).
fn check_clauses(code: &[&Token], table: &str, source: &str) -> Result<usize> {
    let mut depth = 0_usize;
    let mut has_from = false;

    for (i, token) in code.iter().enumerate() {
        let next = code.get(i + 1);
        let followed_by = |kind: &TokenKind| next.is_some_and(|t| &t.kind == kind);
        let followed_by_keyword = |kw: Keyword| next.is_some_and(|t| t.is_keyword(kw));

        match &token.kind {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen => depth = depth.saturating_sub(1),
            TokenKind::Semicolon if depth == 0 => {
                if i + 1 < code.len() {
                    return Err(TranspileError::shape(table, "multiple statements"));
                }
                if !has_from {
                    break;
                }
                return Ok(i);
            }
            TokenKind::Keyword(kw) => match kw {
                Keyword::Group if followed_by_keyword(Keyword::By) => {
                    return Err(TranspileError::shape(table, "GROUP BY"));
                }
                Keyword::Having
                | Keyword::Union
                | Keyword::Intersect
                | Keyword::Except
                | Keyword::Over
                | Keyword::Window => {
                    return Err(TranspileError::shape(table, kw.as_str()));
                }
                Keyword::Order if depth == 0 && followed_by_keyword(Keyword::By) => {
                    return Err(TranspileError::shape(table, "ORDER BY"));
                }
                Keyword::Into if depth == 0 => {
                    return Err(TranspileError::shape(table, "SELECT INTO"));
                }
                Keyword::From if depth == 0 => has_from = true,
                _ if depth == 0 && kw.is_aggregate() && followed_by(&TokenKind::LeftParen) => {
                    return Err(TranspileError::shape(
                        table,
                        format!("aggregate {}()", token.span.slice(source).to_uppercase()),
                    ));
                }
                _ => {}
            },
            _ => {}
        }
    }

    if has_from {
        Ok(code.len())
    } else {
        Err(TranspileError::shape(table, "SELECT without FROM"))
    }
}

/// Checks that the outer projection exposes the key column, since the
/// templates join on it.
fn check_projection(
    code: &[&Token],
    table: &str,
    key: &str,
    source: &str,
    matching: NameMatching,
) -> Result<()> {
    let mut rest = &code[1..];
    if rest.first().is_some_and(|t| t.is_keyword(Keyword::Distinct)) {
        rest = &rest[1..];
    }
    if rest.first().is_some_and(|t| t.is_keyword(Keyword::Top)) {
        rest = skip_operand(&rest[1..]);
    }

    let mut depth = 0_usize;
    let mut item: Vec<&Token> = Vec::new();
    let mut exposed = false;
    for token in rest {
        match &token.kind {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen => depth = depth.saturating_sub(1),
            TokenKind::Comma if depth == 0 => {
                exposed |= item_exposes(&item, key, source, matching);
                item.clear();
                continue;
            }
            TokenKind::Keyword(Keyword::From) if depth == 0 => break,
            _ => {}
        }
        item.push(token);
    }
    exposed |= item_exposes(&item, key, source, matching);

    if exposed {
        Ok(())
    } else {
        Err(TranspileError::shape(
            table,
            format!("projection does not expose key column `{key}`"),
        ))
    }
}

/// Skips a `TOP` operand: a number, a marker, or a parenthesized expression.
fn skip_operand<'t, 'a>(tokens: &'t [&'a Token]) -> &'t [&'a Token] {
    match tokens.first().map(|t| &t.kind) {
        Some(TokenKind::LeftParen) => {
            let mut depth = 0_usize;
            for (i, token) in tokens.iter().enumerate() {
                match token.kind {
                    TokenKind::LeftParen => depth += 1,
                    TokenKind::RightParen => {
                        depth -= 1;
                        if depth == 0 {
                            return &tokens[i + 1..];
                        }
                    }
                    _ => {}
                }
            }
            &[]
        }
        Some(_) => &tokens[1..],
        None => tokens,
    }
}

fn item_exposes(item: &[&Token], key: &str, source: &str, matching: NameMatching) -> bool {
    let Some(last) = item.last() else {
        return false;
    };
    if last.kind == TokenKind::Star {
        // `*` or `t.*`
        return item.len() == 1 || item[item.len() - 2].kind == TokenKind::Dot;
    }
    let name = match &last.kind {
        TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name) => name.as_str(),
        TokenKind::Keyword(_) => last.span.slice(source),
        _ => return false,
    };
    matching.matches(name, key)
}
