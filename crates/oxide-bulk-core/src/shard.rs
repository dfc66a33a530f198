//! Table-name rewriting for sharded tables.
//!
//! A query can carry annotations such as `-- shard:orders:orders_2024`.
//! Right before the command text is sent, the [`TableNameRewriter`] reads
//! those annotations and replaces every whole-token occurrence of the
//! logical table name with the physical one.
//!
//! Rewriting works on the token stream of the dialect, so string literals,
//! comments, parameter markers and longer identifiers (`order_items` when
//! renaming `order`) are never touched.

use tracing::{debug, warn};

use crate::config::{NameMatching, TranspileConfig};
use crate::dialect::{needs_quoting, quote_identifier, Dialect};
use crate::error::{Result, TranspileError};
use crate::lexer::{Keyword, Lexer, Token, TokenKind};

/// A logical-to-physical table mapping attached to one query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShardingTag {
    /// Table name used by the query.
    pub logical: String,
    /// Table the command should hit instead.
    pub physical: String,
}

impl ShardingTag {
    /// Creates a tag.
    pub fn new(logical: impl Into<String>, physical: impl Into<String>) -> Self {
        Self {
            logical: logical.into(),
            physical: physical.into(),
        }
    }

    /// Parses a `<marker>:<logical>:<physical>` annotation.
    ///
    /// Returns `Ok(None)` when the annotation belongs to someone else.
    ///
    /// # Errors
    ///
    /// Returns [`TranspileError::Configuration`] if the annotation starts
    /// with `marker` but does not have exactly three non-empty fields.
    ///
    /// ```
    /// use oxide_bulk_core::ShardingTag;
    ///
    /// let tag = ShardingTag::parse("shard:orders:orders_2024", "shard").unwrap();
    /// assert_eq!(tag, Some(ShardingTag::new("orders", "orders_2024")));
    /// assert_eq!(ShardingTag::parse("hint:nolock", "shard").unwrap(), None);
    /// assert!(ShardingTag::parse("shard:orders", "shard").is_err());
    /// ```
    pub fn parse(annotation: &str, marker: &str) -> Result<Option<Self>> {
        let fields: Vec<&str> = annotation.split(':').map(str::trim).collect();
        if fields.first() != Some(&marker) {
            return Ok(None);
        }
        match fields.as_slice() {
            [_, logical, physical] if !logical.is_empty() && !physical.is_empty() => {
                Ok(Some(Self::new(*logical, *physical)))
            }
            _ => Err(TranspileError::Configuration(format!(
                "malformed sharding tag `{annotation}`: expected `{marker}:<logical>:<physical>`"
            ))),
        }
    }

    /// Renders the tag as an annotation body.
    #[must_use]
    pub fn annotation(&self, marker: &str) -> String {
        format!("{marker}:{}:{}", self.logical, self.physical)
    }
}

/// A validated list of sharding tags.
///
/// No two tags rename the same logical table differently and no physical
/// name is itself a logical name of the list, so applying the list twice
/// gives the same text as applying it once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardingTags {
    tags: Vec<ShardingTag>,
    matching: NameMatching,
}

impl ShardingTags {
    /// Validates a tag list.
    ///
    /// Identical duplicates and identity tags (`t:t`) are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`TranspileError::Configuration`] for empty or dotted names,
    /// for a logical table mapped to two physical tables, and for chains
    /// where a physical name is another tag's logical name.
    pub fn new(tags: impl IntoIterator<Item = ShardingTag>, matching: NameMatching) -> Result<Self> {
        let mut accepted: Vec<ShardingTag> = Vec::new();
        for tag in tags {
            for name in [&tag.logical, &tag.physical] {
                if name.is_empty() || name.contains('.') {
                    return Err(TranspileError::Configuration(format!(
                        "sharding tag `{}:{}` needs plain table names",
                        tag.logical, tag.physical
                    )));
                }
            }
            if matching.matches(&tag.logical, &tag.physical) {
                continue;
            }
            if let Some(existing) = accepted
                .iter()
                .find(|t| matching.matches(&t.logical, &tag.logical))
            {
                if matching.matches(&existing.physical, &tag.physical) {
                    continue;
                }
                return Err(TranspileError::Configuration(format!(
                    "table `{}` is tagged with both `{}` and `{}`",
                    tag.logical, existing.physical, tag.physical
                )));
            }
            accepted.push(tag);
        }

        for tag in &accepted {
            if let Some(next) = accepted
                .iter()
                .find(|t| matching.matches(&t.logical, &tag.physical))
            {
                return Err(TranspileError::Configuration(format!(
                    "sharding tags chain `{}` -> `{}` -> `{}`",
                    tag.logical, tag.physical, next.physical
                )));
            }
        }

        Ok(Self {
            tags: accepted,
            matching,
        })
    }

    /// Iterates over the tags.
    pub fn iter(&self) -> std::slice::Iter<'_, ShardingTag> {
        self.tags.iter()
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns true if there are no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Physical name for a logical table.
    #[must_use]
    pub fn physical(&self, logical: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| self.matching.matches(&t.logical, logical))
            .map(|t| t.physical.as_str())
    }
}

impl<'a> IntoIterator for &'a ShardingTags {
    type Item = &'a ShardingTag;
    type IntoIter = std::slice::Iter<'a, ShardingTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

/// Rewrites logical table names in outgoing command text.
#[derive(Debug, Clone, Default)]
pub struct TableNameRewriter {
    config: TranspileConfig,
}

impl TableNameRewriter {
    /// Creates a rewriter.
    #[must_use]
    pub const fn new(config: TranspileConfig) -> Self {
        Self { config }
    }

    /// Validates a tag list with this rewriter's name matching.
    ///
    /// # Errors
    ///
    /// See [`ShardingTags::new`].
    pub fn tags(&self, tags: impl IntoIterator<Item = ShardingTag>) -> Result<ShardingTags> {
        ShardingTags::new(tags, self.config.name_matching)
    }

    /// Collects the sharding annotations found in the comments of `text`.
    ///
    /// # Errors
    ///
    /// Returns [`TranspileError::Configuration`] for a malformed annotation
    /// or an invalid tag list.
    pub fn extract_tags(&self, text: &str, dialect: &Dialect) -> Result<ShardingTags> {
        let marker = self.config.shard_marker.as_str();
        let mut tags = Vec::new();
        for token in Lexer::with_options(text, dialect.lexer_options().keep_comments(true)).tokenize() {
            if let TokenKind::Comment(body) = &token.kind {
                if let Some(tag) = ShardingTag::parse(body, marker)? {
                    tags.push(tag);
                }
            }
        }
        self.tags(tags)
    }

    /// Replaces every whole-token occurrence of a tagged logical table name.
    ///
    /// A tag that matches nothing leaves the text unchanged.
    #[must_use]
    pub fn rewrite(&self, text: &str, tags: &ShardingTags, dialect: &Dialect) -> String {
        if tags.is_empty() {
            return String::from(text);
        }

        let default_quote = dialect.quote_chars();
        let mut out = String::with_capacity(text.len() + 16);
        let mut copied = 0;
        let mut hits = 0_usize;

        let tokens = Lexer::with_options(text, dialect.lexer_options()).tokenize();
        for (i, token) in tokens.iter().enumerate() {
            let replacement = match &token.kind {
                TokenKind::Identifier(name) => tags
                    .physical(name)
                    .map(|physical| bare_name(physical, default_quote)),
                TokenKind::Keyword(_) if !is_call(&tokens, i) => tags
                    .physical(token.span.slice(text))
                    .map(|physical| bare_name(physical, default_quote)),
                TokenKind::QuotedIdentifier(name) => tags.physical(name).map(|physical| {
                    let original = token.span.slice(text);
                    quote_identifier(physical, quote_style(original).unwrap_or(default_quote))
                }),
                TokenKind::Error(message) => {
                    warn!(error = %message, "command text does not lex cleanly; rewriting what precedes it");
                    None
                }
                _ => None,
            };
            if let Some(replacement) = replacement {
                out.push_str(&text[copied..token.span.start]);
                out.push_str(&replacement);
                copied = token.span.end;
                hits += 1;
            }
        }
        out.push_str(&text[copied..]);

        if hits == 0 {
            debug!(tags = tags.len(), "sharding tags matched no table name");
        } else {
            debug!(tags = tags.len(), replaced = hits, sql = %out, "rewrote table names");
        }
        out
    }

    /// Reads the annotations of `text` and applies them to it.
    ///
    /// # Errors
    ///
    /// See [`TableNameRewriter::extract_tags`].
    pub fn intercept(&self, text: &str, dialect: &Dialect) -> Result<String> {
        let tags = self.extract_tags(text, dialect)?;
        Ok(self.rewrite(text, &tags, dialect))
    }
}

fn bare_name(physical: &str, quote: (char, char)) -> String {
    if needs_quoting(physical) {
        quote_identifier(physical, quote)
    } else {
        String::from(physical)
    }
}

/// A keyword followed by `(` is a function call (`COUNT(`, `USER()`), unless
/// it names the target of `INSERT INTO t (...)`.
fn is_call(tokens: &[Token], index: usize) -> bool {
    let followed_by_paren = tokens
        .get(index + 1)
        .is_some_and(|t| t.kind == TokenKind::LeftParen);
    let after_into = index
        .checked_sub(1)
        .and_then(|prev| tokens.get(prev))
        .is_some_and(|t| t.kind == TokenKind::Keyword(Keyword::Into));
    followed_by_paren && !after_into
}

fn quote_style(quoted: &str) -> Option<(char, char)> {
    match quoted.chars().next()? {
        '[' => Some(('[', ']')),
        '`' => Some(('`', '`')),
        '"' => Some(('"', '"')),
        _ => None,
    }
}
