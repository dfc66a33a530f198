//! Token types for the SQL lexer.

use super::Span;

/// Keywords the transpiler makes decisions on.
///
/// Anything not listed here lexes as an identifier. The list doubles as the
/// set of words that get quoted when used as a table or column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Select,
    From,
    Where,
    Order,
    By,
    Group,
    Having,
    Limit,
    Offset,
    Distinct,
    Top,
    Into,
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    On,
    Using,
    As,
    Union,
    Intersect,
    Except,
    Insert,
    Update,
    Set,
    Delete,
    Values,
    And,
    Or,
    Not,
    In,
    Is,
    Null,
    Exists,
    Between,
    Like,
    Case,
    When,
    Then,
    Else,
    End,
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Over,
    Window,
    With,
    Table,
    Key,
    Primary,
    Default,
    User,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("SELECT", Keyword::Select),
    ("FROM", Keyword::From),
    ("WHERE", Keyword::Where),
    ("ORDER", Keyword::Order),
    ("BY", Keyword::By),
    ("GROUP", Keyword::Group),
    ("HAVING", Keyword::Having),
    ("LIMIT", Keyword::Limit),
    ("OFFSET", Keyword::Offset),
    ("DISTINCT", Keyword::Distinct),
    ("TOP", Keyword::Top),
    ("INTO", Keyword::Into),
    ("JOIN", Keyword::Join),
    ("INNER", Keyword::Inner),
    ("LEFT", Keyword::Left),
    ("RIGHT", Keyword::Right),
    ("FULL", Keyword::Full),
    ("OUTER", Keyword::Outer),
    ("CROSS", Keyword::Cross),
    ("ON", Keyword::On),
    ("USING", Keyword::Using),
    ("AS", Keyword::As),
    ("UNION", Keyword::Union),
    ("INTERSECT", Keyword::Intersect),
    ("EXCEPT", Keyword::Except),
    ("INSERT", Keyword::Insert),
    ("UPDATE", Keyword::Update),
    ("SET", Keyword::Set),
    ("DELETE", Keyword::Delete),
    ("VALUES", Keyword::Values),
    ("AND", Keyword::And),
    ("OR", Keyword::Or),
    ("NOT", Keyword::Not),
    ("IN", Keyword::In),
    ("IS", Keyword::Is),
    ("NULL", Keyword::Null),
    ("EXISTS", Keyword::Exists),
    ("BETWEEN", Keyword::Between),
    ("LIKE", Keyword::Like),
    ("CASE", Keyword::Case),
    ("WHEN", Keyword::When),
    ("THEN", Keyword::Then),
    ("ELSE", Keyword::Else),
    ("END", Keyword::End),
    ("COUNT", Keyword::Count),
    ("SUM", Keyword::Sum),
    ("AVG", Keyword::Avg),
    ("MIN", Keyword::Min),
    ("MAX", Keyword::Max),
    ("OVER", Keyword::Over),
    ("WINDOW", Keyword::Window),
    ("WITH", Keyword::With),
    ("TABLE", Keyword::Table),
    ("KEY", Keyword::Key),
    ("PRIMARY", Keyword::Primary),
    ("DEFAULT", Keyword::Default),
    ("USER", Keyword::User),
];

impl Keyword {
    /// Looks a keyword up, ignoring ASCII case.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        KEYWORDS
            .iter()
            .find(|(text, _)| text.eq_ignore_ascii_case(s))
            .map(|(_, kw)| *kw)
    }

    /// Returns the keyword as upper-case SQL text.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, kw)| kw == self)
            .map_or("", |(text, _)| text)
    }

    /// Returns true for the aggregate function names.
    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        matches!(
            self,
            Self::Count | Self::Sum | Self::Avg | Self::Min | Self::Max
        )
    }
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Numeric literal; the value is never needed, only its extent.
    Number,
    /// String literal with escapes resolved (`'it''s'`, `N'x'`, `E'x'`,
    /// `$tag$body$tag$`, and `"x"` where double quotes delimit strings).
    String(String),
    /// Hex blob literal (`X'CAFE'`), hex digits as written.
    Blob(String),
    /// Bare identifier (`orders`, `@@ROWCOUNT`).
    Identifier(String),
    /// Quoted identifier with escapes resolved (`"a b"`, `` `a` ``, `[a]`).
    QuotedIdentifier(String),
    /// SQL keyword.
    Keyword(Keyword),
    /// Bound parameter marker as written (`@p0`, `$1`).
    Placeholder(String),
    /// Comment body without its delimiters, only produced when the lexer
    /// keeps comments.
    Comment(String),

    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// =
    Eq,
    /// != or <>
    NotEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// ||
    Concat,
    /// (
    LeftParen,
    /// )
    RightParen,
    /// [ (only when brackets do not quote identifiers)
    LeftBracket,
    /// ]
    RightBracket,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,
    /// :
    Colon,
    /// ::
    DoubleColon,
    /// ?
    Question,
    /// Any other single punctuation character (`&`, `|`, `~`, `^`, `#`, ...).
    Symbol(char),

    /// End of input
    Eof,
    /// Invalid or unterminated input
    Error(String),
}

/// A token with its span in the source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The location in the source code.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }

    /// Returns true if this token is the given keyword.
    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.as_keyword() == Some(keyword)
    }

    /// Returns the name of a bare or quoted identifier.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the marker text if this is a parameter placeholder.
    #[must_use]
    pub fn placeholder(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Placeholder(marker) => Some(marker),
            _ => None,
        }
    }
}
