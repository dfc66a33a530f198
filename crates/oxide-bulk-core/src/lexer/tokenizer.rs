//! SQL tokenizer implementation.

use super::{Keyword, Span, Token, TokenKind};

/// Dialect-dependent lexing switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexerOptions {
    /// `[name]` quotes an identifier (SQL Server).
    pub bracket_identifiers: bool,
    /// A backslash escapes the next character inside string literals (MySQL).
    pub backslash_escapes: bool,
    /// `"..."` is a string literal rather than an identifier (MySQL).
    pub double_quoted_strings: bool,
    /// `#` starts a line comment (MySQL).
    pub hash_comments: bool,
    /// Emit comments as tokens instead of skipping them.
    pub keep_comments: bool,
}

impl LexerOptions {
    /// Returns these options with comment tokens switched on or off.
    #[must_use]
    pub const fn keep_comments(mut self, keep: bool) -> Self {
        self.keep_comments = keep;
        self
    }
}

/// A lexer that tokenizes SQL input.
pub struct Lexer<'a> {
    /// The input source code.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current token.
    start: usize,
    options: LexerOptions,
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

const fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

impl<'a> Lexer<'a> {
    /// Creates a lexer with ANSI defaults.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self::with_options(
            input,
            LexerOptions {
                bracket_identifiers: false,
                backslash_escapes: false,
                double_quoted_strings: false,
                hash_comments: false,
                keep_comments: false,
            },
        )
    }

    /// Creates a lexer with dialect-specific options.
    #[must_use]
    pub const fn with_options(input: &'a str, options: LexerOptions) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
            options,
        }
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Creates a token spanning from the token start to the current position.
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, Span::new(self.start, self.pos))
    }

    fn error(&self, message: &str) -> Token {
        self.make_token(TokenKind::Error(String::from(message)))
    }

    /// Scans the rest of a `--` or `#` comment.
    fn scan_line_comment(&mut self) -> Token {
        let body_start = self.pos;
        while self.peek().is_some_and(|c| c != '\n') {
            self.advance();
        }
        let body = self.input[body_start..self.pos].trim();
        self.make_token(TokenKind::Comment(String::from(body)))
    }

    /// Scans the rest of a `/* ... */` comment. An unterminated comment runs
    /// to the end of the input.
    fn scan_block_comment(&mut self) -> Token {
        let body_start = self.pos;
        let body_end = loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    let end = self.pos - 1;
                    self.advance();
                    break end;
                }
                Some(_) => {}
                None => break self.pos,
            }
        };
        let body = self.input[body_start..body_end].trim();
        self.make_token(TokenKind::Comment(String::from(body)))
    }

    /// Scans an identifier or keyword whose first character was consumed.
    fn scan_identifier(&mut self) -> Token {
        while self.peek().is_some_and(is_ident_continue) {
            self.advance();
        }

        let text = &self.input[self.start..self.pos];
        Keyword::from_str(text).map_or_else(
            || self.make_token(TokenKind::Identifier(String::from(text))),
            |keyword| self.make_token(TokenKind::Keyword(keyword)),
        )
    }

    /// Scans a quoted identifier after its opening delimiter. A doubled
    /// closing delimiter stands for itself.
    fn scan_quoted_identifier(&mut self, close: char) -> Token {
        let mut value = String::new();
        loop {
            match self.advance() {
                Some(c) if c == close => {
                    if self.peek() == Some(close) {
                        value.push(close);
                        self.advance();
                    } else {
                        return self.make_token(TokenKind::QuotedIdentifier(value));
                    }
                }
                Some(c) => value.push(c),
                None => return self.error("Unterminated quoted identifier"),
            }
        }
    }

    /// Scans a string literal after its opening quote.
    fn scan_string(&mut self, quote: char, backslash_escapes: bool) -> Token {
        let mut value = String::new();
        loop {
            match self.advance() {
                Some('\\') if backslash_escapes => match self.advance() {
                    Some(escaped) => value.push(unescape(escaped)),
                    None => return self.error("Unterminated string literal"),
                },
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        value.push(quote);
                        self.advance();
                    } else {
                        return self.make_token(TokenKind::String(value));
                    }
                }
                Some(c) => value.push(c),
                None => return self.error("Unterminated string literal"),
            }
        }
    }

    /// Scans a blob literal once the `X` prefix was consumed.
    fn scan_blob(&mut self) -> Token {
        self.advance(); // opening quote
        let mut hex = String::new();
        loop {
            match self.advance() {
                Some('\'') => break,
                Some(c) if c.is_ascii_hexdigit() => hex.push(c),
                Some(c) if c.is_whitespace() => {}
                Some(_) => return self.error("Invalid character in blob literal"),
                None => return self.error("Unterminated blob literal"),
            }
        }
        if hex.len() % 2 == 1 {
            return self.error("Odd number of hex digits in blob literal");
        }
        self.make_token(TokenKind::Blob(hex))
    }

    /// Scans a number whose first digit was consumed.
    fn scan_number(&mut self) -> Token {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        let rest = &self.input[self.pos..];
        let mut chars = rest.chars();
        if chars.next() == Some('.') && chars.next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let rest = &self.input[self.pos..];
        let mut chars = rest.chars();
        if chars.next().is_some_and(|c| c == 'e' || c == 'E') {
            let after = chars.next();
            let signed = after.is_some_and(|c| c == '+' || c == '-');
            let digit = if signed { chars.next() } else { after };
            if digit.is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
                if signed {
                    self.advance();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        self.make_token(TokenKind::Number)
    }

    /// Scans what follows an `@`: a named marker (`@p0`), a system variable
    /// (`@@ROWCOUNT`), or a lone `@`.
    fn scan_at(&mut self) -> Token {
        if self.peek() == Some('@') {
            self.advance();
            while self.peek().is_some_and(is_ident_continue) {
                self.advance();
            }
            let text = &self.input[self.start..self.pos];
            return self.make_token(TokenKind::Identifier(String::from(text)));
        }

        if self.peek().is_some_and(is_ident_continue) {
            while self.peek().is_some_and(is_ident_continue) {
                self.advance();
            }
            let text = &self.input[self.start..self.pos];
            return self.make_token(TokenKind::Placeholder(String::from(text)));
        }

        self.make_token(TokenKind::Symbol('@'))
    }

    /// Scans what follows a `$`: a numbered marker (`$1`), a dollar-quoted
    /// string (`$$...$$`, `$fn$...$fn$`), or a lone `$`.
    fn scan_dollar(&mut self) -> Token {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => {
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
                let text = &self.input[self.start..self.pos];
                self.make_token(TokenKind::Placeholder(String::from(text)))
            }
            Some(c) if c == '$' || is_ident_start(c) => self.scan_dollar_quoted(),
            _ => self.make_token(TokenKind::Symbol('$')),
        }
    }

    fn scan_dollar_quoted(&mut self) -> Token {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        if self.peek() != Some('$') {
            self.pos = self.start + 1;
            return self.make_token(TokenKind::Symbol('$'));
        }
        self.advance();

        let tag = &self.input[self.start..self.pos];
        match self.input[self.pos..].find(tag) {
            Some(offset) => {
                let body = &self.input[self.pos..self.pos + offset];
                self.pos += offset + tag.len();
                self.make_token(TokenKind::String(String::from(body)))
            }
            None => {
                self.pos = self.input.len();
                self.error("Unterminated dollar-quoted string")
            }
        }
    }

    /// Scans the next token.
    #[must_use]
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();
            self.start = self.pos;

            let Some(c) = self.advance() else {
                return self.make_token(TokenKind::Eof);
            };

            let comment = match c {
                '-' if self.peek() == Some('-') => {
                    self.advance();
                    Some(self.scan_line_comment())
                }
                '/' if self.peek() == Some('*') => {
                    self.advance();
                    Some(self.scan_block_comment())
                }
                '#' if self.options.hash_comments => Some(self.scan_line_comment()),
                _ => None,
            };

            match comment {
                Some(token) if self.options.keep_comments => return token,
                Some(_) => {}
                None => return self.scan_token(c),
            }
        }
    }

    /// Scans a token whose first character `c` was consumed.
    fn scan_token(&mut self, c: char) -> Token {
        let opts = self.options;
        match c {
            '(' => self.make_token(TokenKind::LeftParen),
            ')' => self.make_token(TokenKind::RightParen),
            ',' => self.make_token(TokenKind::Comma),
            ';' => self.make_token(TokenKind::Semicolon),
            '+' => self.make_token(TokenKind::Plus),
            '-' => self.make_token(TokenKind::Minus),
            '*' => self.make_token(TokenKind::Star),
            '/' => self.make_token(TokenKind::Slash),
            '%' => self.make_token(TokenKind::Percent),
            '?' => self.make_token(TokenKind::Question),
            '.' => self.make_token(TokenKind::Dot),
            '=' => self.make_token(TokenKind::Eq),
            '[' if opts.bracket_identifiers => self.scan_quoted_identifier(']'),
            '[' => self.make_token(TokenKind::LeftBracket),
            ']' => self.make_token(TokenKind::RightBracket),
            ':' => {
                if self.peek() == Some(':') {
                    self.advance();
                    self.make_token(TokenKind::DoubleColon)
                } else {
                    self.make_token(TokenKind::Colon)
                }
            }
            '<' => match self.peek() {
                Some('=') => {
                    self.advance();
                    self.make_token(TokenKind::LtEq)
                }
                Some('>') => {
                    self.advance();
                    self.make_token(TokenKind::NotEq)
                }
                _ => self.make_token(TokenKind::Lt),
            },
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.make_token(TokenKind::GtEq)
                } else {
                    self.make_token(TokenKind::Gt)
                }
            }
            '!' if self.peek() == Some('=') => {
                self.advance();
                self.make_token(TokenKind::NotEq)
            }
            '|' if self.peek() == Some('|') => {
                self.advance();
                self.make_token(TokenKind::Concat)
            }
            '@' => self.scan_at(),
            '$' => self.scan_dollar(),

            '\'' => self.scan_string('\'', opts.backslash_escapes),
            '"' if opts.double_quoted_strings => self.scan_string('"', opts.backslash_escapes),
            '"' => self.scan_quoted_identifier('"'),
            '`' => self.scan_quoted_identifier('`'),

            'X' | 'x' if self.peek() == Some('\'') => self.scan_blob(),
            'N' | 'n' if self.peek() == Some('\'') => {
                self.advance();
                self.scan_string('\'', opts.backslash_escapes)
            }
            'E' | 'e' if self.peek() == Some('\'') => {
                self.advance();
                self.scan_string('\'', true)
            }

            c if c.is_ascii_digit() => self.scan_number(),
            c if is_ident_start(c) => self.scan_identifier(),
            c if c.is_ascii_punctuation() => self.make_token(TokenKind::Symbol(c)),
            c => self.make_token(TokenKind::Error(format!("Unexpected character: {c}"))),
        }
    }

    /// Tokenizes the entire input; the last token is always `Eof`.
    #[must_use]
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn kinds_with(input: &str, options: LexerOptions) -> Vec<TokenKind> {
        Lexer::with_options(input, options)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn ident(name: &str) -> TokenKind {
        TokenKind::Identifier(String::from(name))
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(token_kinds(""), vec![TokenKind::Eof]);
        assert_eq!(token_kinds("   \n\t  "), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_comments_skipped_by_default() {
        assert_eq!(
            token_kinds("SELECT -- shard:orders:orders_2024\n/* note */ id"),
            vec![TokenKind::Keyword(Keyword::Select), ident("id"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_comments_kept_on_request() {
        let options = LexerOptions::default().keep_comments(true);
        assert_eq!(
            kinds_with("-- shard:a:b\nSELECT /* x */", options),
            vec![
                TokenKind::Comment(String::from("shard:a:b")),
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Comment(String::from("x")),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_hash_comments() {
        let mysql = LexerOptions {
            hash_comments: true,
            ..LexerOptions::default()
        };
        assert_eq!(kinds_with("# note\nid", mysql), vec![ident("id"), TokenKind::Eof]);
        assert_eq!(
            token_kinds("#"),
            vec![TokenKind::Symbol('#'), TokenKind::Eof]
        );
    }

    #[test]
    fn test_identifiers_are_whole_words() {
        assert_eq!(
            token_kinds("orders order_items orders_2024 a$b"),
            vec![
                ident("orders"),
                ident("order_items"),
                ident("orders_2024"),
                ident("a$b"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_quoted_identifiers() {
        assert_eq!(
            token_kinds("\"order items\" `orders` \"a\"\"b\""),
            vec![
                TokenKind::QuotedIdentifier(String::from("order items")),
                TokenKind::QuotedIdentifier(String::from("orders")),
                TokenKind::QuotedIdentifier(String::from("a\"b")),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_bracket_identifiers() {
        let mssql = LexerOptions {
            bracket_identifiers: true,
            ..LexerOptions::default()
        };
        assert_eq!(
            kinds_with("[dbo].[orders]", mssql),
            vec![
                TokenKind::QuotedIdentifier(String::from("dbo")),
                TokenKind::Dot,
                TokenKind::QuotedIdentifier(String::from("orders")),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            token_kinds("a[1]"),
            vec![
                ident("a"),
                TokenKind::LeftBracket,
                TokenKind::Number,
                TokenKind::RightBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            token_kinds("'it''s' N'x' E'a\\'b'"),
            vec![
                TokenKind::String(String::from("it's")),
                TokenKind::String(String::from("x")),
                TokenKind::String(String::from("a'b")),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_mysql_strings() {
        let mysql = LexerOptions {
            backslash_escapes: true,
            double_quoted_strings: true,
            ..LexerOptions::default()
        };
        assert_eq!(
            kinds_with(r#"'it\'s orders' "orders""#, mysql),
            vec![
                TokenKind::String(String::from("it's orders")),
                TokenKind::String(String::from("orders")),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let kinds = token_kinds("'abc");
        assert!(matches!(kinds[0], TokenKind::Error(_)));
    }

    #[test]
    fn test_dollar_quoted_strings() {
        assert_eq!(
            token_kinds("$$orders$$ $fn$ x $fn$"),
            vec![
                TokenKind::String(String::from("orders")),
                TokenKind::String(String::from(" x ")),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_blob() {
        assert_eq!(
            token_kinds("X'CAFE'"),
            vec![TokenKind::Blob(String::from("CAFE")), TokenKind::Eof]
        );
        assert!(matches!(token_kinds("X'CAF'")[0], TokenKind::Error(_)));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            token_kinds("42 3.14 1e10 2.5e-3"),
            vec![
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            token_kinds("@p0 $1 $12 ? @@ROWCOUNT"),
            vec![
                TokenKind::Placeholder(String::from("@p0")),
                TokenKind::Placeholder(String::from("$1")),
                TokenKind::Placeholder(String::from("$12")),
                TokenKind::Question,
                ident("@@ROWCOUNT"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            token_kinds("= != <> < <= > >= || :: :"),
            vec![
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::NotEq,
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::Concat,
                TokenKind::DoubleColon,
                TokenKind::Colon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_simple_select() {
        assert_eq!(
            token_kinds("SELECT id, name FROM sys_function WHERE id = @p0"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                ident("id"),
                TokenKind::Comma,
                ident("name"),
                TokenKind::Keyword(Keyword::From),
                ident("sys_function"),
                TokenKind::Keyword(Keyword::Where),
                ident("id"),
                TokenKind::Eq,
                TokenKind::Placeholder(String::from("@p0")),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_span_tracking() {
        let tokens = Lexer::new("SELECT \"id\"").tokenize();
        assert_eq!(tokens[0].span, Span::new(0, 6));
        assert_eq!(tokens[1].span, Span::new(7, 11));
    }
}
