//! SQL Lexer/Tokenizer
//!
//! A hand-written lexer that turns command text into tokens with byte spans.
//! The transpiler never parses SQL into a tree: shape checks, marker
//! renumbering and table-name rewriting all work on this token stream, which
//! is what keeps string literals, comments and longer identifiers safe from
//! substring edits.

mod span;
mod token;
mod tokenizer;

pub use span::Span;
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::{Lexer, LexerOptions};
