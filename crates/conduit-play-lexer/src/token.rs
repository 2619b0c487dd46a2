//! Token types for the playground tokenizer.
//!
//! A [`Token`] pairs a coarse [`TokenKind`] classification with the literal
//! text it was scanned from and its source [`Span`].

use conduit_play_types::Span;
use std::fmt;

/// The closed keyword set. Keywords are case-sensitive.
pub const KEYWORDS: &[&str] = &[
    "from", "import", "def", "class", "if", "else", "elif", "while", "for", "return", "True",
    "False", "None", "and", "or", "not", "in", "is",
];

/// Two-character operators, matched greedily before the single-character set.
pub(crate) const TWO_CHAR_OPERATORS: &[&str] = &["==", "!=", "<=", ">=", "//", "**", "->"];

pub(crate) const ONE_CHAR_OPERATORS: &str = "+-*/%=<>!";

pub(crate) const PUNCTUATION: &str = "()[]{},.:@";

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// String literal; `text` holds the unescaped value.
    String,
    /// Numeric literal; `text` holds the digits as written.
    Number,
    Identifier,
    Keyword,
    Operator,
    Punctuation,
    /// End of a logical line.
    Newline,
    /// Indentation increased at the start of a logical line.
    Indent,
    /// Indentation decreased at the start of a logical line.
    Dedent,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::String => "STRING",
            TokenKind::Number => "NUMBER",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Keyword => "KEYWORD",
            TokenKind::Operator => "OPERATOR",
            TokenKind::Punctuation => "PUNCTUATION",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Indent => "INDENT",
            TokenKind::Dedent => "DEDENT",
        })
    }
}

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    /// 1-based line of the token's first character.
    pub fn line(&self) -> u32 {
        self.span.start_line
    }

    /// 1-based column of the token's first character.
    pub fn column(&self) -> u32 {
        self.span.start_col
    }

    /// Returns `true` if this token has the given kind and text.
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.is(TokenKind::Keyword, keyword)
    }

    pub fn is_operator(&self, op: &str) -> bool {
        self.is(TokenKind::Operator, op)
    }

    pub fn is_punct(&self, punct: &str) -> bool {
        self.is(TokenKind::Punctuation, punct)
    }

    /// How the token is named in syntax errors, e.g. `OPERATOR '='`.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent => self.kind.to_string(),
            TokenKind::String => format!("STRING \"{}\"", self.text.escape_debug()),
            _ => format!("{} '{}'", self.kind, self.text),
        }
    }
}
