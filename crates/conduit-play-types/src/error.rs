use crate::Span;
use serde::Serialize;
use thiserror::Error;

/// Maximum nesting of blocks and expressions the parser accepts.
pub const MAX_NESTING_DEPTH: u32 = 64;

/// A lexical error. Always fatal to the compile.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LexError {
    #[error("unexpected character '{character}' at line {line}, column {column}")]
    UnexpectedCharacter { character: char, line: u32, column: u32 },

    /// Reported at the opening quote, not where scanning gave up.
    #[error("unterminated string starting at line {line}, column {column}")]
    UnterminatedString { line: u32, column: u32 },

    #[error("unindent does not match any outer indentation level at line {line}, column {column}")]
    InconsistentDedent { line: u32, column: u32 },
}

impl LexError {
    /// Position the error points at.
    pub fn span(&self) -> Span {
        match *self {
            LexError::UnexpectedCharacter { line, column, .. }
            | LexError::UnterminatedString { line, column }
            | LexError::InconsistentDedent { line, column } => Span::point(line, column),
        }
    }
}

/// A syntax error: a required token was missing or unexpected.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("expected {expected}, found {found} at line {}", .span.start_line)]
pub struct ParseError {
    pub expected: String,
    pub found: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(expected: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        Self {
            expected: expected.into(),
            found: found.into(),
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error_messages_carry_position() {
        let err = LexError::UnexpectedCharacter {
            character: '$',
            line: 3,
            column: 7,
        };
        assert_eq!(
            err.to_string(),
            "unexpected character '$' at line 3, column 7"
        );
        assert_eq!(err.span(), Span::point(3, 7));
    }

    #[test]
    fn test_unterminated_string_message() {
        let err = LexError::UnterminatedString { line: 2, column: 5 };
        assert_eq!(
            err.to_string(),
            "unterminated string starting at line 2, column 5"
        );
    }

    #[test]
    fn test_parse_error_message() {
        let err = ParseError::new("':'", "NEWLINE", Span::point(4, 12));
        assert_eq!(err.to_string(), "expected ':', found NEWLINE at line 4");
    }

    #[test]
    fn test_lex_error_serializes_with_kind_tag() {
        let json = serde_json::to_string(&LexError::UnterminatedString { line: 1, column: 1 })
            .unwrap();
        assert!(json.contains(r#""kind":"unterminated_string""#));
    }
}
