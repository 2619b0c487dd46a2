//! Core parser infrastructure: token cursor, error reporting, helpers.

use conduit_play_lexer::{Token, TokenKind};
use conduit_play_types::ast::{Ident, Program};
use conduit_play_types::{ParseError, Span, MAX_NESTING_DEPTH};

pub(crate) type ParseResult<T> = Result<T, ParseError>;

/// Parse a token sequence into a [`Program`].
pub fn parse(tokens: Vec<Token>) -> Result<Program, ParseError> {
    Parser::new(tokens).parse()
}

/// The playground parser.
///
/// Consumes the token stream produced by the tokenizer and builds an AST.
/// The first syntax error aborts the parse.
pub struct Parser {
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Current block/expression nesting depth.
    depth: u32,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse the whole token stream into a `Program`.
    pub fn parse(mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();
        self.skip_newlines();
        while !self.at_end() {
            body.push(self.parse_statement()?);
            self.skip_newlines();
        }
        let span = match (body.first(), body.last()) {
            (Some(first), Some(last)) => first.span.merge(last.span),
            _ => Span::point(1, 1),
        };
        Ok(Program { body, span })
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token, or `None` at end of input.
    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Look ahead by `n` tokens from the current position.
    pub(crate) fn look_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> ParseResult<Token> {
        match self.tokens.get(self.pos) {
            Some(token) => {
                let token = token.clone();
                self.pos += 1;
                Ok(token)
            }
            None => Err(self.error_here("a token")),
        }
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Span of the previously consumed token.
    pub(crate) fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span)
            .unwrap_or_else(|| Span::point(1, 1))
    }

    /// Span of the current token, or just past the last one at end of input.
    pub(crate) fn current_span(&self) -> Span {
        match self.peek() {
            Some(token) => token.span,
            None => {
                let last = self.previous_span();
                Span::point(last.end_line, last.end_col + 1)
            }
        }
    }

    pub(crate) fn check_kind(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    pub(crate) fn check_keyword(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(keyword))
    }

    pub(crate) fn check_operator(&self, op: &str) -> bool {
        self.peek().is_some_and(|t| t.is_operator(op))
    }

    pub(crate) fn check_punct(&self, punct: &str) -> bool {
        self.peek().is_some_and(|t| t.is_punct(punct))
    }

    /// If the current token is the given punctuation, consume it.
    pub(crate) fn eat_punct(&mut self, punct: &str) -> bool {
        if self.check_punct(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_operator(&mut self, op: &str) -> bool {
        if self.check_operator(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.check_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // ── Newline Handling ──────────────────────────────────────────────────────

    pub(crate) fn skip_newlines(&mut self) {
        while self.check_kind(TokenKind::Newline) {
            self.pos += 1;
        }
    }

    /// A simple statement ends at a newline, a dedent or end of input.
    pub(crate) fn expect_statement_end(&mut self) -> ParseResult<()> {
        match self.peek().map(|t| t.kind) {
            None | Some(TokenKind::Dedent) => Ok(()),
            Some(TokenKind::Newline) => {
                self.skip_newlines();
                Ok(())
            }
            Some(_) => Err(self.error_here("end of statement")),
        }
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    pub(crate) fn expect_punct(&mut self, punct: &str) -> ParseResult<Token> {
        if self.check_punct(punct) {
            self.advance()
        } else {
            Err(self.error_here(format!("'{punct}'")))
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> ParseResult<Token> {
        if self.check_keyword(keyword) {
            self.advance()
        } else {
            Err(self.error_here(format!("'{keyword}'")))
        }
    }

    pub(crate) fn expect_kind(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check_kind(kind) {
            self.advance()
        } else {
            Err(self.error_here(kind.to_string()))
        }
    }

    /// Expect an identifier token.
    pub(crate) fn expect_identifier(&mut self) -> ParseResult<Ident> {
        let token = self.expect_kind(TokenKind::Identifier)?;
        Ok(Ident::new(token.text, token.span))
    }

    /// Expect a dotted name such as `conduit.mcp`.
    pub(crate) fn expect_dotted_name(&mut self) -> ParseResult<Vec<Ident>> {
        let mut parts = vec![self.expect_identifier()?];
        while self.eat_punct(".") {
            parts.push(self.expect_identifier()?);
        }
        Ok(parts)
    }

    // ── Nesting ───────────────────────────────────────────────────────────────

    /// Enter one nesting level, failing once the limit is passed.
    pub(crate) fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::new(
                format!("at most {MAX_NESTING_DEPTH} nested levels"),
                "deeper nesting",
                self.current_span(),
            ));
        }
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Release `levels` nesting levels at once. Every operator folded into a
    /// left-deep chain deepens the tree by one, so chains are charged per
    /// operator and released when the chain ends.
    pub(crate) fn leave_levels(&mut self, levels: u32) {
        self.depth = self.depth.saturating_sub(levels);
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Build a syntax error naming what was expected and the current token.
    pub(crate) fn error_here(&self, expected: impl Into<String>) -> ParseError {
        let found = match self.peek() {
            Some(token) => token.describe(),
            None => "end of input".to_string(),
        };
        ParseError::new(expected, found, self.current_span())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_play_lexer::tokenize;

    #[test]
    fn test_error_here_at_end_of_input() {
        let mut parser = Parser::new(tokenize("x").unwrap());
        parser.advance().unwrap();
        let err = parser.error_here("':'");
        assert_eq!(err.found, "end of input");
        assert_eq!(err.span.start_col, 2);
    }

    #[test]
    fn test_eat_helpers_only_consume_on_match() {
        let mut parser = Parser::new(tokenize("( x").unwrap());
        assert!(!parser.eat_punct(")"));
        assert!(parser.eat_punct("("));
        assert!(!parser.eat_operator("="));
        assert_eq!(parser.expect_identifier().unwrap().name, "x");
        assert!(parser.at_end());
    }
}
