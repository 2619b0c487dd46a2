//! Core tokenizer: converts playground source text to a token stream.
//!
//! Features:
//! - Strings in single, double or triple quotes with `\n \t \r \\` and quote escapes
//! - Unsigned numbers with at most one decimal point
//! - Greedy two-character operators (`==` never splits into two `=`)
//! - `#` line comments stripped
//! - Layout tokens: `Newline` at the end of each logical line, `Indent` /
//!   `Dedent` when indentation changes; line feeds inside brackets are ignored
//!
//! The first lexical error stops the scan; there is no recovery.

use conduit_play_types::{LexError, SourceFile, Span};

use crate::token::{Token, TokenKind, KEYWORDS, ONE_CHAR_OPERATORS, PUNCTUATION, TWO_CHAR_OPERATORS};

/// Columns a tab advances to (next multiple of this width).
const TAB_WIDTH: usize = 8;

/// Tokenize a source string.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let file = SourceFile::new("<playground>", source);
    Lexer::new(&file).tokenize()
}

/// The playground tokenizer.
pub struct Lexer {
    /// Source characters (columns count characters, not bytes).
    chars: Vec<char>,
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    col: u32,
    tokens: Vec<Token>,
    /// Indentation widths of the open blocks. Empty until the first code
    /// line, whose indentation becomes the base level.
    indent_stack: Vec<usize>,
    /// Open `(`, `[` and `{` count; line feeds are insignificant while > 0.
    bracket_depth: u32,
    at_line_start: bool,
}

impl Lexer {
    pub fn new(source_file: &SourceFile) -> Self {
        Self {
            chars: source_file.source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            tokens: Vec::new(),
            indent_stack: Vec::new(),
            bracket_depth: 0,
            at_line_start: true,
        }
    }

    /// Lex the entire source into a token sequence.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        loop {
            if self.at_line_start && self.bracket_depth == 0 {
                if !self.scan_line_start()? {
                    break;
                }
                continue;
            }

            let Some(ch) = self.peek() else { break };
            match ch {
                ' ' | '\t' | '\r' | '\x0c' => {
                    self.advance();
                }
                '\n' => self.scan_line_feed(),
                '#' => self.skip_comment(),
                '"' | '\'' => self.scan_string(ch)?,
                '0'..='9' => self.scan_number(),
                c if c.is_alphabetic() || c == '_' => self.scan_identifier(),
                _ => self.scan_symbol(ch)?,
            }
        }

        // Close any blocks still open at end of input.
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push_layout(TokenKind::Dedent);
        }

        Ok(self.tokens)
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(start_line, start_col, self.line, self.col.saturating_sub(1).max(1))
    }

    fn push(&mut self, kind: TokenKind, text: impl Into<String>, start_line: u32, start_col: u32) {
        let span = self.span_from(start_line, start_col);
        self.tokens.push(Token::new(kind, text, span));
    }

    fn push_layout(&mut self, kind: TokenKind) {
        let span = Span::point(self.line, self.col);
        self.tokens.push(Token::new(kind, "", span));
    }

    // ─────────────────────────────────────────────────────────────
    // Layout
    // ─────────────────────────────────────────────────────────────

    /// Measure indentation at the start of a line and emit `Indent`/`Dedent`
    /// for code lines. Blank and comment-only lines are consumed silently.
    ///
    /// Returns `false` at end of input.
    fn scan_line_start(&mut self) -> Result<bool, LexError> {
        let mut width = 0usize;
        while let Some(ch) = self.peek() {
            match ch {
                ' ' => width += 1,
                '\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                '\r' | '\x0c' => {}
                _ => break,
            }
            self.advance();
        }

        match self.peek() {
            None => Ok(false),
            Some('\n') => {
                self.advance();
                Ok(true)
            }
            Some('#') => {
                self.skip_comment();
                Ok(true)
            }
            Some(_) => {
                self.apply_indentation(width)?;
                self.at_line_start = false;
                Ok(true)
            }
        }
    }

    fn apply_indentation(&mut self, width: usize) -> Result<(), LexError> {
        let Some(&top) = self.indent_stack.last() else {
            self.indent_stack.push(width);
            return Ok(());
        };

        if width > top {
            self.indent_stack.push(width);
            self.push_layout(TokenKind::Indent);
            return Ok(());
        }

        while self.indent_stack.len() > 1 && self.indent_stack.last().is_some_and(|&w| width < w) {
            self.indent_stack.pop();
            self.push_layout(TokenKind::Dedent);
        }
        if self.indent_stack.last() != Some(&width) {
            return Err(LexError::InconsistentDedent {
                line: self.line,
                column: self.col,
            });
        }
        Ok(())
    }

    fn scan_line_feed(&mut self) {
        let (line, col) = (self.line, self.col);
        self.advance();
        if self.bracket_depth > 0 {
            return;
        }
        let ends_logical_line = self
            .tokens
            .last()
            .is_some_and(|t| t.kind != TokenKind::Newline);
        if ends_logical_line {
            self.tokens
                .push(Token::new(TokenKind::Newline, "\n", Span::point(line, col)));
        }
        self.at_line_start = true;
    }

    /// Skip a `#` comment up to (not including) the line feed.
    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Literals & identifiers
    // ─────────────────────────────────────────────────────────────

    /// Scan a string literal starting at the opening quote.
    fn scan_string(&mut self, quote: char) -> Result<(), LexError> {
        let (start_line, start_col) = (self.line, self.col);
        let unterminated = LexError::UnterminatedString {
            line: start_line,
            column: start_col,
        };

        let triple = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        let quote_len = if triple { 3 } else { 1 };
        for _ in 0..quote_len {
            self.advance();
        }

        let mut buf = String::new();
        loop {
            match self.peek() {
                None => return Err(unterminated),
                Some('\n') if !triple => return Err(unterminated),
                Some(c) if c == quote => {
                    if !triple {
                        self.advance();
                        break;
                    }
                    if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                        for _ in 0..3 {
                            self.advance();
                        }
                        break;
                    }
                    self.advance();
                    buf.push(c);
                }
                Some('\\') => {
                    self.advance();
                    let escaped = self.advance().ok_or_else(|| unterminated.clone())?;
                    buf.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                }
                Some(c) => {
                    self.advance();
                    buf.push(c);
                }
            }
        }

        self.push(TokenKind::String, buf, start_line, start_col);
        Ok(())
    }

    fn scan_number(&mut self) {
        let (start_line, start_col) = (self.line, self.col);
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        self.push(TokenKind::Number, text, start_line, start_col);
    }

    fn scan_identifier(&mut self) {
        let (start_line, start_col) = (self.line, self.col);
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let kind = if KEYWORDS.contains(&text.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        self.push(kind, text, start_line, start_col);
    }

    // ─────────────────────────────────────────────────────────────
    // Operators & punctuation
    // ─────────────────────────────────────────────────────────────

    fn scan_symbol(&mut self, ch: char) -> Result<(), LexError> {
        let (start_line, start_col) = (self.line, self.col);

        if let Some(next) = self.peek_at(1) {
            let pair: String = [ch, next].iter().collect();
            if TWO_CHAR_OPERATORS.contains(&pair.as_str()) {
                self.advance();
                self.advance();
                self.push(TokenKind::Operator, pair, start_line, start_col);
                return Ok(());
            }
        }

        if ONE_CHAR_OPERATORS.contains(ch) {
            self.advance();
            self.push(TokenKind::Operator, ch.to_string(), start_line, start_col);
            return Ok(());
        }

        if PUNCTUATION.contains(ch) {
            match ch {
                '(' | '[' | '{' => self.bracket_depth += 1,
                ')' | ']' | '}' => self.bracket_depth = self.bracket_depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
            self.push(TokenKind::Punctuation, ch.to_string(), start_line, start_col);
            return Ok(());
        }

        Err(LexError::UnexpectedCharacter {
            character: ch,
            line: start_line,
            column: start_col,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<String> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_two_char_operators_are_greedy() {
        assert_eq!(texts("a ** b // c -> d"), ["a", "**", "b", "//", "c", "->", "d"]);
    }

    #[test]
    fn test_bang_alone_is_an_operator() {
        let tokens = tokenize("!x").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Operator);
        assert_eq!(tokens[0].text, "!");
    }

    #[test]
    fn test_columns_are_character_based() {
        let tokens = tokenize("s = \"é\" + x").unwrap();
        let x = tokens.last().unwrap();
        assert_eq!(x.text, "x");
        assert_eq!(x.column(), 11);
    }
}
