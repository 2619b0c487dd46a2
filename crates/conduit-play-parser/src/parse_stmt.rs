//! Statement parsing: dispatch, blocks, control flow.

use conduit_play_lexer::TokenKind;
use conduit_play_types::ast::*;

use crate::parser::{ParseResult, Parser};

impl Parser {
    /// Parse a single statement, dispatching on its leading token.
    pub(crate) fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let Some(token) = self.peek() else {
            return Err(self.error_here("a statement"));
        };
        let (kind, text) = (token.kind, token.text.clone());
        match (kind, text.as_str()) {
            (TokenKind::Keyword, "from") => self.parse_import_from(),
            (TokenKind::Keyword, "import") => self.parse_import(),
            (TokenKind::Keyword, "def") => self.parse_function_def(),
            (TokenKind::Keyword, "class") => self.parse_class_def(),
            (TokenKind::Keyword, "if") => self.parse_if(),
            (TokenKind::Keyword, "while") => self.parse_while(),
            (TokenKind::Keyword, "for") => self.parse_for(),
            (TokenKind::Keyword, "return") => self.parse_return(),
            (TokenKind::Punctuation, "@") => self.parse_decorator(),
            (TokenKind::Identifier, "pass") if self.ends_statement_at(1) => {
                let span = self.advance()?.span;
                self.expect_statement_end()?;
                Ok(Stmt::new(StmtKind::Pass, span))
            }
            (TokenKind::Indent | TokenKind::Dedent | TokenKind::Newline, _) => {
                Err(self.error_here("a statement"))
            }
            _ => {
                let expr = self.parse_expression()?;
                let span = expr.span;
                self.expect_statement_end()?;
                Ok(Stmt::new(StmtKind::Expr(expr), span))
            }
        }
    }

    /// Returns `true` if the token `n` ahead ends a simple statement.
    fn ends_statement_at(&self, n: usize) -> bool {
        match self.look_ahead(n) {
            None => true,
            Some(token) => matches!(token.kind, TokenKind::Newline | TokenKind::Dedent),
        }
    }

    /// Parse `: suite`, where the suite is either an indented block or a
    /// single statement on the same line.
    pub(crate) fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect_punct(":")?;
        self.enter()?;

        let body = if self.check_kind(TokenKind::Newline) {
            self.skip_newlines();
            self.expect_kind(TokenKind::Indent)?;
            let mut stmts = Vec::new();
            loop {
                self.skip_newlines();
                if self.at_end() {
                    break;
                }
                if self.check_kind(TokenKind::Dedent) {
                    self.advance()?;
                    break;
                }
                stmts.push(self.parse_statement()?);
            }
            stmts
        } else {
            vec![self.parse_statement()?]
        };

        self.leave();
        Ok(body)
    }

    /// `if cond: block [elif cond: block]* [else: block]`
    ///
    /// Also entered on `elif`, which becomes a nested `If` in the else branch.
    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let start = self.advance()?.span;
        let condition = self.parse_expression()?;
        let then_body = self.parse_block()?;
        let else_body = if self.check_keyword("elif") {
            vec![self.parse_if()?]
        } else if self.eat_keyword("else") {
            self.parse_block()?
        } else {
            Vec::new()
        };
        let span = start.merge(self.previous_span());
        Ok(Stmt::new(
            StmtKind::If(IfStmt {
                condition,
                then_body,
                else_body,
            }),
            span,
        ))
    }

    /// `while cond: block`
    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let start = self.expect_keyword("while")?.span;
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        let span = start.merge(self.previous_span());
        Ok(Stmt::new(StmtKind::While(WhileStmt { condition, body }), span))
    }

    /// `for name in expr: block`
    fn parse_for(&mut self) -> ParseResult<Stmt> {
        let start = self.expect_keyword("for")?.span;
        let target = self.expect_identifier()?;
        self.expect_keyword("in")?;
        let iter = self.parse_expression()?;
        let body = self.parse_block()?;
        let span = start.merge(self.previous_span());
        Ok(Stmt::new(
            StmtKind::For(ForStmt { target, iter, body }),
            span,
        ))
    }

    /// `return [expr]`
    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let start = self.expect_keyword("return")?.span;
        let value = if self.ends_statement_at(0) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let span = start.merge(self.previous_span());
        self.expect_statement_end()?;
        Ok(Stmt::new(StmtKind::Return(value), span))
    }
}
