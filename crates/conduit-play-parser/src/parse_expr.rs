//! Expression parsing: precedence climbing from assignment down to primaries.
//!
//! Precedence (lowest → highest):
//! 1. `=`              (right-assoc, target must be a name, member or subscript)
//! 2. `or`
//! 3. `and`
//! 4. `not`            (prefix)
//! 5. `== != < > <= >=` (chainable: `a < b < c` is one Compare node)
//! 6. `+ -`
//! 7. `* / % //`
//! 8. unary `-`
//! 9. `**`             (right-assoc)
//! 10. postfix: call, `.member`, `.method()`, `[index]`

use conduit_play_lexer::TokenKind;
use conduit_play_types::ast::*;
use conduit_play_types::ParseError;

use crate::parser::{ParseResult, Parser};

impl Parser {
    /// Parse a full expression, assignment included.
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.enter()?;
        let result = self.parse_assignment();
        self.leave();
        result
    }

    /// Parse an expression that cannot be an assignment (parameter defaults).
    pub(crate) fn parse_value_expression(&mut self) -> ParseResult<Expr> {
        self.enter()?;
        let result = self.parse_or();
        self.leave();
        result
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        let target = self.parse_or()?;
        if !self.eat_operator("=") {
            return Ok(target);
        }
        if !matches!(
            target.kind,
            ExprKind::Identifier(_) | ExprKind::MemberAccess { .. } | ExprKind::Subscript { .. }
        ) {
            return Err(ParseError::new(
                "an assignment target",
                target.node_kind().to_string(),
                target.span,
            ));
        }
        let value = self.parse_assignment()?;
        let span = target.span.merge(value.span);
        Ok(Expr::new(
            ExprKind::Assignment {
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        ))
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;
        let mut folds = 0;
        while self.eat_keyword("or") {
            self.enter()?;
            folds += 1;
            let right = self.parse_and()?;
            left = binary(left, BinOp::Or, right);
        }
        self.leave_levels(folds);
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_not()?;
        let mut folds = 0;
        while self.eat_keyword("and") {
            self.enter()?;
            folds += 1;
            let right = self.parse_not()?;
            left = binary(left, BinOp::And, right);
        }
        self.leave_levels(folds);
        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        if !self.check_keyword("not") {
            return self.parse_comparison();
        }
        let start = self.advance()?.span;
        self.enter()?;
        let operand = self.parse_not();
        self.leave();
        let operand = operand?;
        let span = start.merge(operand.span);
        Ok(Expr::new(
            ExprKind::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let first = self.parse_additive()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                Some(t) if t.kind == TokenKind::Operator => match t.text.as_str() {
                    "==" => BinOp::Eq,
                    "!=" => BinOp::NotEq,
                    "<" => BinOp::Less,
                    ">" => BinOp::Greater,
                    "<=" => BinOp::LessEq,
                    ">=" => BinOp::GreaterEq,
                    _ => break,
                },
                _ => break,
            };
            self.advance()?;
            self.enter()?;
            rest.push((op, self.parse_additive()?));
        }
        self.leave_levels(rest.len() as u32);
        if rest.len() < 2 {
            return Ok(match rest.pop() {
                Some((op, right)) => binary(first, op, right),
                None => first,
            });
        }
        let span = rest
            .last()
            .map_or(first.span, |(_, last)| first.span.merge(last.span));
        Ok(Expr::new(
            ExprKind::Compare {
                first: Box::new(first),
                rest,
            },
            span,
        ))
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        let mut folds = 0;
        loop {
            let op = if self.eat_operator("+") {
                BinOp::Add
            } else if self.eat_operator("-") {
                BinOp::Sub
            } else {
                break;
            };
            self.enter()?;
            folds += 1;
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
        self.leave_levels(folds);
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        let mut folds = 0;
        loop {
            let op = if self.eat_operator("*") {
                BinOp::Mul
            } else if self.eat_operator("/") {
                BinOp::Div
            } else if self.eat_operator("%") {
                BinOp::Mod
            } else if self.eat_operator("//") {
                BinOp::FloorDiv
            } else {
                break;
            };
            self.enter()?;
            folds += 1;
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
        self.leave_levels(folds);
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if !self.check_operator("-") {
            return self.parse_power();
        }
        let start = self.advance()?.span;
        self.enter()?;
        let operand = self.parse_unary();
        self.leave();
        let operand = operand?;
        let span = start.merge(operand.span);
        Ok(Expr::new(
            ExprKind::UnaryOp {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `base ** exponent`; the exponent may itself carry a unary minus.
    fn parse_power(&mut self) -> ParseResult<Expr> {
        let base = self.parse_postfix()?;
        if !self.eat_operator("**") {
            return Ok(base);
        }
        self.enter()?;
        let exponent = self.parse_unary();
        self.leave();
        Ok(binary(base, BinOp::Pow, exponent?))
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        let mut folds = 0;
        loop {
            if self.check_punct("(") || self.check_punct(".") || self.check_punct("[") {
                self.enter()?;
                folds += 1;
            }
            if self.eat_punct("(") {
                let args = self.parse_arguments()?;
                let span = expr.span.merge(self.previous_span());
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                );
            } else if self.eat_punct(".") {
                let name = self.expect_identifier()?;
                if self.eat_punct("(") {
                    let args = self.parse_arguments()?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::MethodCall {
                            object: Box::new(expr),
                            method: name,
                            args,
                        },
                        span,
                    );
                } else {
                    let span = expr.span.merge(name.span);
                    expr = Expr::new(
                        ExprKind::MemberAccess {
                            object: Box::new(expr),
                            member: name,
                        },
                        span,
                    );
                }
            } else if self.eat_punct("[") {
                let index = self.parse_expression()?;
                self.expect_punct("]")?;
                let span = expr.span.merge(self.previous_span());
                expr = Expr::new(
                    ExprKind::Subscript {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            } else {
                break;
            }
        }
        self.leave_levels(folds);
        Ok(expr)
    }

    /// Parse call arguments after the opening `(`, through the closing `)`.
    ///
    /// `name=value` becomes a [`ExprKind::KeywordArg`].
    pub(crate) fn parse_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.check_punct(")") {
            let is_keyword_arg = self.check_kind(TokenKind::Identifier)
                && self.look_ahead(1).is_some_and(|t| t.is_operator("="));
            if is_keyword_arg {
                let name = self.expect_identifier()?;
                self.advance()?;
                let value = self.parse_expression()?;
                let span = name.span.merge(value.span);
                args.push(Expr::new(
                    ExprKind::KeywordArg {
                        name,
                        value: Box::new(value),
                    },
                    span,
                ));
            } else {
                args.push(self.parse_expression()?);
            }
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let Some(token) = self.peek() else {
            return Err(self.error_here("an expression"));
        };
        let (kind, text, span) = (token.kind, token.text.clone(), token.span);

        match kind {
            TokenKind::Number => {
                self.advance()?;
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ParseError::new("a number", format!("NUMBER '{text}'"), span))?;
                Ok(Expr::new(ExprKind::Number(value), span))
            }
            TokenKind::String => {
                self.advance()?;
                Ok(Expr::new(ExprKind::String(text), span))
            }
            TokenKind::Identifier => {
                self.advance()?;
                Ok(Expr::new(ExprKind::Identifier(text), span))
            }
            TokenKind::Keyword => {
                let kind = match text.as_str() {
                    "True" => ExprKind::Boolean(true),
                    "False" => ExprKind::Boolean(false),
                    "None" => ExprKind::None,
                    _ => return Err(self.error_here("an expression")),
                };
                self.advance()?;
                Ok(Expr::new(kind, span))
            }
            TokenKind::Punctuation => match text.as_str() {
                "(" => {
                    self.advance()?;
                    let inner = self.parse_expression()?;
                    self.expect_punct(")")?;
                    Ok(inner)
                }
                "[" => self.parse_list(),
                "{" => self.parse_dict(),
                _ => Err(self.error_here("an expression")),
            },
            _ => Err(self.error_here("an expression")),
        }
    }

    /// `[a, b, …]`
    fn parse_list(&mut self) -> ParseResult<Expr> {
        let start = self.expect_punct("[")?.span;
        let mut items = Vec::new();
        while !self.check_punct("]") {
            items.push(self.parse_expression()?);
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct("]")?;
        let span = start.merge(self.previous_span());
        Ok(Expr::new(ExprKind::List(items), span))
    }

    /// `{key: value, …}`
    fn parse_dict(&mut self) -> ParseResult<Expr> {
        let start = self.expect_punct("{")?.span;
        let mut entries = Vec::new();
        while !self.check_punct("}") {
            let key = self.parse_expression()?;
            self.expect_punct(":")?;
            let value = self.parse_expression()?;
            entries.push((key, value));
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct("}")?;
        let span = start.merge(self.previous_span());
        Ok(Expr::new(ExprKind::Dict(entries), span))
    }
}

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}
