//! Host script parser: recursive descent over the token stream.

use std::rc::Rc;

use super::ast::*;
use super::lexer::{Tok, Token};
use crate::error::{SandboxError, SandboxResult};

/// Deepest block/expression nesting accepted before parsing stops.
const MAX_DEPTH: u32 = 200;

/// Parse a host script token stream (as produced by [`super::lexer::tokenize`]).
pub fn parse(tokens: Vec<Token>) -> SandboxResult<Script> {
    let mut parser = ScriptParser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let mut body = Vec::new();
    while !parser.at_eof() {
        body.push(parser.statement()?);
    }
    Ok(Script { body })
}

struct ScriptParser {
    tokens: Vec<Token>,
    pos: usize,
    depth: u32,
}

impl ScriptParser {
    // ── Cursor ───────────────────────────────────────────────────────────

    fn peek(&self) -> &Tok {
        self.tokens.get(self.pos).map(|t| &t.tok).unwrap_or(&Tok::Eof)
    }

    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), Tok::Eof)
    }

    fn bump(&mut self) -> Tok {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check_symbol(&self, symbol: &str) -> bool {
        matches!(self.peek(), Tok::Symbol(s) if *s == symbol)
    }

    fn check_word(&self, word: &str) -> bool {
        matches!(self.peek(), Tok::Ident(w) if w == word)
    }

    fn eat_symbol(&mut self, symbol: &str) -> bool {
        if self.check_symbol(symbol) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.check_word(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, symbol: &str) -> SandboxResult<()> {
        if self.eat_symbol(symbol) {
            Ok(())
        } else {
            Err(self.error(format!("'{symbol}'")))
        }
    }

    fn expect_word(&mut self, word: &str) -> SandboxResult<()> {
        if self.eat_word(word) {
            Ok(())
        } else {
            Err(self.error(format!("'{word}'")))
        }
    }

    fn expect_ident(&mut self) -> SandboxResult<String> {
        match self.peek() {
            Tok::Ident(name) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error("an identifier")),
        }
    }

    fn error(&self, expected: impl AsRef<str>) -> SandboxError {
        let found = match self.peek() {
            Tok::Number(n) => format!("number {n}"),
            Tok::Str(s) => format!("string {s:?}"),
            Tok::Ident(name) => format!("'{name}'"),
            Tok::Symbol(s) => format!("'{s}'"),
            Tok::Eof => "end of script".to_string(),
        };
        SandboxError::Syntax {
            message: format!("expected {}, found {found}", expected.as_ref()),
            line: self.line(),
        }
    }

    fn enter(&mut self) -> SandboxResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(SandboxError::Syntax {
                message: "nesting too deep".to_string(),
                line: self.line(),
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Operator chains fold left-deep, one level per operator.
    fn leave_levels(&mut self, levels: u32) {
        self.depth = self.depth.saturating_sub(levels);
    }

    // ── Statements ───────────────────────────────────────────────────────

    fn statement(&mut self) -> SandboxResult<Stmt> {
        let line = self.line();
        let kind = if self.eat_word("var") {
            let name = self.expect_ident()?;
            let init = if self.eat_symbol("=") {
                Some(self.expression()?)
            } else {
                None
            };
            self.expect_symbol(";")?;
            StmtKind::Var { name, init }
        } else if self.eat_word("function") {
            StmtKind::Function(Rc::new(self.function_rest()?))
        } else if self.eat_word("class") {
            StmtKind::Class(Rc::new(self.class_rest()?))
        } else if self.eat_word("if") {
            self.if_rest()?
        } else if self.eat_word("while") {
            self.expect_symbol("(")?;
            let condition = self.expression()?;
            self.expect_symbol(")")?;
            let body = self.block()?;
            StmtKind::While { condition, body }
        } else if self.eat_word("for") {
            self.expect_symbol("(")?;
            self.expect_word("var")?;
            let name = self.expect_ident()?;
            self.expect_word("of")?;
            let iter = self.expression()?;
            self.expect_symbol(")")?;
            let body = self.block()?;
            StmtKind::ForOf { name, iter, body }
        } else if self.eat_word("return") {
            let value = if self.check_symbol(";") {
                None
            } else {
                Some(self.expression()?)
            };
            self.expect_symbol(";")?;
            StmtKind::Return(value)
        } else if self.eat_symbol(";") {
            StmtKind::Empty
        } else {
            let expr = self.expression()?;
            self.expect_symbol(";")?;
            StmtKind::Expr(expr)
        };
        Ok(Stmt { kind, line })
    }

    /// `if` already consumed: `(cond) { … } [else if … | else { … }]`
    fn if_rest(&mut self) -> SandboxResult<StmtKind> {
        self.expect_symbol("(")?;
        let condition = self.expression()?;
        self.expect_symbol(")")?;
        let then_body = self.block()?;
        let else_body = if self.eat_word("else") {
            if self.check_word("if") {
                let line = self.line();
                self.bump();
                self.enter()?;
                let nested = self.if_rest();
                self.leave();
                Some(vec![Stmt {
                    kind: nested?,
                    line,
                }])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(StmtKind::If {
            condition,
            then_body,
            else_body,
        })
    }

    fn block(&mut self) -> SandboxResult<Vec<Stmt>> {
        self.expect_symbol("{")?;
        self.enter()?;
        let mut body = Vec::new();
        while !self.check_symbol("}") {
            if self.at_eof() {
                self.leave();
                return Err(self.error("'}'"));
            }
            match self.statement() {
                Ok(stmt) => body.push(stmt),
                Err(e) => {
                    self.leave();
                    return Err(e);
                }
            }
        }
        self.leave();
        self.expect_symbol("}")?;
        Ok(body)
    }

    /// `function` already consumed: `name(params) { … }`
    fn function_rest(&mut self) -> SandboxResult<FunctionDecl> {
        let name = self.expect_ident()?;
        self.method_rest(name)
    }

    /// `(params) { … }` for a function or method called `name`.
    fn method_rest(&mut self, name: String) -> SandboxResult<FunctionDecl> {
        self.expect_symbol("(")?;
        let mut params = Vec::new();
        while !self.check_symbol(")") {
            let name = self.expect_ident()?;
            let default = if self.eat_symbol("=") {
                Some(self.expression()?)
            } else {
                None
            };
            params.push(ParamDecl { name, default });
            if !self.eat_symbol(",") {
                break;
            }
        }
        self.expect_symbol(")")?;
        let body = self.block()?;
        Ok(FunctionDecl { name, params, body })
    }

    /// `class` already consumed: `Name { members }`
    fn class_rest(&mut self) -> SandboxResult<ClassDecl> {
        let name = self.expect_ident()?;
        self.expect_symbol("{")?;
        let mut class = ClassDecl {
            name,
            constructor: None,
            methods: Vec::new(),
            statics: Vec::new(),
        };
        while !self.eat_symbol("}") {
            if self.eat_word("static") {
                let field = self.expect_ident()?;
                self.expect_symbol("=")?;
                let value = self.expression()?;
                self.expect_symbol(";")?;
                class.statics.push((field, value));
                continue;
            }
            let method_name = self.expect_ident()?;
            let method = Rc::new(self.method_rest(method_name)?);
            if method.name == "constructor" {
                class.constructor = Some(method);
            } else {
                class.methods.push(method);
            }
        }
        Ok(class)
    }

    // ── Expressions ──────────────────────────────────────────────────────

    fn expression(&mut self) -> SandboxResult<Expr> {
        self.enter()?;
        let result = self.assignment();
        self.leave();
        result
    }

    fn assignment(&mut self) -> SandboxResult<Expr> {
        let target = self.logical_or()?;
        if !self.check_symbol("=") {
            return Ok(target);
        }
        if !matches!(
            target.kind,
            ExprKind::Ident(_) | ExprKind::Member { .. } | ExprKind::Index { .. }
        ) {
            return Err(SandboxError::Syntax {
                message: "invalid assignment target".to_string(),
                line: target.line,
            });
        }
        self.bump();
        let value = self.expression()?;
        Ok(Expr {
            line: target.line,
            kind: ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
        })
    }

    fn logical_or(&mut self) -> SandboxResult<Expr> {
        let mut left = self.logical_and()?;
        let mut folds = 0;
        while self.eat_symbol("||") {
            self.enter()?;
            folds += 1;
            let right = self.logical_and()?;
            left = logical(LogicalOp::Or, left, right);
        }
        self.leave_levels(folds);
        Ok(left)
    }

    fn logical_and(&mut self) -> SandboxResult<Expr> {
        let mut left = self.equality()?;
        let mut folds = 0;
        while self.eat_symbol("&&") {
            self.enter()?;
            folds += 1;
            let right = self.equality()?;
            left = logical(LogicalOp::And, left, right);
        }
        self.leave_levels(folds);
        Ok(left)
    }

    fn equality(&mut self) -> SandboxResult<Expr> {
        let mut left = self.relational()?;
        let mut folds = 0;
        loop {
            let op = match self.peek() {
                Tok::Symbol("===" | "==") => BinaryOp::Eq,
                Tok::Symbol("!==" | "!=") => BinaryOp::NotEq,
                _ => break,
            };
            self.bump();
            self.enter()?;
            folds += 1;
            let right = self.relational()?;
            left = binary(op, left, right);
        }
        self.leave_levels(folds);
        Ok(left)
    }

    fn relational(&mut self) -> SandboxResult<Expr> {
        let mut left = self.additive()?;
        let mut folds = 0;
        loop {
            let op = match self.peek() {
                Tok::Symbol("<") => BinaryOp::Less,
                Tok::Symbol(">") => BinaryOp::Greater,
                Tok::Symbol("<=") => BinaryOp::LessEq,
                Tok::Symbol(">=") => BinaryOp::GreaterEq,
                _ => break,
            };
            self.bump();
            self.enter()?;
            folds += 1;
            let right = self.additive()?;
            left = binary(op, left, right);
        }
        self.leave_levels(folds);
        Ok(left)
    }

    fn additive(&mut self) -> SandboxResult<Expr> {
        let mut left = self.multiplicative()?;
        let mut folds = 0;
        loop {
            let op = match self.peek() {
                Tok::Symbol("+") => BinaryOp::Add,
                Tok::Symbol("-") => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            self.enter()?;
            folds += 1;
            let right = self.multiplicative()?;
            left = binary(op, left, right);
        }
        self.leave_levels(folds);
        Ok(left)
    }

    fn multiplicative(&mut self) -> SandboxResult<Expr> {
        let mut left = self.unary()?;
        let mut folds = 0;
        loop {
            let op = match self.peek() {
                Tok::Symbol("*") => BinaryOp::Mul,
                Tok::Symbol("/") => BinaryOp::Div,
                Tok::Symbol("%") => BinaryOp::Mod,
                _ => break,
            };
            self.bump();
            self.enter()?;
            folds += 1;
            let right = self.unary()?;
            left = binary(op, left, right);
        }
        self.leave_levels(folds);
        Ok(left)
    }

    fn unary(&mut self) -> SandboxResult<Expr> {
        let op = match self.peek() {
            Tok::Symbol("!") => UnaryOp::Not,
            Tok::Symbol("-") => UnaryOp::Neg,
            _ => return self.postfix(),
        };
        let line = self.line();
        self.bump();
        self.enter()?;
        let operand = self.unary();
        self.leave();
        Ok(Expr {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand?),
            },
            line,
        })
    }

    fn postfix(&mut self) -> SandboxResult<Expr> {
        let mut expr = self.primary()?;
        let mut folds = 0;
        loop {
            let line = self.line();
            if self.check_symbol(".") || self.check_symbol("[") || self.check_symbol("(") {
                self.enter()?;
                folds += 1;
            }
            if self.eat_symbol(".") {
                let name = self.expect_ident()?;
                expr = Expr {
                    kind: ExprKind::Member {
                        object: Box::new(expr),
                        name,
                    },
                    line,
                };
            } else if self.eat_symbol("[") {
                let index = self.expression()?;
                self.expect_symbol("]")?;
                expr = Expr {
                    kind: ExprKind::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                    line,
                };
            } else if self.eat_symbol("(") {
                let args = self.arguments()?;
                expr = Expr {
                    kind: ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    line,
                };
            } else {
                break;
            }
        }
        self.leave_levels(folds);
        Ok(expr)
    }

    /// Arguments after `(`, through the closing `)`.
    fn arguments(&mut self) -> SandboxResult<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.check_symbol(")") {
            args.push(self.expression()?);
            if !self.eat_symbol(",") {
                break;
            }
        }
        self.expect_symbol(")")?;
        Ok(args)
    }

    fn primary(&mut self) -> SandboxResult<Expr> {
        let line = self.line();
        let kind = match self.bump() {
            Tok::Number(n) => ExprKind::Number(n),
            Tok::Str(s) => ExprKind::Str(s),
            Tok::Ident(word) => match word.as_str() {
                "true" => ExprKind::Bool(true),
                "false" => ExprKind::Bool(false),
                "null" | "undefined" => ExprKind::Null,
                "this" => ExprKind::This,
                "new" => return self.new_rest(line),
                _ => ExprKind::Ident(word),
            },
            Tok::Symbol("(") => {
                let inner = self.expression()?;
                self.expect_symbol(")")?;
                return Ok(inner);
            }
            Tok::Symbol("[") => {
                let mut items = Vec::new();
                while !self.check_symbol("]") {
                    items.push(self.expression()?);
                    if !self.eat_symbol(",") {
                        break;
                    }
                }
                self.expect_symbol("]")?;
                ExprKind::Array(items)
            }
            Tok::Symbol("{") => ExprKind::Object(self.object_rest()?),
            _ => {
                self.pos = self.pos.saturating_sub(1);
                return Err(self.error("an expression"));
            }
        };
        Ok(Expr { kind, line })
    }

    /// `new` already consumed: `Callee(args)` where the callee is a name or
    /// member chain.
    fn new_rest(&mut self, line: u32) -> SandboxResult<Expr> {
        let name = self.expect_ident()?;
        let mut callee = Expr {
            kind: ExprKind::Ident(name),
            line,
        };
        while self.eat_symbol(".") {
            let name = self.expect_ident()?;
            callee = Expr {
                kind: ExprKind::Member {
                    object: Box::new(callee),
                    name,
                },
                line,
            };
        }
        let args = if self.eat_symbol("(") {
            self.arguments()?
        } else {
            Vec::new()
        };
        Ok(Expr {
            kind: ExprKind::New {
                callee: Box::new(callee),
                args,
            },
            line,
        })
    }

    /// `{` already consumed: `key: value, …}`
    fn object_rest(&mut self) -> SandboxResult<Vec<(PropKey, Expr)>> {
        let mut entries = Vec::new();
        while !self.check_symbol("}") {
            let key = match self.bump() {
                Tok::Ident(name) | Tok::Str(name) => PropKey::Static(name),
                Tok::Number(n) => PropKey::Static(crate::value::format_number(n)),
                Tok::Symbol("[") => {
                    let key = self.expression()?;
                    self.expect_symbol("]")?;
                    PropKey::Computed(key)
                }
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return Err(self.error("a property name"));
                }
            };
            self.expect_symbol(":")?;
            let value = self.expression()?;
            entries.push((key, value));
            if !self.eat_symbol(",") {
                break;
            }
        }
        self.expect_symbol("}")?;
        Ok(entries)
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr {
        line: left.line,
        kind: ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
    }
}

fn logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
    Expr {
        line: left.line,
        kind: ExprKind::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
    }
}
