//! Declaration parsing: imports, functions, classes, decorators.

use conduit_play_lexer::TokenKind;
use conduit_play_types::ast::*;

use crate::parser::{ParseResult, Parser};

impl Parser {
    /// `from a.b import x, y`
    pub(crate) fn parse_import_from(&mut self) -> ParseResult<Stmt> {
        let start = self.expect_keyword("from")?.span;
        let module = join_dotted(&self.expect_dotted_name()?);
        self.expect_keyword("import")?;
        let mut names = vec![self.expect_identifier()?];
        while self.eat_punct(",") {
            names.push(self.expect_identifier()?);
        }
        let span = start.merge(self.previous_span());
        self.expect_statement_end()?;
        Ok(Stmt::new(StmtKind::Import(Import { module, names }), span))
    }

    /// `import a.b`
    pub(crate) fn parse_import(&mut self) -> ParseResult<Stmt> {
        let start = self.expect_keyword("import")?.span;
        let module = join_dotted(&self.expect_dotted_name()?);
        let span = start.merge(self.previous_span());
        self.expect_statement_end()?;
        Ok(Stmt::new(
            StmtKind::Import(Import {
                module,
                names: Vec::new(),
            }),
            span,
        ))
    }

    /// `def name(params) [-> type]: block`
    pub(crate) fn parse_function_def(&mut self) -> ParseResult<Stmt> {
        let start = self.expect_keyword("def")?.span;
        let name = self.expect_identifier()?;
        self.expect_punct("(")?;
        let mut params = Vec::new();
        while !self.check_punct(")") {
            params.push(self.parse_param()?);
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        let return_type = if self.eat_operator("->") {
            Some(self.parse_type_annotation()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        let span = start.merge(self.previous_span());
        Ok(Stmt::new(
            StmtKind::FunctionDef(FunctionDef {
                name,
                params,
                return_type,
                body,
            }),
            span,
        ))
    }

    /// `name [: type] [= default]`
    fn parse_param(&mut self) -> ParseResult<Param> {
        let name = self.expect_identifier()?;
        let type_ann = if self.eat_punct(":") {
            Some(self.parse_type_annotation()?)
        } else {
            None
        };
        let default = if self.eat_operator("=") {
            Some(self.parse_value_expression()?)
        } else {
            None
        };
        Ok(Param {
            name,
            type_ann,
            default,
        })
    }

    /// A type annotation such as `int`, `None`, `typing.List` or
    /// `Dict[str, List[int]]`, returned as written.
    fn parse_type_annotation(&mut self) -> ParseResult<String> {
        let mut text = if self.eat_keyword("None") {
            "None".to_string()
        } else {
            join_dotted(&self.expect_dotted_name()?)
        };
        if self.eat_punct("[") {
            let mut args = vec![self.parse_type_annotation()?];
            while self.eat_punct(",") {
                args.push(self.parse_type_annotation()?);
            }
            self.expect_punct("]")?;
            text.push('[');
            text.push_str(&args.join(", "));
            text.push(']');
        }
        Ok(text)
    }

    /// `class Name: block`
    pub(crate) fn parse_class_def(&mut self) -> ParseResult<Stmt> {
        let start = self.expect_keyword("class")?.span;
        let name = self.expect_identifier()?;
        let body = self.parse_block()?;
        let span = start.merge(self.previous_span());
        Ok(Stmt::new(StmtKind::ClassDef(ClassDef { name, body }), span))
    }

    /// `@dotted.name[(args)]` newline, then the decorated definition.
    pub(crate) fn parse_decorator(&mut self) -> ParseResult<Stmt> {
        let start = self.expect_punct("@")?.span;
        let mut target = self.expect_dotted_name()?;
        let method = match target.pop() {
            Some(method) => method,
            None => return Err(self.error_here("a decorator name")),
        };
        let args = if self.eat_punct("(") {
            Some(self.parse_arguments()?)
        } else {
            None
        };
        self.expect_kind(TokenKind::Newline)?;
        self.skip_newlines();

        let decorates_definition = self.check_keyword("def")
            || self.check_keyword("class")
            || self.check_punct("@");
        if !decorates_definition {
            return Err(self.error_here("'def', 'class' or another decorator"));
        }

        self.enter()?;
        let decorated = self.parse_statement()?;
        self.leave();

        let span = start.merge(self.previous_span());
        Ok(Stmt::new(
            StmtKind::Decorator(Decorator {
                target,
                method,
                args,
                decorated: Box::new(decorated),
            }),
            span,
        ))
    }
}

fn join_dotted(parts: &[Ident]) -> String {
    parts
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(".")
}
