//! Statement code generation.
//!
//! Statements write whole lines into the [`GenContext`]; blocks become
//! brace-delimited and indented one level deeper.

use conduit_play_types::ast::*;

use crate::error::{CodegenError, CodegenResult};
use crate::expr::{emit_args, emit_condition, emit_expr, quote};
use crate::generator::GenContext;

/// Emit a slice of statements.
pub fn emit_stmts(stmts: &[Stmt], ctx: &mut GenContext) -> CodegenResult<()> {
    for stmt in stmts {
        emit_stmt(stmt, ctx)?;
    }
    Ok(())
}

/// Emit a single statement.
pub fn emit_stmt(stmt: &Stmt, ctx: &mut GenContext) -> CodegenResult<()> {
    ctx.mark(stmt);
    match &stmt.kind {
        StmtKind::Import(import) => {
            emit_import(import, ctx);
            Ok(())
        }
        StmtKind::FunctionDef(def) => emit_function_def(def, ctx),
        StmtKind::ClassDef(class) => emit_class_def(class, ctx),
        StmtKind::Decorator(dec) => emit_decorator(dec, stmt.span, ctx),
        StmtKind::If(if_stmt) => emit_if(if_stmt, ctx),
        StmtKind::While(while_stmt) => {
            let condition = emit_condition(&while_stmt.condition, ctx)?;
            ctx.line(format!("while {condition} {{"));
            emit_block(&while_stmt.body, ctx)?;
            ctx.line("}");
            Ok(())
        }
        StmtKind::For(for_stmt) => {
            let iter = emit_expr(&for_stmt.iter, ctx)?;
            ctx.declare(&for_stmt.target.name);
            let target = ctx.config.binding(&for_stmt.target.name);
            ctx.line(format!("for (var {target} of {iter}) {{"));
            emit_block(&for_stmt.body, ctx)?;
            ctx.line("}");
            Ok(())
        }
        StmtKind::Return(value) => {
            match value {
                Some(value) => {
                    let value = emit_expr(value, ctx)?;
                    ctx.line(format!("return {value};"));
                }
                None => ctx.line("return;"),
            }
            Ok(())
        }
        StmtKind::Pass => {
            ctx.line("// pass");
            Ok(())
        }
        StmtKind::Expr(expr) => emit_expr_stmt(expr, ctx),
    }
}

/// Emit an indented block body in the current scope.
fn emit_block(body: &[Stmt], ctx: &mut GenContext) -> CodegenResult<()> {
    ctx.indent();
    let result = emit_stmts(body, ctx);
    ctx.dedent();
    result
}

/// Emit an indented function body in a fresh scope holding `locals`, with an
/// optional first line.
fn emit_function_body(
    body: &[Stmt],
    locals: Vec<String>,
    prologue: Option<String>,
    ctx: &mut GenContext,
) -> CodegenResult<()> {
    ctx.push_scope(locals);
    ctx.indent();
    if let Some(prologue) = prologue {
        ctx.line(prologue);
    }
    let result = emit_stmts(body, ctx);
    ctx.dedent();
    ctx.pop_scope();
    result
}

// ══════════════════════════════════════════════════════════════════════════════
// Imports
// ══════════════════════════════════════════════════════════════════════════════

/// Imports have no host meaning; they survive as a comment.
fn emit_import(import: &Import, ctx: &mut GenContext) {
    if import.names.is_empty() {
        ctx.line(format!("// import {}", import.module));
    } else {
        let names: Vec<&str> = import.names.iter().map(|n| n.name.as_str()).collect();
        ctx.line(format!("// from {} import {}", import.module, names.join(", ")));
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions & classes
// ══════════════════════════════════════════════════════════════════════════════

fn emit_params(params: &[Param], ctx: &GenContext) -> CodegenResult<String> {
    let mut parts = Vec::with_capacity(params.len());
    for param in params {
        match &param.default {
            Some(default) => parts.push(format!(
                "{} = {}",
                ctx.config.binding(&param.name.name),
                emit_expr(default, ctx)?
            )),
            None => parts.push(ctx.config.binding(&param.name.name).into_owned()),
        }
    }
    Ok(parts.join(", "))
}

fn param_names(params: &[Param]) -> Vec<String> {
    params.iter().map(|p| p.name.name.clone()).collect()
}

fn emit_function_def(def: &FunctionDef, ctx: &mut GenContext) -> CodegenResult<()> {
    ctx.declare(&def.name.name);
    let params = emit_params(&def.params, ctx)?;
    let name = ctx.config.binding(&def.name.name);
    ctx.line(format!("function {name}({params}) {{"));
    emit_function_body(&def.body, param_names(&def.params), None, ctx)?;
    ctx.line("}");
    Ok(())
}

fn emit_class_def(class: &ClassDef, ctx: &mut GenContext) -> CodegenResult<()> {
    ctx.declare(&class.name.name);
    let name = ctx.config.binding(&class.name.name);
    ctx.line(format!("class {name} {{"));
    ctx.indent();
    let result = class
        .body
        .iter()
        .try_for_each(|member| emit_class_member(member, &class.name.name, ctx));
    ctx.dedent();
    result?;
    ctx.line("}");
    Ok(())
}

/// Class bodies accept methods, `name = value` attributes, docstrings,
/// `pass` and bare decorators on methods. Anything else fails.
fn emit_class_member(stmt: &Stmt, class_name: &str, ctx: &mut GenContext) -> CodegenResult<()> {
    ctx.mark(stmt);
    let unsupported = || {
        CodegenError::unsupported(
            stmt.node_kind().to_string(),
            format!("class body of '{class_name}'"),
            stmt.span,
        )
    };

    match &stmt.kind {
        StmtKind::FunctionDef(def) => emit_method(def, ctx),
        StmtKind::Expr(expr) => match &expr.kind {
            ExprKind::Assignment { target, value } => {
                let Some(name) = target.as_identifier() else {
                    return Err(unsupported());
                };
                let value = emit_expr(value, ctx)?;
                ctx.line(format!("static {name} = {value};"));
                Ok(())
            }
            ExprKind::String(doc) => {
                for line in doc.lines() {
                    ctx.line(format!("// {}", line.trim()));
                }
                Ok(())
            }
            _ => Err(unsupported()),
        },
        StmtKind::Pass => {
            ctx.line("// pass");
            Ok(())
        }
        StmtKind::Decorator(dec) if dec.target.is_empty() => match &dec.decorated.kind {
            StmtKind::FunctionDef(def) => {
                let comment = bare_decorator_comment(dec, ctx)?;
                ctx.line(comment);
                emit_method(def, ctx)
            }
            _ => Err(unsupported()),
        },
        _ => Err(unsupported()),
    }
}

/// A method drops its receiver parameter and rebinds it to `this`.
fn emit_method(def: &FunctionDef, ctx: &mut GenContext) -> CodegenResult<()> {
    let name = match def.name.name.as_str() {
        "__init__" => "constructor",
        other => other,
    };
    let (receiver, params) = match def.params.split_first() {
        Some((receiver, rest)) => (Some(receiver), rest),
        None => (None, &def.params[..]),
    };
    let params_text = emit_params(params, ctx)?;
    ctx.line(format!("{name}({params_text}) {{"));
    let prologue = receiver.map(|r| format!("var {} = this;", ctx.config.binding(&r.name.name)));
    emit_function_body(&def.body, param_names(&def.params), prologue, ctx)?;
    ctx.line("}");
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// Decorators
// ══════════════════════════════════════════════════════════════════════════════

/// `@app.get("/x")` over `def h` becomes the definition of `h` followed by
/// `app.__register("get", "/x", h);`. A bare decorator such as `@cache`
/// only leaves a comment in front of the definition.
fn emit_decorator(
    dec: &Decorator,
    span: conduit_play_types::Span,
    ctx: &mut GenContext,
) -> CodegenResult<()> {
    if dec.target.is_empty() {
        let comment = bare_decorator_comment(dec, ctx)?;
        ctx.line(comment);
        return emit_stmt(&dec.decorated, ctx);
    }

    let Some(name) = dec.decorated_name().map(|n| n.name.clone()) else {
        return Err(CodegenError::unsupported(
            dec.decorated.node_kind().to_string(),
            "decorator",
            span,
        ));
    };

    emit_stmt(&dec.decorated, ctx)?;

    let mut target: Vec<String> = dec.target.iter().map(|t| t.name.clone()).collect();
    if let Some(object) = target.first_mut() {
        *object = ctx.config.binding(object).into_owned();
    }
    let mut args = vec![quote(&dec.method.name)];
    if let Some(dec_args) = &dec.args {
        args.extend(emit_args(dec_args, ctx)?);
    }
    args.push(ctx.config.binding(&name).into_owned());
    ctx.line(format!(
        "{}.{}({});",
        target.join("."),
        ctx.config.registrar,
        args.join(", ")
    ));
    Ok(())
}

fn bare_decorator_comment(dec: &Decorator, ctx: &GenContext) -> CodegenResult<String> {
    Ok(match &dec.args {
        Some(args) => format!("// @{}({})", dec.method.name, emit_args(args, ctx)?.join(", ")),
        None => format!("// @{}", dec.method.name),
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Control flow
// ══════════════════════════════════════════════════════════════════════════════

/// `if (c) { … } else if (d) { … } else { … }`
fn emit_if(if_stmt: &IfStmt, ctx: &mut GenContext) -> CodegenResult<()> {
    let condition = emit_condition(&if_stmt.condition, ctx)?;
    ctx.line(format!("if {condition} {{"));
    emit_block(&if_stmt.then_body, ctx)?;

    let mut else_body = &if_stmt.else_body;
    loop {
        match else_body.as_slice() {
            [] => {
                ctx.line("}");
                break;
            }
            [nested @ Stmt {
                kind: StmtKind::If(inner),
                ..
            }] => {
                ctx.mark(nested);
                let condition = emit_condition(&inner.condition, ctx)?;
                ctx.line(format!("}} else if {condition} {{"));
                emit_block(&inner.then_body, ctx)?;
                else_body = &inner.else_body;
            }
            _ => {
                ctx.line("} else {");
                emit_block(else_body, ctx)?;
                ctx.line("}");
                break;
            }
        }
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// Expression statements
// ══════════════════════════════════════════════════════════════════════════════

/// Assignments to a name not yet declared in the current function scope
/// introduce it with `var`.
fn emit_expr_stmt(expr: &Expr, ctx: &mut GenContext) -> CodegenResult<()> {
    if let ExprKind::Assignment { target, value } = &expr.kind {
        let value = emit_expr(value, ctx)?;
        match target.as_identifier() {
            Some(name) if ctx.declare(name) => {
                ctx.line(format!("var {} = {value};", ctx.config.binding(name)))
            }
            Some(name) => ctx.line(format!("{} = {value};", ctx.config.binding(name))),
            None => {
                let target = emit_expr(target, ctx)?;
                ctx.line(format!("{target} = {value};"));
            }
        }
        return Ok(());
    }
    let text = emit_expr(expr, ctx)?;
    ctx.line(format!("{text};"));
    Ok(())
}
