//! Expression code generation.
//!
//! Every expression lowers to a single fragment of host script text. Binary
//! operations are always parenthesized, so the emitted text never depends on
//! host-side precedence rules.

use conduit_play_types::ast::*;

use crate::error::{CodegenError, CodegenResult};
use crate::generator::GenContext;

/// Emit host script text for an expression.
pub fn emit_expr(expr: &Expr, ctx: &GenContext) -> CodegenResult<String> {
    match &expr.kind {
        // ── Literals ──────────────────────────────────────────────────────
        ExprKind::Number(n) => Ok(format_number(*n)),
        ExprKind::String(s) => Ok(quote(s)),
        ExprKind::Boolean(b) => Ok(b.to_string()),
        ExprKind::None => Ok("null".to_string()),
        ExprKind::List(items) => {
            let items = items
                .iter()
                .map(|item| emit_expr(item, ctx))
                .collect::<CodegenResult<Vec<_>>>()?;
            Ok(format!("[{}]", items.join(", ")))
        }
        ExprKind::Dict(entries) => emit_dict(entries, ctx),

        // ── Names ─────────────────────────────────────────────────────────
        ExprKind::Identifier(name) => Ok(ctx.config.rename(name).to_string()),

        // ── Operators ─────────────────────────────────────────────────────
        ExprKind::Assignment { target, value } => Ok(format!(
            "{} = {}",
            emit_expr(target, ctx)?,
            emit_expr(value, ctx)?
        )),
        ExprKind::BinaryOp { left, op, right } => emit_binary(left, *op, right, ctx),
        ExprKind::Compare { first, rest } => emit_compare(first, rest, ctx),
        ExprKind::UnaryOp { op, operand } => {
            let operand = emit_expr(operand, ctx)?;
            Ok(match op {
                UnaryOp::Not => format!("!{operand}"),
                UnaryOp::Neg => format!("(-{operand})"),
            })
        }

        // ── Calls & access ────────────────────────────────────────────────
        ExprKind::Call { callee, args } => emit_call(callee, args, ctx),
        ExprKind::MemberAccess { object, member } => {
            Ok(format!("{}.{}", emit_expr(object, ctx)?, member.name))
        }
        ExprKind::MethodCall {
            object,
            method,
            args,
        } => Ok(format!(
            "{}.{}({})",
            emit_expr(object, ctx)?,
            method.name,
            emit_args(args, ctx)?.join(", ")
        )),
        ExprKind::Subscript { object, index } => Ok(format!(
            "{}[{}]",
            emit_expr(object, ctx)?,
            emit_expr(index, ctx)?
        )),
        ExprKind::KeywordArg { name, .. } => Err(CodegenError::unsupported(
            format!("keyword argument '{}'", name.name),
            "expression outside an argument list",
            expr.span,
        )),
    }
}

/// Emit a condition for `if (…)` / `while (…)`, without doubling the
/// parentheses a binary operation already carries.
pub fn emit_condition(expr: &Expr, ctx: &GenContext) -> CodegenResult<String> {
    let text = emit_expr(expr, ctx)?;
    let parenthesized = match &expr.kind {
        ExprKind::BinaryOp { op, .. } => !matches!(op, BinOp::FloorDiv | BinOp::Pow),
        ExprKind::Compare { .. } => true,
        _ => false,
    };
    if parenthesized {
        Ok(text)
    } else {
        Ok(format!("({text})"))
    }
}

fn emit_binary(left: &Expr, op: BinOp, right: &Expr, ctx: &GenContext) -> CodegenResult<String> {
    let l = emit_expr(left, ctx)?;
    let r = emit_expr(right, ctx)?;
    Ok(match op {
        BinOp::FloorDiv => format!("Math.floor({l} / {r})"),
        BinOp::Pow => format!("Math.pow({l}, {r})"),
        _ => format!("({l} {} {r})", host_operator(op)),
    })
}

/// `a < b < c` becomes `((a < b) && (b < c))`. A middle operand that is not
/// a plain name or literal is stored in a temporary the first time it is
/// evaluated, so it runs once and only when the comparisons before it held.
fn emit_compare(first: &Expr, rest: &[(BinOp, Expr)], ctx: &GenContext) -> CodegenResult<String> {
    let mut left = emit_expr(first, ctx)?;
    let mut parts = Vec::with_capacity(rest.len());
    for (i, (op, operand)) in rest.iter().enumerate() {
        let right = emit_expr(operand, ctx)?;
        let op = host_operator(*op);
        let is_middle = i + 1 < rest.len();
        if is_middle && !is_plain(operand) {
            let temp = ctx.temp();
            parts.push(format!("({left} {op} ({temp} = {right}))"));
            left = temp;
        } else {
            parts.push(format!("({left} {op} {right})"));
            left = right;
        }
    }
    Ok(format!("({})", parts.join(" && ")))
}

/// Operands that can be emitted twice without being evaluated twice.
fn is_plain(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Identifier(_)
            | ExprKind::Number(_)
            | ExprKind::String(_)
            | ExprKind::Boolean(_)
            | ExprKind::None
    )
}

fn host_operator(op: BinOp) -> &'static str {
    match op {
        BinOp::Eq => "===",
        BinOp::NotEq => "!==",
        BinOp::And => "&&",
        BinOp::Or => "||",
        other => other.symbol(),
    }
}

fn emit_call(callee: &Expr, args: &[Expr], ctx: &GenContext) -> CodegenResult<String> {
    let args = emit_args(args, ctx)?.join(", ");
    match callee.as_identifier() {
        Some(name) if ctx.is_class(name) => {
            Ok(format!("new {}({args})", ctx.config.binding(name)))
        }
        _ => Ok(format!("{}({args})", emit_expr(callee, ctx)?)),
    }
}

/// Emit an argument list. Positional arguments keep their order; keyword
/// arguments are gathered into one trailing object literal.
pub fn emit_args(args: &[Expr], ctx: &GenContext) -> CodegenResult<Vec<String>> {
    let mut positional = Vec::new();
    let mut keywords = Vec::new();
    for arg in args {
        match &arg.kind {
            ExprKind::KeywordArg { name, value } => {
                keywords.push(format!("{}: {}", name.name, emit_expr(value, ctx)?));
            }
            _ => positional.push(emit_expr(arg, ctx)?),
        }
    }
    if !keywords.is_empty() {
        positional.push(format!("{{{}}}", keywords.join(", ")));
    }
    Ok(positional)
}

fn emit_dict(entries: &[(Expr, Expr)], ctx: &GenContext) -> CodegenResult<String> {
    if entries.is_empty() {
        return Ok("{}".to_string());
    }
    let mut parts = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let key = match &key.kind {
            ExprKind::String(_) | ExprKind::Number(_) => emit_expr(key, ctx)?,
            _ => format!("[{}]", emit_expr(key, ctx)?),
        };
        parts.push(format!("{key}: {}", emit_expr(value, ctx)?));
    }
    Ok(format!("{{{}}}", parts.join(", ")))
}

/// Shortest decimal form: `8080`, `0.5`, `2.25`.
pub fn format_number(n: f64) -> String {
    format!("{n}")
}

/// A double-quoted host script string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
