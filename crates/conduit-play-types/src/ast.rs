//! AST node types for the playground language.
//!
//! Every node carries a [`Span`] and reports its [`NodeKind`] tag. Each
//! variant holds exactly the fields its kind needs, so "which parts are
//! populated" is decided by the type rather than by convention.

use crate::Span;
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// Node kinds
// ══════════════════════════════════════════════════════════════════════════════

/// The closed set of node kinds the parser produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Program,
    Import,
    FunctionDef,
    ClassDef,
    Decorator,
    If,
    While,
    For,
    Return,
    Pass,
    ExprStmt,
    Assignment,
    BinaryOp,
    Compare,
    UnaryOp,
    Call,
    MemberAccess,
    MethodCall,
    Subscript,
    KeywordArg,
    Identifier,
    Number,
    String,
    Boolean,
    None,
    Dict,
    List,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete program: the top-level statements in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn node_kind(&self) -> NodeKind {
        match &self.kind {
            StmtKind::Import(_) => NodeKind::Import,
            StmtKind::FunctionDef(_) => NodeKind::FunctionDef,
            StmtKind::ClassDef(_) => NodeKind::ClassDef,
            StmtKind::Decorator(_) => NodeKind::Decorator,
            StmtKind::If(_) => NodeKind::If,
            StmtKind::While(_) => NodeKind::While,
            StmtKind::For(_) => NodeKind::For,
            StmtKind::Return(_) => NodeKind::Return,
            StmtKind::Pass => NodeKind::Pass,
            StmtKind::Expr(_) => NodeKind::ExprStmt,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Import(Import),
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Decorator(Decorator),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Return(Option<Expr>),
    Pass,
    Expr(Expr),
}

/// `from a.b import x, y` or `import a.b` (empty `names`).
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub module: String,
    pub names: Vec<Ident>,
}

/// `def name(params) -> ret: body`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: Ident,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
    pub body: Vec<Stmt>,
}

/// A parameter: `name`, `name: type`, `name = default`, `name: type = default`.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub type_ann: Option<String>,
    pub default: Option<Expr>,
}

/// `class Name: body`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: Ident,
    pub body: Vec<Stmt>,
}

/// `@target.method(args)` applied to exactly one statement.
///
/// `target` is the dotted object path in front of the method; it is empty for
/// a bare decorator such as `@cache`. `args` is `None` when the decorator has
/// no parenthesized argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    pub target: Vec<Ident>,
    pub method: Ident,
    pub args: Option<Vec<Expr>>,
    pub decorated: Box<Stmt>,
}

impl Decorator {
    /// The name bound by the innermost decorated definition, if any.
    pub fn decorated_name(&self) -> Option<&Ident> {
        match &self.decorated.kind {
            StmtKind::FunctionDef(def) => Some(&def.name),
            StmtKind::ClassDef(class) => Some(&class.name),
            StmtKind::Decorator(inner) => inner.decorated_name(),
            _ => None,
        }
    }
}

/// `if cond: then_body [else: else_body]`. An `elif` chain is stored as a
/// single nested `If` in `else_body`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_body: Vec<Stmt>,
    pub else_body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

/// `for target in iter: body`
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub target: Ident,
    pub iter: Expr,
    pub body: Vec<Stmt>,
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn node_kind(&self) -> NodeKind {
        match &self.kind {
            ExprKind::Assignment { .. } => NodeKind::Assignment,
            ExprKind::BinaryOp { .. } => NodeKind::BinaryOp,
            ExprKind::Compare { .. } => NodeKind::Compare,
            ExprKind::UnaryOp { .. } => NodeKind::UnaryOp,
            ExprKind::Call { .. } => NodeKind::Call,
            ExprKind::MemberAccess { .. } => NodeKind::MemberAccess,
            ExprKind::MethodCall { .. } => NodeKind::MethodCall,
            ExprKind::Subscript { .. } => NodeKind::Subscript,
            ExprKind::KeywordArg { .. } => NodeKind::KeywordArg,
            ExprKind::Identifier(_) => NodeKind::Identifier,
            ExprKind::Number(_) => NodeKind::Number,
            ExprKind::String(_) => NodeKind::String,
            ExprKind::Boolean(_) => NodeKind::Boolean,
            ExprKind::None => NodeKind::None,
            ExprKind::Dict(_) => NodeKind::Dict,
            ExprKind::List(_) => NodeKind::List,
        }
    }

    /// The identifier name, if this expression is a plain identifier.
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `target = value`; `target` is an Identifier, MemberAccess or Subscript.
    Assignment {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    BinaryOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `a < b <= c`: two or more comparisons sharing their middle operands.
    /// Each middle operand is evaluated once, and evaluation stops at the
    /// first comparison that fails.
    Compare {
        first: Box<Expr>,
        rest: Vec<(BinOp, Expr)>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `callee(args)` where the callee is not a member access.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    MemberAccess {
        object: Box<Expr>,
        member: Ident,
    },
    MethodCall {
        object: Box<Expr>,
        method: Ident,
        args: Vec<Expr>,
    },
    Subscript {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    /// `name=value` inside a call's argument list.
    KeywordArg {
        name: Ident,
        value: Box<Expr>,
    },
    Identifier(String),
    Number(f64),
    String(String),
    Boolean(bool),
    None,
    Dict(Vec<(Expr, Expr)>),
    List(Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    FloorDiv,
    Pow,
    Eq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    And,
    Or,
}

impl BinOp {
    /// Source spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::FloorDiv => "//",
            BinOp::Pow => "**",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Less => "<",
            BinOp::Greater => ">",
            BinOp::LessEq => "<=",
            BinOp::GreaterEq => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident_expr(name: &str) -> Expr {
        Expr::new(ExprKind::Identifier(name.into()), Span::point(1, 1))
    }

    fn def(name: &str) -> Stmt {
        Stmt::new(
            StmtKind::FunctionDef(FunctionDef {
                name: Ident::new(name, Span::point(2, 5)),
                params: vec![],
                return_type: None,
                body: vec![Stmt::new(StmtKind::Pass, Span::point(3, 5))],
            }),
            Span::point(2, 1),
        )
    }

    #[test]
    fn test_node_kind_tags() {
        assert_eq!(def("h").node_kind(), NodeKind::FunctionDef);
        assert_eq!(ident_expr("x").node_kind(), NodeKind::Identifier);
        assert_eq!(
            Stmt::new(StmtKind::Expr(ident_expr("x")), Span::point(1, 1)).node_kind(),
            NodeKind::ExprStmt
        );
        assert_eq!(NodeKind::MethodCall.to_string(), "MethodCall");
    }

    #[test]
    fn test_decorated_name_sees_through_stacked_decorators() {
        let inner = Decorator {
            target: vec![Ident::new("app", Span::point(1, 2))],
            method: Ident::new("get", Span::point(1, 6)),
            args: Some(vec![]),
            decorated: Box::new(def("handler")),
        };
        let outer = Decorator {
            target: vec![],
            method: Ident::new("cache", Span::point(1, 2)),
            args: None,
            decorated: Box::new(Stmt::new(StmtKind::Decorator(inner), Span::point(1, 1))),
        };
        assert_eq!(outer.decorated_name().map(|i| i.name.as_str()), Some("handler"));
    }

    #[test]
    fn test_binop_symbols() {
        assert_eq!(BinOp::FloorDiv.to_string(), "//");
        assert_eq!(BinOp::And.symbol(), "and");
    }

    #[test]
    fn test_as_identifier() {
        assert_eq!(ident_expr("app").as_identifier(), Some("app"));
        let num = Expr::new(ExprKind::Number(1.0), Span::point(1, 1));
        assert_eq!(num.as_identifier(), None);
    }
}
