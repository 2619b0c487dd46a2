//! Host script syntax tree.

use std::rc::Rc;

/// A parsed host script.
#[derive(Debug, Clone)]
pub struct Script {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    /// 1-based host script line where the statement starts.
    pub line: u32,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Var { name: String, init: Option<Expr> },
    Function(Rc<FunctionDecl>),
    Class(Rc<ClassDecl>),
    /// `else if` is stored as a nested `If` in `else_body`.
    If {
        condition: Expr,
        then_body: Vec<Stmt>,
        else_body: Option<Vec<Stmt>>,
    },
    While { condition: Expr, body: Vec<Stmt> },
    /// `for (var name of iter) { … }`
    ForOf {
        name: String,
        iter: Expr,
        body: Vec<Stmt>,
    },
    Return(Option<Expr>),
    Expr(Expr),
    Empty,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<ParamDecl>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: String,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub constructor: Option<Rc<FunctionDecl>>,
    pub methods: Vec<Rc<FunctionDecl>>,
    pub statics: Vec<(String, Expr)>,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    This,
    Ident(String),
    Array(Vec<Expr>),
    Object(Vec<(PropKey, Expr)>),
    Member { object: Box<Expr>, name: String },
    Index { object: Box<Expr>, index: Box<Expr> },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    New { callee: Box<Expr>, args: Vec<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Logical { op: LogicalOp, left: Box<Expr>, right: Box<Expr> },
    Assign { target: Box<Expr>, value: Box<Expr> },
}

/// Object literal key: `name:` / `"name":` / `1:` or computed `[expr]:`.
#[derive(Debug, Clone)]
pub enum PropKey {
    Static(String),
    Computed(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "===",
            BinaryOp::NotEq => "!==",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEq => "<=",
            BinaryOp::GreaterEq => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}
