//! Conduit playground parser: converts a token stream into a `Program` AST.

mod parse_decl;
mod parse_expr;
mod parse_stmt;
mod parser;

pub use parser::{parse, Parser};
