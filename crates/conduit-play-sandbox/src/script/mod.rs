//! Front end for the generated host script: tokenizer, syntax tree, parser.

pub mod ast;
pub mod lexer;
pub mod parser;

use crate::error::SandboxResult;

/// Tokenize and parse host script text.
pub fn parse_script(code: &str) -> SandboxResult<ast::Script> {
    parser::parse(lexer::tokenize(code)?)
}
