//! Shared types for the Conduit playground compiler.
//!
//! This crate defines the AST node types, source spans and the front-end
//! error types used across the tokenizer, parser and code generator.

mod error;
mod span;
pub mod ast;

pub use error::{LexError, ParseError, MAX_NESTING_DEPTH};
pub use span::{SourceFile, Span};
