//! Pipeline error: one variant per stage.

use conduit_play_codegen::{CodegenError, SourceMap};
use conduit_play_sandbox::SandboxError;
use conduit_play_types::{LexError, ParseError, Span};
use thiserror::Error;

/// Any failure between source text and captured output.
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error("lexical error: {0}")]
    Lex(#[from] LexError),

    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),

    #[error("code generation error: {0}")]
    Codegen(#[from] CodegenError),

    #[error("execution error: {0}")]
    Execution(#[from] SandboxError),
}

impl CompileError {
    /// Source location of the error. Execution errors carry a host script
    /// line, which `source_map` translates back to the source.
    pub fn span(&self, source_map: Option<&SourceMap>) -> Option<Span> {
        match self {
            CompileError::Lex(e) => Some(e.span()),
            CompileError::Parse(e) => Some(e.span),
            CompileError::Codegen(e) => Some(e.span()),
            CompileError::Execution(e) => {
                let line = e.line()?;
                source_map?.lookup(line)
            }
        }
    }
}
