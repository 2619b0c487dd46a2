//! Codegen error types.

use conduit_play_types::Span;
use thiserror::Error;

/// Errors that can occur while lowering an AST to host script.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    /// A construct appeared where the host script has no equivalent, such as
    /// a `while` loop directly inside a class body.
    #[error("unsupported {construct} in {context} at line {}", .span.start_line)]
    Unsupported {
        construct: String,
        context: String,
        span: Span,
    },
}

impl CodegenError {
    pub fn unsupported(construct: impl Into<String>, context: impl Into<String>, span: Span) -> Self {
        Self::Unsupported {
            construct: construct.into(),
            context: context.into(),
            span,
        }
    }

    /// Source position of the offending construct.
    pub fn span(&self) -> Span {
        match self {
            Self::Unsupported { span, .. } => *span,
        }
    }
}

/// Codegen result type alias.
pub type CodegenResult<T> = Result<T, CodegenError>;
