//! Runtime error types for the sandbox.

use thiserror::Error;

use crate::value::Value;

/// Sandbox error: host script syntax errors, runtime traps and resource limits.
#[derive(Debug, Clone, Error)]
pub enum SandboxError {
    /// The host script could not be lexed or parsed.
    #[error("host script syntax error at line {line}: {message}")]
    Syntax { message: String, line: u32 },

    /// Unknown variable.
    #[error("{0} is not defined")]
    UndefinedVariable(String),

    /// Type mismatch at runtime, e.g. calling a number.
    #[error("type error: {0}")]
    TypeMismatch(String),

    /// Division or modulo by zero.
    #[error("arithmetic error: {0}")]
    ArithmeticTrap(String),

    /// More steps than the configured budget.
    #[error("execution step budget of {limit} exhausted")]
    BudgetExhausted { limit: u64 },

    /// Function calls nested deeper than the configured limit.
    #[error("maximum call depth of {limit} exceeded")]
    CallDepthExceeded { limit: usize },

    /// Generic runtime error.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// `return` statement (used internally for control flow).
    #[error("'return' outside of a function")]
    Return(Value),

    /// A runtime error tagged with the host script line being executed.
    #[error("{error}")]
    Located { line: u32, error: Box<SandboxError> },
}

impl SandboxError {
    /// The underlying error, without any line tag.
    pub fn root(&self) -> &SandboxError {
        match self {
            Self::Located { error, .. } => error.root(),
            other => other,
        }
    }

    /// Host script line the error refers to, if known.
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::Syntax { line, .. } | Self::Located { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Budget and call-depth errors end the whole execution; they are never
    /// absorbed into a fallback line.
    pub fn is_resource_limit(&self) -> bool {
        matches!(
            self.root(),
            Self::BudgetExhausted { .. } | Self::CallDepthExceeded { .. }
        )
    }

    /// Attach a line unless the error already carries one.
    pub(crate) fn at_line(self, line: u32) -> Self {
        match self {
            Self::Syntax { .. } | Self::Located { .. } | Self::Return(_) => self,
            error => Self::Located {
                line,
                error: Box::new(error),
            },
        }
    }
}

/// Result alias for sandbox operations.
pub type SandboxResult<T> = Result<T, SandboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_located_error_displays_inner_message() {
        let err = SandboxError::UndefinedVariable("foo".into()).at_line(3);
        assert_eq!(err.to_string(), "foo is not defined");
        assert_eq!(err.line(), Some(3));
        assert!(matches!(err.root(), SandboxError::UndefinedVariable(_)));
    }

    #[test]
    fn test_at_line_keeps_first_location() {
        let err = SandboxError::Runtime("x".into()).at_line(2).at_line(9);
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_resource_limits() {
        assert!(SandboxError::BudgetExhausted { limit: 10 }.at_line(1).is_resource_limit());
        assert!(SandboxError::CallDepthExceeded { limit: 256 }.is_resource_limit());
        assert!(!SandboxError::Runtime("boom".into()).is_resource_limit());
    }
}
