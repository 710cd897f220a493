//! Script analysis error types.

use std::fmt;
use thiserror::Error;

/// Result type for script analysis.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Location and description of the first syntax problem in a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    /// One-based line
    pub line: usize,
    /// One-based column
    pub column: usize,
    pub message: String,
}

impl fmt::Display for SyntaxIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Syntax error at {0}")]
    Syntax(SyntaxIssue),

    #[error("Parser unavailable: {0}")]
    ParserUnavailable(String),

    #[error("Parser returned no tree")]
    ParseFailed,
}

impl ScriptError {
    pub fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Syntax(SyntaxIssue {
            line,
            column,
            message: message.into(),
        })
    }

    /// Whether the script itself is at fault (as opposed to the parser).
    pub fn is_syntax(&self) -> bool {
        matches!(self, ScriptError::Syntax(_))
    }
}
