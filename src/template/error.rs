// invoice-design-service/src/template/error.rs

use std::fmt;
use thiserror::Error;

pub type RenderResult<T> = std::result::Result<T, RenderError>;

/// Line and column (both 1-based) inside a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Locate a byte offset in `source`.
    pub fn at(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Fatal template errors. A render that fails produces no output at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Unterminated @{directive} block opened at {at}")]
    UnterminatedBlock { directive: String, at: Position },

    #[error("Unexpected @{directive} at {at}")]
    UnexpectedDirective { directive: String, at: Position },

    #[error("Unsupported template construct `{construct}` at {at}")]
    UnsupportedConstruct { construct: String, at: Position },

    #[error("Invalid expression at {at}: {message}")]
    InvalidExpression { message: String, at: Position },

    #[error("Unknown collection `{name}` at {at}")]
    UnknownCollection { name: String, at: Position },
}

impl RenderError {
    pub fn error_type(&self) -> &'static str {
        match self {
            RenderError::UnterminatedBlock { .. } => "unterminated_block",
            RenderError::UnexpectedDirective { .. } => "unexpected_directive",
            RenderError::UnsupportedConstruct { .. } => "unsupported_construct",
            RenderError::InvalidExpression { .. } => "invalid_expression",
            RenderError::UnknownCollection { .. } => "unknown_collection",
        }
    }
}
