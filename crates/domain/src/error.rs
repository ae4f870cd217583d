//! Domain error type

use thiserror::Error;

/// Failure to interpret a domain value
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
