//! Error taxonomy for the Wildcard Emitter.

use std::fmt;

/// Error raised synchronously at the `on` call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WildcardError {
    /// `on` was called with an empty pattern.
    InvalidPattern(String),
}

impl fmt::Display for WildcardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WildcardError::InvalidPattern(message) => write!(f, "invalid pattern: {}", message),
        }
    }
}

impl std::error::Error for WildcardError {}
