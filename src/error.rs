//! Error types for the textmark library.
//!
//! All fatal errors are represented by the [`TextmarkError`] enum. Only
//! programmer errors are fatal: malformed range lists, unparsable selectors,
//! invalid patterns. Recoverable data conditions (an individual
//! out-of-bounds range, a timed-out sub-document, a term with no matches)
//! are reported through callbacks and debug logs instead, and never abort an
//! operation.
//!
//! # Examples
//!
//! ```
//! use textmark::error::{Result, TextmarkError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(TextmarkError::invalid_argument("ranges must be an array of objects"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {e}"),
//! }
//! ```

use thiserror::Error;

/// The main error type for textmark operations.
#[derive(Error, Debug)]
pub enum TextmarkError {
    /// Pattern-related errors (term compilation, invalid caller regex).
    #[error("Pattern error: {0}")]
    Pattern(String),

    /// Selector-related errors (unparsable exclusion or context selector).
    #[error("Selector error: {0}")]
    Selector(String),

    /// Tree-related errors (invalid node id, wrong node kind).
    #[error("Tree error: {0}")]
    Tree(String),

    /// Invalid caller-supplied argument (programmer error).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Regex compilation errors from the underlying engine.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`TextmarkError`].
pub type Result<T> = std::result::Result<T, TextmarkError>;

impl TextmarkError {
    /// Create a new pattern error.
    pub fn pattern<S: Into<String>>(msg: S) -> Self {
        TextmarkError::Pattern(msg.into())
    }

    /// Create a new selector error.
    pub fn selector<S: Into<String>>(msg: S) -> Self {
        TextmarkError::Selector(msg.into())
    }

    /// Create a new tree error.
    pub fn tree<S: Into<String>>(msg: S) -> Self {
        TextmarkError::Tree(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        TextmarkError::InvalidArgument(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        let err = TextmarkError::pattern("bad pattern");
        assert!(matches!(err, TextmarkError::Pattern(_)));
        assert_eq!(err.to_string(), "Pattern error: bad pattern");

        let err = TextmarkError::invalid_argument("ranges must be objects");
        assert_eq!(err.to_string(), "Invalid argument: ranges must be objects");
    }

    #[test]
    fn test_regex_error_conversion() {
        let bad = regex::Regex::new("(unclosed");
        let err: TextmarkError = bad.unwrap_err().into();
        assert!(matches!(err, TextmarkError::Regex(_)));
    }
}
