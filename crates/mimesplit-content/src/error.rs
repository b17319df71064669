//! Error types for content extraction.

use thiserror::Error;

/// Errors that can occur while extracting message content.
#[derive(Debug, Error)]
pub enum Error {
    /// Multipart parsing or decoding failed.
    #[error("MIME error: {0}")]
    Mime(#[from] mimesplit::Error),

    /// Nested multipart parts exceed the configured depth.
    #[error("Multipart nesting deeper than {limit} levels")]
    NestingTooDeep {
        /// Configured depth limit.
        limit: usize,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
