//! Error types for multipart parsing.

/// Result type alias for multipart operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Multipart error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Boundary token cannot be used as a delimiter.
    #[error("Invalid boundary: {0}")]
    InvalidBoundary(String),

    /// No delimiter line was found in a non-empty body.
    #[error("Boundary delimiter not found in body")]
    BoundaryNotFound,

    /// A part has no empty line between its headers and its body.
    #[error("Missing header/body separator in part {part}")]
    MissingHeaderSeparator {
        /// Zero-based index of the offending part.
        part: usize,
    },

    /// The body ended before the terminal `--boundary--` delimiter.
    #[error("Missing terminal boundary delimiter")]
    MissingTerminator,

    /// Invalid header line.
    #[error("Invalid header line: {0}")]
    InvalidHeader(String),

    /// The body holds more parts than the configured limit.
    #[error("Too many parts (limit is {limit})")]
    TooManyParts {
        /// Configured part limit.
        limit: usize,
    },

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Content type is not `multipart/*`.
    #[error("Not a multipart content type: {0}")]
    NotMultipart(String),

    /// Multipart content type without a `boundary` parameter.
    #[error("Missing boundary parameter in multipart content type")]
    MissingBoundaryParameter,

    /// Invalid encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}
