//! # mimesplit
//!
//! Splits multipart HTTP response bodies into their parts.
//!
//! ## Features
//!
//! - **Parsing**: Split a `multipart/*` body into ordered header/body parts
//! - **Zero copy**: Part bodies are slices of the input [`bytes::Bytes`]
//! - **Strict or lenient**: Reject malformed bodies or recover what is there
//! - **Decoding**: Base64, Quoted-Printable and RFC 2047 filenames
//! - **Serialization**: Write parts back out as a multipart body
//!
//! ## Quick Start
//!
//! ```ignore
//! use mimesplit::parse;
//!
//! let body = b"--B\r\nContent-Type: text/plain\r\n\r\nhello\r\n--B--";
//! let message = parse(body, "B")?;
//!
//! for part in &message {
//!     println!("{:?}: {:?}", part.headers.get("content-type"), part.body);
//! }
//! ```
//!
//! ### From an HTTP response
//!
//! ```ignore
//! use mimesplit::{MultipartMessage, ParseOptions};
//!
//! let message = MultipartMessage::from_response(
//!     "multipart/mixed; boundary=\"frontier\"",
//!     &response_body,
//!     ParseOptions::strict(),
//! )?;
//! let text = message.parts()[0].body_text()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;
mod options;
mod parser;

pub mod encoding;

pub use content_type::{
    ContentDisposition, ContentType, DispositionType, boundary_from_content_type,
};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{MultipartMessage, Part, TransferEncoding};
pub use options::{DEFAULT_MAX_PARTS, ParseMode, ParseOptions, ParseOptionsBuilder};
pub use parser::{MAX_BOUNDARY_LEN, Parser, parse};
