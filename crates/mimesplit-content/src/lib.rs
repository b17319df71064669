//! # mimesplit-content
//!
//! Turns a parsed multipart message into what a mail view displays: the
//! text and HTML bodies, the attachment list, and an HTML rendering with
//! `cid:` images inlined.
//!
//! ```ignore
//! use mimesplit_content::{ExtractOptions, MessageContent};
//!
//! let content = MessageContent::from_response(
//!     "multipart/related; boundary=rel",
//!     &response_body,
//!     &ExtractOptions::default(),
//! )?;
//! let html = content.render_html();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content;
mod error;
mod options;

pub mod html;

pub use content::{Attachment, MessageContent};
pub use error::{Error, Result};
pub use options::{DEFAULT_MAX_DEPTH, ExtractOptions, ExtractOptionsBuilder};
