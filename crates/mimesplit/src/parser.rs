//! Multipart body parser.
//!
//! Splits a `multipart/*` body into parts by scanning for delimiter lines
//! (`--boundary`) as described in RFC 2046 section 5.1.1:
//!
//! - a delimiter is only recognised at the start of the input or right
//!   after a line ending (CRLF or bare LF);
//! - the line ending before a delimiter belongs to the delimiter, not to
//!   the preceding part;
//! - `--boundary--` closes the body, anything after it is the epilogue.
//!
//! Within a part, headers end at the first empty line.

use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::{MultipartMessage, Part};
use crate::options::ParseOptions;
use bytes::Bytes;
use memchr::memmem;

/// Longest boundary permitted by RFC 2046, enforced in strict mode.
pub const MAX_BOUNDARY_LEN: usize = 70;

/// Parses a multipart body with lenient default options.
///
/// # Errors
///
/// Returns an error if the boundary token is invalid or the body has more
/// parts than the default limit.
pub fn parse(input: &[u8], boundary: &str) -> Result<MultipartMessage> {
    Parser::new(boundary)?.parse(input)
}

/// A delimiter line found in the input.
#[derive(Debug, Clone, Copy)]
struct Delimiter {
    /// Start of the line ending preceding the delimiter.
    line_start: usize,
    /// Start of the `--boundary` marker itself.
    marker_start: usize,
    /// First byte after the delimiter line (after `--` for the terminal one).
    content_start: usize,
    /// `--boundary--`
    is_final: bool,
}

/// Multipart parser bound to one boundary token.
#[derive(Debug, Clone)]
pub struct Parser {
    boundary: String,
    delimiter: Vec<u8>,
    options: ParseOptions,
}

impl Parser {
    /// Creates a parser with default (lenient) options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBoundary`] if the boundary is empty or
    /// contains a line break.
    pub fn new(boundary: impl Into<String>) -> Result<Self> {
        Self::with_options(boundary, ParseOptions::default())
    }

    /// Creates a parser with the given options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBoundary`] if the boundary is empty, contains
    /// a line break, or (in strict mode) exceeds [`MAX_BOUNDARY_LEN`].
    pub fn with_options(boundary: impl Into<String>, options: ParseOptions) -> Result<Self> {
        let boundary = boundary.into();
        if boundary.is_empty() {
            return Err(Error::InvalidBoundary("empty boundary".to_string()));
        }
        if boundary.contains(['\r', '\n']) {
            return Err(Error::InvalidBoundary(boundary.escape_debug().to_string()));
        }
        if options.is_strict() && boundary.len() > MAX_BOUNDARY_LEN {
            return Err(Error::InvalidBoundary(format!(
                "boundary longer than {MAX_BOUNDARY_LEN} bytes"
            )));
        }

        let mut delimiter = Vec::with_capacity(boundary.len() + 2);
        delimiter.extend_from_slice(b"--");
        delimiter.extend_from_slice(boundary.as_bytes());

        Ok(Self {
            boundary,
            delimiter,
            options,
        })
    }

    /// The boundary token.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The parser options.
    #[must_use]
    pub const fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parses a body, copying it once into a shared buffer.
    ///
    /// # Errors
    ///
    /// See [`Parser::parse_bytes`].
    pub fn parse(&self, input: &[u8]) -> Result<MultipartMessage> {
        self.parse_bytes(Bytes::copy_from_slice(input))
    }

    /// Parses a body. Part bodies are slices of `input`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TooManyParts`] when the part limit is exceeded. In
    /// strict mode also returns [`Error::BoundaryNotFound`],
    /// [`Error::MissingHeaderSeparator`], [`Error::InvalidHeader`] or
    /// [`Error::MissingTerminator`] for malformed input.
    pub fn parse_bytes(&self, input: Bytes) -> Result<MultipartMessage> {
        let strict = self.options.is_strict();
        let mut delimiters = memmem::find_iter(&input, &self.delimiter)
            .filter_map(|pos| self.delimiter_at(&input, pos));

        let Some(mut current) = delimiters.next() else {
            if !input.is_empty() {
                if strict {
                    return Err(Error::BoundaryNotFound);
                }
                tracing::warn!(
                    boundary = %self.boundary,
                    len = input.len(),
                    "No boundary delimiter in multipart body"
                );
            }
            return Ok(MultipartMessage {
                boundary: self.boundary.clone(),
                preamble: input.clone(),
                parts: Vec::new(),
                epilogue: Bytes::new(),
                terminated: false,
            });
        };

        let preamble = input.slice(..current.marker_start);
        let mut parts = Vec::new();
        let mut epilogue = Bytes::new();
        let mut terminated = false;

        if current.is_final {
            terminated = true;
            epilogue = input.slice(current.content_start..);
        } else {
            loop {
                let next = delimiters.next();
                let end = match next {
                    Some(d) => d.line_start.max(current.content_start),
                    None if strict => return Err(Error::MissingTerminator),
                    None => {
                        tracing::warn!(
                            boundary = %self.boundary,
                            "Multipart body ends without terminal delimiter"
                        );
                        let end = trim_line_ending(&input, current.content_start);
                        // Nothing after the last delimiter line.
                        if end <= current.content_start {
                            break;
                        }
                        end
                    }
                };

                if parts.len() >= self.options.max_parts {
                    return Err(Error::TooManyParts {
                        limit: self.options.max_parts,
                    });
                }
                let segment = input.slice(current.content_start..end);
                parts.push(self.parse_part(&segment, parts.len())?);

                match next {
                    Some(d) if d.is_final => {
                        terminated = true;
                        epilogue = input.slice(d.content_start..);
                        break;
                    }
                    Some(d) => current = d,
                    None => break,
                }
            }
        }

        tracing::debug!(
            boundary = %self.boundary,
            parts = parts.len(),
            terminated,
            "Parsed multipart body"
        );

        Ok(MultipartMessage {
            boundary: self.boundary.clone(),
            preamble,
            parts,
            epilogue,
            terminated,
        })
    }

    /// Checks whether the delimiter match at `pos` starts a delimiter line.
    fn delimiter_at(&self, input: &[u8], pos: usize) -> Option<Delimiter> {
        let line_start = match pos {
            0 => 0,
            _ if input[pos - 1] != b'\n' => return None,
            _ if pos >= 2 && input[pos - 2] == b'\r' => pos - 2,
            _ => pos - 1,
        };

        let after = pos + self.delimiter.len();
        let rest = &input[after..];
        if rest.starts_with(b"--") {
            return Some(Delimiter {
                line_start,
                marker_start: pos,
                content_start: after + 2,
                is_final: true,
            });
        }

        // Transport padding, then the line ending.
        let padding = rest
            .iter()
            .take_while(|b| **b == b' ' || **b == b'\t')
            .count();
        let tail = &rest[padding..];
        let eol = if tail.is_empty() {
            0
        } else if tail.starts_with(b"\r\n") {
            2
        } else if tail.starts_with(b"\n") {
            1
        } else {
            return None;
        };

        tracing::trace!(pos, "Boundary delimiter");
        Some(Delimiter {
            line_start,
            marker_start: pos,
            content_start: after + padding + eol,
            is_final: false,
        })
    }

    fn parse_part(&self, segment: &Bytes, index: usize) -> Result<Part> {
        let strict = self.options.is_strict();

        let (header_block, body) = match split_header_block(segment) {
            Some((header_end, body_start)) => {
                (&segment[..header_end], segment.slice(body_start..))
            }
            None if strict => return Err(Error::MissingHeaderSeparator { part: index }),
            None => {
                tracing::warn!(part = index, "Part without header/body separator");
                (&segment[..], Bytes::new())
            }
        };

        let text = String::from_utf8_lossy(header_block);
        let headers = Headers::parse_block(&text, strict)?;
        tracing::trace!(part = index, headers = headers.len(), body = body.len(), "Part");

        Ok(Part { headers, body })
    }
}

/// Locates the empty line ending a header block. Returns the end of the
/// header text and the start of the body.
fn split_header_block(segment: &[u8]) -> Option<(usize, usize)> {
    if segment.starts_with(b"\r\n") {
        return Some((0, 2));
    }
    if segment.starts_with(b"\n") {
        return Some((0, 1));
    }

    for nl in memchr::memchr_iter(b'\n', segment) {
        let next = &segment[nl + 1..];
        if next.starts_with(b"\r\n") {
            return Some((nl + 1, nl + 3));
        }
        if next.starts_with(b"\n") {
            return Some((nl + 1, nl + 2));
        }
    }
    None
}

/// End of `input` with one trailing line ending removed, not before `floor`.
fn trim_line_ending(input: &[u8], floor: usize) -> usize {
    let tail = &input[floor..];
    let trimmed = if tail.ends_with(b"\r\n") {
        2
    } else if tail.ends_with(b"\n") {
        1
    } else {
        0
    };
    input.len() - trimmed
}
