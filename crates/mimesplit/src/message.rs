//! Parsed multipart message structure.

use crate::content_type::{ContentDisposition, ContentType, DispositionType};
use crate::encoding::{decode_base64, decode_quoted_printable, decode_rfc2047};
use crate::error::Result;
use crate::header::Headers;
use crate::options::ParseOptions;
use crate::parser::Parser;
use bytes::Bytes;
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit data.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// One boundary-delimited section of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body (raw bytes, still transfer-encoded).
    pub body: Bytes,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub fn new(headers: Headers, body: impl Into<Bytes>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    /// Gets the content type, defaulting to `text/plain; charset=us-ascii`.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::default_text()), ContentType::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if Base64 decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(&self.body),
            TransferEncoding::QuotedPrintable => Ok(decode_quoted_printable(&self.body)),
            _ => Ok(self.body.to_vec()),
        }
    }

    /// Gets the decoded body as text. Invalid UTF-8 is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if transfer decoding fails.
    pub fn body_text(&self) -> Result<String> {
        let decoded = self.decode_body()?;
        Ok(String::from_utf8_lossy(&decoded).into_owned())
    }

    /// Gets the `Content-ID` without its angle brackets.
    #[must_use]
    pub fn content_id(&self) -> Option<&str> {
        let id = self.headers.get("content-id")?.trim();
        let id = id.strip_prefix('<').unwrap_or(id);
        let id = id.strip_suffix('>').unwrap_or(id);
        (!id.is_empty()).then_some(id)
    }

    /// Gets the parsed `Content-Disposition` header.
    #[must_use]
    pub fn disposition(&self) -> Option<ContentDisposition> {
        self.headers
            .get("content-disposition")
            .map(ContentDisposition::parse)
    }

    /// Gets the filename from `Content-Disposition` or the content type
    /// `name` parameter, decoding RFC 2047 words.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        let raw = self
            .disposition()
            .and_then(|d| d.filename().map(str::to_string))
            .or_else(|| {
                self.content_type()
                    .ok()
                    .and_then(|ct| ct.name().map(str::to_string))
            })?;
        let name = decode_rfc2047(&raw).unwrap_or(raw);
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    /// Returns true if the part is marked `Content-Disposition: attachment`.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.disposition()
            .is_some_and(|d| d.kind == DispositionType::Attachment)
    }
}

/// Ordered parts extracted from one multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultipartMessage {
    pub(crate) boundary: String,
    pub(crate) preamble: Bytes,
    pub(crate) parts: Vec<Part>,
    pub(crate) epilogue: Bytes,
    pub(crate) terminated: bool,
}

impl MultipartMessage {
    /// Creates a message from parts, as if closed by a terminal delimiter.
    #[must_use]
    pub fn new(boundary: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            boundary: boundary.into(),
            preamble: Bytes::new(),
            parts,
            epilogue: Bytes::new(),
            terminated: true,
        }
    }

    /// Parses a response body using the boundary from its `Content-Type`
    /// header value.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type is not `multipart/*`, has no
    /// boundary, or the body cannot be parsed under `options`.
    pub fn from_response(content_type: &str, body: &[u8], options: ParseOptions) -> Result<Self> {
        let boundary = crate::content_type::boundary_from_content_type(content_type)?;
        Parser::with_options(boundary, options)?.parse(body)
    }

    /// The boundary token (without the leading `--`).
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The parts, in source order.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Consumes the message, returning its parts.
    #[must_use]
    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }

    /// Number of parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns true if no parts were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Iterates over the parts in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, Part> {
        self.parts.iter()
    }

    /// Bytes before the first `--boundary` marker, including the line
    /// ending that precedes it.
    #[must_use]
    pub fn preamble(&self) -> &[u8] {
        &self.preamble
    }

    /// Bytes after the terminal `--boundary--` marker, including the line
    /// ending that follows it.
    #[must_use]
    pub fn epilogue(&self) -> &[u8] {
        &self.epilogue
    }

    /// Returns true if the terminal delimiter was present.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Finds the part with the given `Content-ID` (brackets optional).
    #[must_use]
    pub fn find_by_content_id(&self, id: &str) -> Option<&Part> {
        let id = id.trim_start_matches('<').trim_end_matches('>');
        self.parts.iter().find(|p| p.content_id() == Some(id))
    }

    /// Serializes the message back into a multipart body.
    ///
    /// Each part is written as `--boundary CRLF headers CRLF body CRLF`,
    /// followed by `--boundary--` and the epilogue. A message whose input
    /// held no delimiter at all serializes to its preamble.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.parts.is_empty() && !self.terminated {
            return self.preamble.to_vec();
        }

        let delimiter = format!("--{}", self.boundary);
        let mut out = Vec::with_capacity(
            self.preamble.len()
                + self.epilogue.len()
                + self.parts.iter().map(|p| p.body.len() + 128).sum::<usize>(),
        );

        out.extend_from_slice(&self.preamble);
        for part in &self.parts {
            out.extend_from_slice(delimiter.as_bytes());
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(part.headers.to_string().as_bytes());
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(&part.body);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(delimiter.as_bytes());
        out.extend_from_slice(b"--");
        out.extend_from_slice(&self.epilogue);
        out
    }
}

impl<'a> IntoIterator for &'a MultipartMessage {
    type Item = &'a Part;
    type IntoIter = std::slice::Iter<'a, Part>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn part(headers: &[(&str, &str)], body: &'static [u8]) -> Part {
        Part::new(headers.iter().copied().collect(), body)
    }

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse(" BASE64 "), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("Quoted-Printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("x-unknown"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::Base64.to_string(), "base64");
    }

    #[test]
    fn test_part_default_content_type() {
        let p = part(&[], b"hi");
        assert_eq!(p.content_type().unwrap().essence(), "text/plain");
        assert_eq!(p.transfer_encoding(), TransferEncoding::SevenBit);
    }

    #[test]
    fn test_part_decode_base64() {
        let p = part(
            &[("Content-Transfer-Encoding", "base64")],
            b"SGVs\r\nbG8=",
        );
        assert_eq!(p.decode_body().unwrap(), b"Hello");
        assert_eq!(p.body_text().unwrap(), "Hello");
    }

    #[test]
    fn test_part_decode_quoted_printable() {
        let p = part(
            &[("Content-Transfer-Encoding", "quoted-printable")],
            b"caf=C3=A9=\r\n!",
        );
        assert_eq!(p.body_text().unwrap(), "café!");
    }

    #[test]
    fn test_part_content_id() {
        let p = part(&[("Content-ID", " <img1@example.com> ")], b"");
        assert_eq!(p.content_id(), Some("img1@example.com"));
        assert_eq!(part(&[("Content-ID", "<>")], b"").content_id(), None);
        assert_eq!(part(&[], b"").content_id(), None);
    }

    #[test]
    fn test_part_filename_sources() {
        let p = part(
            &[
                ("Content-Type", "application/pdf; name=\"fallback.pdf\""),
                ("Content-Disposition", "attachment; filename=\"report.pdf\""),
            ],
            b"",
        );
        assert_eq!(p.filename().as_deref(), Some("report.pdf"));
        assert!(p.is_attachment());

        let p = part(&[("Content-Type", "image/png; name=logo.png")], b"");
        assert_eq!(p.filename().as_deref(), Some("logo.png"));
        assert!(!p.is_attachment());

        let p = part(
            &[("Content-Disposition", "attachment; filename=\"=?utf-8?B?SMOpbGxvLnR4dA==?=\"")],
            b"",
        );
        assert_eq!(p.filename().as_deref(), Some("Héllo.txt"));
    }

    #[test]
    fn test_message_accessors() {
        let message = MultipartMessage::new(
            "B",
            vec![
                part(&[("Content-ID", "<a>")], b"one"),
                part(&[], b"two"),
            ],
        );
        assert_eq!(message.boundary(), "B");
        assert_eq!(message.len(), 2);
        assert!(!message.is_empty());
        assert!(message.is_terminated());
        assert_eq!(message.find_by_content_id("<a>").unwrap().body, "one");
        assert!(message.find_by_content_id("missing").is_none());
        let bodies: Vec<_> = (&message).into_iter().map(|p| p.body.clone()).collect();
        assert_eq!(bodies, vec![Bytes::from_static(b"one"), Bytes::from_static(b"two")]);
    }

    #[test]
    fn test_message_to_bytes() {
        let message = MultipartMessage::new(
            "B",
            vec![
                part(&[("Content-Type", "text/plain")], b"hello"),
                part(&[], b"bare"),
            ],
        );
        assert_eq!(
            message.to_bytes(),
            b"--B\r\nContent-Type: text/plain\r\n\r\nhello\r\n--B\r\n\r\nbare\r\n--B--".to_vec()
        );
    }

    #[test]
    fn test_empty_message_to_bytes() {
        assert_eq!(MultipartMessage::new("B", Vec::new()).to_bytes(), b"--B--".to_vec());
    }
}
