//! Message bodies and attachments extracted from a multipart message.

use crate::error::{Error, Result};
use crate::html::{inline_cid, text_to_html};
use crate::options::ExtractOptions;
use mimesplit::encoding::encode_base64;
use mimesplit::{ContentType, DispositionType, MultipartMessage, Parser, Part};
use serde::{Deserialize, Serialize};

/// An attachment carried by a multipart message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Filename.
    pub filename: String,
    /// MIME type (`type/subtype`).
    pub mime_type: String,
    /// `Content-ID` without angle brackets.
    pub content_id: Option<String>,
    /// How the sender wants the attachment presented.
    pub disposition: DispositionType,
    /// Decoded size in bytes.
    pub size: u64,
    /// Decoded payload.
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Attachment {
    fn from_part(part: &Part, content_type: &ContentType, index: usize) -> Result<Self> {
        let data = part.decode_body()?;
        let content_id = part.content_id().map(str::to_string);
        let disposition = match part.disposition() {
            Some(d) => d.kind,
            None if content_id.is_some() => DispositionType::Inline,
            None => DispositionType::Attachment,
        };

        Ok(Self {
            filename: part
                .filename()
                .unwrap_or_else(|| format!("attachment-{index}")),
            mime_type: content_type.essence(),
            content_id,
            disposition,
            size: data.len() as u64,
            data,
        })
    }

    /// Returns true if the attachment is meant to be shown inline.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.disposition == DispositionType::Inline
    }
}

/// Displayable content of a multipart message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    /// Plain text body.
    pub body_text: Option<String>,
    /// HTML body.
    pub body_html: Option<String>,
    /// List of attachments, in message order.
    pub attachments: Vec<Attachment>,
}

impl MessageContent {
    /// Extracts bodies and attachments from a parsed message.
    ///
    /// Nested `multipart/*` parts are parsed with their own boundary. The
    /// first inline `text/plain` and `text/html` parts become the bodies;
    /// every other leaf part becomes an attachment.
    ///
    /// # Errors
    ///
    /// Returns an error if a nested part cannot be parsed, or if nesting
    /// exceeds `options.max_depth`. A part whose transfer encoding cannot be
    /// decoded is an error only in strict mode; otherwise a body falls back
    /// to its raw bytes and an attachment is skipped.
    pub fn from_multipart(message: &MultipartMessage, options: &ExtractOptions) -> Result<Self> {
        let mut content = Self::default();
        content.collect(message, options, 0)?;
        tracing::debug!(
            has_text = content.body_text.is_some(),
            has_html = content.body_html.is_some(),
            attachments = content.attachments.len(),
            "Extracted message content"
        );
        Ok(content)
    }

    /// Parses a response body and extracts its content.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type is not multipart or extraction
    /// fails.
    pub fn from_response(content_type: &str, body: &[u8], options: &ExtractOptions) -> Result<Self> {
        let message = MultipartMessage::from_response(content_type, body, options.parse)?;
        Self::from_multipart(&message, options)
    }

    fn collect(
        &mut self,
        message: &MultipartMessage,
        options: &ExtractOptions,
        depth: usize,
    ) -> Result<()> {
        for part in message {
            let content_type = part.content_type().unwrap_or_else(|e| {
                tracing::warn!(?e, "Unreadable part content type");
                ContentType::new("application", "octet-stream")
            });
            let is_attachment = part.is_attachment();

            if content_type.is_multipart() && !is_attachment {
                if let Some(boundary) = content_type.boundary() {
                    if depth >= options.max_depth {
                        return Err(Error::NestingTooDeep {
                            limit: options.max_depth,
                        });
                    }
                    let nested = Parser::with_options(boundary, options.parse)?
                        .parse_bytes(part.body.clone())?;
                    self.collect(&nested, options, depth + 1)?;
                    continue;
                }
                tracing::warn!(
                    content_type = %content_type.essence(),
                    "Nested multipart without boundary"
                );
            }

            if !is_attachment {
                if content_type.is("text", "plain") && self.body_text.is_none() {
                    self.body_text = Some(body_of(part, options)?);
                    continue;
                }
                if content_type.is("text", "html") && self.body_html.is_none() {
                    self.body_html = Some(body_of(part, options)?);
                    continue;
                }
            }

            let index = self.attachments.len() + 1;
            match Attachment::from_part(part, &content_type, index) {
                Ok(attachment) => self.attachments.push(attachment),
                Err(e) if !options.parse.is_strict() => tracing::warn!(
                    ?e,
                    content_type = %content_type.essence(),
                    "Skipping undecodable attachment"
                ),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Returns the body as HTML with `cid:` images inlined.
    ///
    /// Uses the HTML body when present, otherwise the plain text body,
    /// escaped and with line breaks converted. Every `src="cid:..."`
    /// reference to an attachment is replaced by a `data:` URI.
    #[must_use]
    pub fn render_html(&self) -> String {
        let mut html = match (&self.body_html, &self.body_text) {
            (Some(html), _) => html.clone(),
            (None, Some(text)) => text_to_html(text),
            (None, None) => String::new(),
        };

        for attachment in &self.attachments {
            if let Some(cid) = &attachment.content_id {
                html = inline_cid(&html, cid, &attachment.mime_type, &encode_base64(&attachment.data));
            }
        }
        html
    }

    /// Attachments meant to be offered for download.
    pub fn downloads(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter().filter(|a| !a.is_inline())
    }
}

/// Decoded text of a body part; lenient extraction falls back to the raw
/// bytes when the transfer encoding is broken.
fn body_of(part: &Part, options: &ExtractOptions) -> Result<String> {
    match part.body_text() {
        Ok(text) => Ok(text),
        Err(e) if !options.parse.is_strict() => {
            tracing::warn!(?e, "Undecodable body, using raw bytes");
            Ok(String::from_utf8_lossy(&part.body).into_owned())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mimesplit::{Headers, parse};

    fn part(headers: &[(&str, &str)], body: &'static [u8]) -> Part {
        Part::new(headers.iter().copied().collect::<Headers>(), body)
    }

    #[test]
    fn test_text_and_html_bodies() {
        let message = MultipartMessage::new(
            "B",
            vec![
                part(&[("Content-Type", "text/plain")], b"plain"),
                part(&[("Content-Type", "text/html")], b"<b>html</b>"),
            ],
        );
        let content = MessageContent::from_multipart(&message, &ExtractOptions::default()).unwrap();
        assert_eq!(content.body_text.as_deref(), Some("plain"));
        assert_eq!(content.body_html.as_deref(), Some("<b>html</b>"));
        assert!(content.attachments.is_empty());
    }

    #[test]
    fn test_text_attachment_is_not_body() {
        let message = MultipartMessage::new(
            "B",
            vec![
                part(
                    &[
                        ("Content-Type", "text/plain"),
                        ("Content-Disposition", "attachment; filename=notes.txt"),
                    ],
                    b"notes",
                ),
                part(&[("Content-Type", "text/plain")], b"body"),
            ],
        );
        let content = MessageContent::from_multipart(&message, &ExtractOptions::default()).unwrap();
        assert_eq!(content.body_text.as_deref(), Some("body"));
        assert_eq!(content.attachments.len(), 1);
        assert_eq!(content.attachments[0].filename, "notes.txt");
        assert_eq!(content.attachments[0].data, b"notes");
        assert_eq!(content.attachments[0].size, 5);
    }

    #[test]
    fn test_attachment_defaults() {
        let message = MultipartMessage::new(
            "B",
            vec![
                part(&[("Content-Type", "image/png"), ("Content-ID", "<logo>")], b"PNG"),
                part(&[("Content-Type", "application/zip")], b"ZIP"),
            ],
        );
        let content = MessageContent::from_multipart(&message, &ExtractOptions::default()).unwrap();
        let [logo, zip] = &content.attachments[..] else {
            panic!("expected two attachments");
        };
        assert_eq!(logo.filename, "attachment-1");
        assert_eq!(logo.content_id.as_deref(), Some("logo"));
        assert!(logo.is_inline());
        assert_eq!(zip.filename, "attachment-2");
        assert_eq!(zip.disposition, DispositionType::Attachment);

        let downloads: Vec<_> = content.downloads().map(|a| a.mime_type.as_str()).collect();
        assert_eq!(downloads, vec!["application/zip"]);
    }

    #[test]
    fn test_nested_alternative() {
        let input = concat!(
            "--outer\r\n",
            "Content-Type: multipart/alternative; boundary=\"inner\"\r\n",
            "\r\n",
            "--inner\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "plain\r\n",
            "--inner\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<p>html</p>\r\n",
            "--inner--\r\n",
            "--outer\r\n",
            "Content-Type: application/pdf\r\n",
            "Content-Disposition: attachment; filename=\"a.pdf\"\r\n",
            "\r\n",
            "%PDF\r\n",
            "--outer--"
        );
        let message = parse(input.as_bytes(), "outer").unwrap();
        let content = MessageContent::from_multipart(&message, &ExtractOptions::default()).unwrap();
        assert_eq!(content.body_text.as_deref(), Some("plain"));
        assert_eq!(content.body_html.as_deref(), Some("<p>html</p>"));
        assert_eq!(content.attachments.len(), 1);
        assert_eq!(content.attachments[0].filename, "a.pdf");
    }

    #[test]
    fn test_nesting_limit() {
        let input = concat!(
            "--a\r\n",
            "Content-Type: multipart/mixed; boundary=b\r\n",
            "\r\n",
            "--b\r\n",
            "\r\n",
            "deep\r\n",
            "--b--\r\n",
            "--a--"
        );
        let message = parse(input.as_bytes(), "a").unwrap();
        let options = ExtractOptions::builder().max_depth(0).build();
        assert!(matches!(
            MessageContent::from_multipart(&message, &options),
            Err(Error::NestingTooDeep { limit: 0 })
        ));

        let content = MessageContent::from_multipart(&message, &ExtractOptions::default()).unwrap();
        assert_eq!(content.body_text.as_deref(), Some("deep"));
    }

    #[test]
    fn test_render_html_from_text() {
        let content = MessageContent {
            body_text: Some("Hi <you>\r\nbye".to_string()),
            ..MessageContent::default()
        };
        assert_eq!(
            content.render_html(),
            "<html><body>Hi &lt;you&gt;<br />bye</body></html>"
        );
        assert_eq!(MessageContent::default().render_html(), "");
    }

    #[test]
    fn test_render_html_inlines_cid_images() {
        let content = MessageContent {
            body_html: Some(r#"<img src="cid:logo">"#.to_string()),
            attachments: vec![Attachment {
                filename: "logo.png".to_string(),
                mime_type: "image/png".to_string(),
                content_id: Some("logo".to_string()),
                disposition: DispositionType::Inline,
                size: 3,
                data: b"PNG".to_vec(),
            }],
            ..MessageContent::default()
        };
        assert_eq!(
            content.render_html(),
            r#"<img src="data:image/png;base64,UE5H">"#
        );
    }
}
