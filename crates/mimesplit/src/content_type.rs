//! `Content-Type` and `Content-Disposition` handling.

use crate::encoding::decode_percent;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "mixed").
    pub sub_type: String,
    /// Parameters keyed by lowercased name (e.g., charset, boundary).
    pub parameters: HashMap<String, String>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: HashMap::new(),
        }
    }

    /// The RFC 2045 default for parts without a `Content-Type` header.
    #[must_use]
    pub fn default_text() -> Self {
        Self::new("text", "plain").with_parameter("charset", "us-ascii")
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters
            .insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Returns `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameters.get("charset").map(String::as_str)
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameters.get("boundary").map(String::as_str)
    }

    /// Returns the `name` parameter if present.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.parameters.get("name").map(String::as_str)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Checks the type and subtype, ignoring case.
    #[must_use]
    pub fn is(&self, main_type: &str, sub_type: &str) -> bool {
        self.main_type.eq_ignore_ascii_case(main_type) && self.sub_type.eq_ignore_ascii_case(sub_type)
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="quoted; value"`
    ///
    /// # Errors
    ///
    /// Returns an error if the type or subtype is missing.
    pub fn parse(s: &str) -> Result<Self> {
        let (type_str, params) = split_value(s);

        let (main_type, sub_type) = type_str
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(s.to_string()))?;
        let main_type = main_type.trim();
        let sub_type = sub_type.trim();
        if main_type.is_empty() || sub_type.is_empty() {
            return Err(Error::InvalidContentType(s.to_string()));
        }

        Ok(Self {
            main_type: main_type.to_ascii_lowercase(),
            sub_type: sub_type.to_ascii_lowercase(),
            parameters: parse_parameters(params),
        })
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;
        write_parameters(f, &self.parameters)
    }
}

/// Disposition type of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DispositionType {
    /// Displayed as part of the message.
    Inline,
    /// Offered as a separate download.
    Attachment,
}

/// Parsed `Content-Disposition` header.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentDisposition {
    /// Disposition type. Unknown types are treated as attachments (RFC 2183).
    pub kind: DispositionType,
    /// Parameters keyed by lowercased name.
    pub parameters: HashMap<String, String>,
}

impl ContentDisposition {
    /// Parses a `Content-Disposition` value.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let (kind, params) = split_value(s);
        let kind = if kind.trim().eq_ignore_ascii_case("inline") {
            DispositionType::Inline
        } else {
            DispositionType::Attachment
        };
        Self {
            kind,
            parameters: parse_parameters(params),
        }
    }

    /// Returns the `filename` parameter if present.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.parameters.get("filename").map(String::as_str)
    }
}

/// Extracts the boundary token from a `multipart/*` content type value.
///
/// # Errors
///
/// Returns [`Error::NotMultipart`] for other types and
/// [`Error::MissingBoundaryParameter`] when the boundary is absent or empty.
pub fn boundary_from_content_type(content_type: &str) -> Result<String> {
    let ct = ContentType::parse(content_type)?;
    if !ct.is_multipart() {
        return Err(Error::NotMultipart(ct.essence()));
    }
    match ct.boundary() {
        Some(boundary) if !boundary.is_empty() => Ok(boundary.to_string()),
        _ => Err(Error::MissingBoundaryParameter),
    }
}

/// Splits `value; params` at the first semicolon.
fn split_value(s: &str) -> (&str, &str) {
    s.split_once(';').map_or((s.trim(), ""), |(v, p)| (v.trim(), p))
}

/// Parses `k=v; k2="v;2"` pairs. Keys are lowercased; quotes and backslash
/// escapes are removed from quoted values. RFC 2231 extended and continued
/// parameters are folded into their base name.
fn parse_parameters(s: &str) -> HashMap<String, String> {
    let mut params = Vec::new();
    let mut chars = s.chars().peekable();

    loop {
        // Key
        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            chars.next();
            if c == '=' {
                break;
            }
            if c == ';' {
                key.clear();
                continue;
            }
            key.push(c);
        }
        let key = key.trim().to_ascii_lowercase();

        // Value
        while chars.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            chars.next();
        }
        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    _ => value.push(c),
                }
            }
            // Skip to the next separator
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
            }
        } else {
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
                value.push(c);
            }
            value = value.trim().to_string();
        }

        if !key.is_empty() {
            params.push((key, value));
        }
        if chars.peek().is_none() {
            break;
        }
    }

    merge_extended(params)
}

/// One `name*<index>[*]` section of an RFC 2231 parameter.
struct Section {
    index: u32,
    encoded: bool,
    value: String,
}

/// Folds `name*=charset'lang'value`, `name*0=..`, `name*1*=..` into `name`.
/// An extended value replaces a plain parameter of the same name.
fn merge_extended(raw: Vec<(String, String)>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut extended: HashMap<String, Vec<Section>> = HashMap::new();

    for (key, value) in raw {
        let (name, encoded) = key
            .strip_suffix('*')
            .map_or((key.as_str(), false), |name| (name, true));
        let (base, index) = match name.rsplit_once('*') {
            Some((base, index)) => match index.parse::<u32>() {
                Ok(index) => (base, index),
                Err(_) => {
                    params.insert(key, value);
                    continue;
                }
            },
            None if encoded => (name, 0),
            None => {
                params.insert(key, value);
                continue;
            }
        };
        extended.entry(base.to_string()).or_default().push(Section {
            index,
            encoded,
            value,
        });
    }

    for (name, mut sections) in extended {
        sections.sort_by_key(|s| s.index);
        let mut bytes = Vec::new();
        let mut charset = String::new();
        for (position, section) in sections.iter().enumerate() {
            if !section.encoded {
                bytes.extend_from_slice(section.value.as_bytes());
                continue;
            }
            let mut value = section.value.as_str();
            if position == 0 {
                let mut fields = value.splitn(3, '\'');
                if let (Some(cs), Some(_lang), Some(rest)) =
                    (fields.next(), fields.next(), fields.next())
                {
                    charset = cs.to_ascii_lowercase();
                    value = rest;
                }
            }
            bytes.extend(decode_percent(value.as_bytes()));
        }

        let value = match charset.as_str() {
            "iso-8859-1" | "latin1" => bytes.iter().map(|&b| char::from(b)).collect(),
            _ => String::from_utf8_lossy(&bytes).into_owned(),
        };
        tracing::trace!(
            parameter = %name,
            sections = sections.len(),
            "Decoded extended parameter"
        );
        params.insert(name, value);
    }

    params
}

fn write_parameters(f: &mut fmt::Formatter<'_>, params: &HashMap<String, String>) -> fmt::Result {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort_by(|(a, _), (b, _)| a.cmp(b));

    for (key, value) in sorted {
        // Quote value if it contains tspecials
        if value.is_empty() || value.contains(|c: char| c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c)) {
            let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
            write!(f, "; {key}=\"{escaped}\"")?;
        } else {
            write!(f, "; {key}={value}")?;
        }
    }
    Ok(())
}
