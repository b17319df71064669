//! Transfer encoding decoders for part bodies and header words.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 encoded words.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Soft line breaks (`=` at end of line, with optional trailing padding)
/// are removed. An `=` not followed by two hex digits is kept literally.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            out.push(byte);
            i += 1;
            continue;
        }

        let rest = &data[i + 1..];
        let padding = rest
            .iter()
            .take_while(|b| **b == b' ' || **b == b'\t')
            .count();
        let after = &rest[padding..];
        if after.starts_with(b"\r\n") {
            i += 1 + padding + 2;
        } else if after.starts_with(b"\n") {
            i += 1 + padding + 1;
        } else if let Some(value) = rest.get(..2).and_then(hex_pair) {
            out.push(value);
            i += 3;
        } else {
            out.push(b'=');
            i += 1;
        }
    }

    out
}

/// Decodes `%XX` escapes (RFC 2231 extended parameter values). A `%` not
/// followed by two hex digits is kept literally.
pub(crate) fn decode_percent(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        match data.get(i + 1..i + 3).and_then(hex_pair) {
            Some(value) if data[i] == b'%' => {
                out.push(value);
                i += 3;
            }
            _ => {
                out.push(data[i]);
                i += 1;
            }
        }
    }

    out
}

fn hex_pair(pair: &[u8]) -> Option<u8> {
    let hi = (pair[0] as char).to_digit(16)?;
    let lo = (pair[1] as char).to_digit(16)?;
    u8::try_from(hi * 16 + lo).ok()
}

/// Decodes a header value containing RFC 2047 encoded words.
///
/// Format: `=?charset?encoding?encoded-text?=`. Whitespace between two
/// adjacent encoded words is dropped; text outside encoded words is kept.
/// Decoded bytes are interpreted as UTF-8 (lossy).
///
/// # Errors
///
/// Returns an error for an unknown encoding letter or invalid Base64.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut pending_space = String::new();
    let mut last_was_word = false;

    while !rest.is_empty() {
        let Some(start) = rest.find("=?") else {
            out.push_str(&pending_space);
            out.push_str(rest);
            break;
        };

        let Some((word, consumed)) = encoded_word(&rest[start..]) else {
            // Not an encoded word; emit through the "=?" and carry on.
            out.push_str(&pending_space);
            pending_space.clear();
            out.push_str(&rest[..start + 2]);
            rest = &rest[start + 2..];
            last_was_word = false;
            continue;
        };

        let between = &rest[..start];
        if !(last_was_word && between.trim().is_empty()) {
            out.push_str(&pending_space);
            out.push_str(between);
        }
        pending_space.clear();

        out.push_str(&decode_word(word)?);
        rest = &rest[start + consumed..];
        last_was_word = true;

        // Hold whitespace that may separate this word from the next one.
        let ws = rest.len() - rest.trim_start().len();
        pending_space.push_str(&rest[..ws]);
        rest = &rest[ws..];
    }

    Ok(out)
}

/// Returns the inner `charset?enc?text` of a leading encoded word and the
/// total length consumed.
fn encoded_word(s: &str) -> Option<(&str, usize)> {
    let inner = s.strip_prefix("=?")?;
    let q1 = inner.find('?')?;
    let q2 = q1 + 1 + inner[q1 + 1..].find('?')?;
    let end = q2 + 1 + inner[q2 + 1..].find("?=")?;
    Some((&inner[..end], end + 4))
}

fn decode_word(word: &str) -> Result<String> {
    let mut fields = word.splitn(3, '?');
    let _charset = fields.next().unwrap_or_default();
    let encoding = fields.next().unwrap_or_default();
    let encoded = fields.next().unwrap_or_default();

    let bytes = match encoding {
        "B" | "b" => decode_base64(encoded.as_bytes())?,
        "Q" | "q" => decode_quoted_printable(encoded.replace('_', " ").as_bytes()),
        other => {
            return Err(Error::InvalidEncoding(format!("Unknown encoding: {other}")));
        }
    };

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
