//! Plain text to HTML helpers.

/// Escapes `&`, `"`, `'`, `<` and `>` for inclusion in HTML.
#[must_use]
pub fn encode_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replaces CRLF and LF line endings with `<br />`.
#[must_use]
pub fn ln2br(text: &str) -> String {
    text.replace("\r\n", "<br />").replace('\n', "<br />")
}

/// Wraps escaped plain text in a minimal HTML document.
#[must_use]
pub fn text_to_html(text: &str) -> String {
    format!("<html><body>{}</body></html>", ln2br(&encode_html(text)))
}

/// Replaces `src="cid:<id>"` references with an inline data URI.
#[must_use]
pub fn inline_cid(html: &str, content_id: &str, mime_type: &str, base64: &str) -> String {
    let reference = format!("src=\"cid:{content_id}\"");
    if !html.contains(&reference) {
        return html.to_string();
    }
    html.replace(&reference, &format!("src=\"data:{mime_type};base64,{base64}\""))
}
