//! Inline `{@link NAME}` and `{@code TEXT}` markers.
//!
//! A marker body may contain balanced braces: `{@code a{b}c}` is one code
//! span holding `a{b}c`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerError {
    #[error("@{marker}: unknown marker")]
    UnknownMarker { marker: String },
}

/// A piece of interpreted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    /// `{@link NAME}`
    Link(String),
    /// `{@code TEXT}`
    Code(String),
}

/// Split `text` into plain text and marker spans.
///
/// A marker that is still open at the end of the text is kept as plain text.
pub fn interpret(text: &str) -> Result<Vec<Span>, MarkerError> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c != '{' || chars.peek().map(|&(_, n)| n) != Some('@') {
            plain.push(c);
            continue;
        }
        chars.next();

        let Some((kind, body)) = read_marker(&mut chars) else {
            plain.push_str(&text[start..]);
            break;
        };
        let span = match kind.as_str() {
            "link" => Span::Link(body.trim().to_string()),
            "code" => Span::Code(body),
            _ => return Err(MarkerError::UnknownMarker { marker: kind }),
        };
        if !plain.is_empty() {
            spans.push(Span::Text(std::mem::take(&mut plain)));
        }
        spans.push(span);
    }

    if !plain.is_empty() {
        spans.push(Span::Text(plain));
    }
    Ok(spans)
}

/// Read a marker's type and body; the `{@` is already consumed.
fn read_marker<I>(chars: &mut std::iter::Peekable<I>) -> Option<(String, String)>
where
    I: Iterator<Item = (usize, char)>,
{
    let mut kind = String::new();
    loop {
        match chars.next()?.1 {
            ' ' | '\t' => break,
            '}' => return Some((kind, String::new())),
            c => kind.push(c),
        }
    }
    while let Some(&(_, ' ' | '\t')) = chars.peek() {
        chars.next();
    }

    let mut body = String::new();
    let mut depth = 1usize;
    for (_, c) in chars.by_ref() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((kind, body));
                }
            }
            _ => {}
        }
        body.push(c);
    }
    None
}

/// Escape text for inclusion in HTML.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '`' => out.push_str("&#x60;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape `text`, then replace its markers with HTML.
///
/// Escaping runs first so the generated markup is never escaped itself.
pub fn to_html(text: &str) -> Result<String, MarkerError> {
    let mut out = String::new();
    for span in interpret(&escape_html(text))? {
        match span {
            Span::Text(t) => out.push_str(&t),
            Span::Link(name) => out.push_str(&format!("<a href=\"#ref:{name}\">{name}</a>")),
            Span::Code(code) => out.push_str(&format!("<code>{code}</code>")),
        }
    }
    Ok(out)
}
