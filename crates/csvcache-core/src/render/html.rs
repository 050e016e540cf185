use serde::Serialize;

use crate::error::CsvCacheError;

/// Escape text for use in element content and quoted attribute values.
pub fn escape<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Serialise `value` for an inline `<script type="application/json">`.
///
/// `<`, `>` and `&` only occur inside JSON strings, so replacing them with
/// unicode escapes keeps the JSON equivalent and the script block unbreakable.
pub fn json_for_script<T: Serialize>(value: &T) -> serde_json::Result<String> {
    Ok(serde_json::to_string(value)?
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

/// Inert stand-in emitted when a view cannot be rendered.
pub fn placeholder(err: &CsvCacheError) -> String {
    format!("<!-- csvcache: {} -->", err.code())
}

/// Append-only HTML buffer.
pub(crate) struct Html {
    buf: String,
}

impl Html {
    pub(crate) fn new() -> Self {
        Self {
            buf: String::with_capacity(16 * 1024),
        }
    }

    pub(crate) fn push<S: AsRef<str>>(&mut self, s: S) {
        self.buf.push_str(s.as_ref());
    }

    /// Push escaped text.
    pub(crate) fn text<S: AsRef<str>>(&mut self, s: S) {
        self.buf.push_str(&escape(s));
    }

    pub(crate) fn finish(self) -> String {
        self.buf
    }
}
