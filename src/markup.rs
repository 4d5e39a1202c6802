//! HTML tag assembly and option encoding
//!
//! Every attribute value goes through [`escape_html`] on its way into a tag,
//! so configuration values read from files or the environment cannot break
//! out of an attribute.

use std::io;

use serde::Serialize;
use serde_json::ser::{CharEscape, Formatter};
use serde_json::Value;

use crate::{Error, Result};

/// Escape the five HTML-significant characters
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Ordered attribute list; `None` values render as bare attributes (`defer`)
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    entries: Vec<(&'static str, Option<String>)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(mut self, name: &'static str) -> Self {
        self.entries.push((name, None));
        self
    }

    pub fn set(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.entries.push((name, Some(value.into())));
        self
    }

    /// Add the attribute only when `value` is non-empty
    pub fn set_non_empty(self, name: &'static str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.set(name, value)
        }
    }

    /// Render as ` a="1" b` (leading space, empty when there are none)
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.entries {
            out.push(' ');
            out.push_str(name);
            if let Some(value) = value {
                out.push_str("=\"");
                out.push_str(&escape_html(value));
                out.push('"');
            }
        }
        out
    }
}

/// `<link ...>` style void element
pub fn void_tag(tag: &str, attributes: &Attributes) -> String {
    format!("<{}{}>", tag, attributes.render())
}

/// `<script ...></script>`
pub fn script_tag(attributes: &Attributes) -> String {
    format!("<script{}></script>", attributes.render())
}

/// Deep-merge `overrides` over `defaults`.
///
/// Objects merge key by key, recursively; any other override value
/// (arrays included) replaces the default outright.
pub fn merge_options(defaults: &Value, overrides: &Value) -> Value {
    match (defaults, overrides) {
        (Value::Object(base), Value::Object(over)) => {
            let mut merged = base.clone();
            for (key, value) in over {
                let next = match merged.get(key) {
                    Some(existing) => merge_options(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (_, over) => over.clone(),
    }
}

/// JSON formatter that writes `<`, `>`, `&`, `'` and `"` inside strings as
/// `\u00XX` escapes, so the output can sit in an HTML attribute or an inline
/// `<script>` without terminating it.
struct HtmlSafeFormatter;

impl Formatter for HtmlSafeFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            let escaped = match c {
                '<' => "\\u003C",
                '>' => "\\u003E",
                '&' => "\\u0026",
                '\'' => "\\u0027",
                _ => continue,
            };
            writer.write_all(fragment[start..i].as_bytes())?;
            writer.write_all(escaped.as_bytes())?;
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn write_char_escape<W>(&mut self, writer: &mut W, char_escape: CharEscape) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let s: &[u8] = match char_escape {
            CharEscape::Quote => b"\\u0022",
            CharEscape::ReverseSolidus => b"\\\\",
            CharEscape::Solidus => b"\\/",
            CharEscape::Backspace => b"\\b",
            CharEscape::FormFeed => b"\\f",
            CharEscape::LineFeed => b"\\n",
            CharEscape::CarriageReturn => b"\\r",
            CharEscape::Tab => b"\\t",
            CharEscape::AsciiControl(byte) => {
                return write!(writer, "\\u{:04x}", byte);
            }
        };
        writer.write_all(s)
    }
}

/// Encode auto-render options as compact, HTML-safe JSON
pub fn encode_options<T>(options: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, HtmlSafeFormatter);
    options
        .serialize(&mut ser)
        .map_err(|e| Error::EncodingFailure(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| Error::EncodingFailure(e.to_string()))
}
