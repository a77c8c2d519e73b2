//! Text utilities: HTML escaping and trusted markup fragments

use std::fmt;

use serde::Serialize;

/// Escape text for embedding in HTML element content or attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
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

/// A self-contained piece of markup that is safe to embed verbatim.
///
/// Only the highlighter and [`Fragment::escaped`] construct these, so every
/// literal character inside has already been escaped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Fragment(String);

impl Fragment {
    /// Plain text, escaped.
    #[must_use]
    pub fn escaped(text: &str) -> Self {
        Self(escape_html(text))
    }

    /// Markup already built from escaped text.
    pub(crate) const fn from_markup(markup: String) -> Self {
        Self(markup)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
