//! Escaping helpers for markup built by hand.

/// Escape the characters that are significant in HTML text content.
///
/// Quotes are left alone; use [`escape_attribute`] for attribute values.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape a value for use inside a double-quoted attribute.
pub fn escape_attribute(s: &str) -> String {
    escape_html(s).replace('"', "&quot;")
}
