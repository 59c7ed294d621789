//! Minimal reader for the service's XML representation
//!
//! Only element text is extracted; nothing is validated against a schema.

use regex::Regex;

/// Text of the first `<element>` in `body`, if any
pub fn first_text(body: &str, element: &str) -> Option<String> {
    all_text(body, element).into_iter().next()
}

/// Text of every `<element>` in `body`, in document order.
/// Self-closing elements yield an empty string.
pub fn all_text(body: &str, element: &str) -> Vec<String> {
    let name = regex::escape(element);
    let pattern = format!(
        r"(?s)<{name}(?:\s[^>]*)?/>|<{name}(?:\s[^>]*)?>(.*?)</{name}\s*>",
        name = name
    );
    // The element name is escaped, so the pattern always compiles.
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };

    re.captures_iter(body)
        .map(|caps| caps.get(1).map(|m| unescape(m.as_str())).unwrap_or_default())
        .collect()
}

/// Render a flat `<root><field>value</field>...</root>` document
pub fn element(root: &str, fields: &[(&str, &str)]) -> String {
    let mut out = format!("<{}>", root);
    for (name, value) in fields {
        out.push_str(&format!("<{name}>{}</{name}>", escape(value), name = name));
    }
    out.push_str(&format!("</{}>", root));
    out
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
