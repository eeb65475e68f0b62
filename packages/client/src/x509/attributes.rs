//! Display-oriented attribute projection
//!
//! `Attributes` trees are lossy renderings for presentation and are never
//! used for round-trips.

use std::fmt::Write;

use crate::config::FormatLimits;

/// Marker appended to truncated projections.
pub const ELLIPSIS: &str = "...";

/// A named, optionally valued node with ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attributes {
    name: String,
    value: Option<String>,
    children: Vec<Attributes>,
}

impl Attributes {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    #[must_use]
    pub fn children(&self) -> &[Attributes] {
        &self.children
    }

    /// Add a child node and return it for further nesting.
    pub fn add(&mut self, name: impl Into<String>, value: Option<String>) -> &mut Attributes {
        self.children.push(Attributes::new(name, value));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Add a child node populated from a content provider.
    pub fn add_content(
        &mut self,
        name: impl Into<String>,
        content: &dyn AttributesContent,
        limits: &FormatLimits,
    ) -> &mut Attributes {
        let child = self.add(name, None);
        content.add_to_attributes(child, limits);
        child
    }

    /// Find a direct child by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Attributes> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Render the tree as indented `name: value` lines.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let _ = match &self.value {
            Some(value) => writeln!(out, "{:indent$}{}: {}", "", self.name, value, indent = depth * 2),
            None => writeln!(out, "{:indent$}{}", "", self.name, indent = depth * 2),
        };
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}

/// Objects able to contribute child nodes to an attribute tree.
pub trait AttributesContent {
    fn add_to_attributes(&self, attributes: &mut Attributes, limits: &FormatLimits);
}

/// Join items with `", "`, truncating deterministically at `limit` characters.
///
/// Truncation happens on item boundaries; only a first item that exceeds the
/// limit on its own is cut (at a character boundary).
pub fn join_limited<I, S>(items: I, limit: usize) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    const SEPARATOR: &str = ", ";

    let mut joined = String::new();
    let mut joined_len = 0usize;

    for item in items {
        let item = item.as_ref();
        let item_len = item.chars().count();

        if joined.is_empty() {
            if item_len > limit {
                joined.extend(item.chars().take(limit));
                joined.push_str(ELLIPSIS);
                return joined;
            }
            joined.push_str(item);
            joined_len = item_len;
        } else {
            if joined_len + SEPARATOR.len() + item_len > limit {
                joined.push_str(SEPARATOR);
                joined.push_str(ELLIPSIS);
                return joined;
            }
            joined.push_str(SEPARATOR);
            joined.push_str(item);
            joined_len += SEPARATOR.len() + item_len;
        }
    }
    joined
}

/// Hex rendering of raw bytes, limited to `limit` bytes.
#[must_use]
pub fn bytes_to_string(bytes: &[u8], limit: usize) -> String {
    let shown = &bytes[..bytes.len().min(limit)];
    let mut out = shown
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":");

    if shown.len() < bytes.len() {
        out.push_str(ELLIPSIS);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_within_limit() {
        assert_eq!(join_limited(["a", "b", "c"], 100), "a, b, c");
        assert_eq!(join_limited(Vec::<String>::new(), 10), "");
    }

    #[test]
    fn test_join_truncates_on_item_boundary() {
        let joined = join_limited(["alpha", "beta", "gamma"], 12);
        assert_eq!(joined, "alpha, beta, ...");

        // deterministic
        assert_eq!(joined, join_limited(["alpha", "beta", "gamma"], 12));
    }

    #[test]
    fn test_join_cuts_oversized_first_item() {
        assert_eq!(join_limited(["äöüäöü", "x"], 3), "äöü...");
    }

    #[test]
    fn test_bytes_to_string() {
        assert_eq!(bytes_to_string(&[0x01, 0xab], 8), "01:AB");
        assert_eq!(bytes_to_string(&[1, 2, 3, 4], 2), "01:02...");
    }

    #[test]
    fn test_render_tree() {
        let mut root = Attributes::new("ext", Some("v".to_string()));
        root.add("child", None).add("leaf", Some("x".to_string()));

        assert_eq!(root.render(), "ext: v\n  child\n    leaf: x\n");
        assert!(root.child("child").is_some());
    }
}
