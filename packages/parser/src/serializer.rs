//! Markup serialization helpers.
//!
//! The editor never re-serializes whole trees; edits splice source text. What
//! gets generated is limited to opening tags and the renderable copy of the
//! document with node ids injected.

use crate::ast::NodeTree;
use indexmap::IndexMap;

/// Serialize attributes as they appear after a tag name (` a="1" b`).
/// Empty values are written as bare boolean attributes.
pub fn serialize_attributes(attributes: &IndexMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in attributes {
        out.push(' ');
        out.push_str(key);
        if !value.is_empty() {
            out.push_str("=\"");
            out.push_str(&escape_attribute(value));
            out.push('"');
        }
    }
    out
}

pub fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Opening tag text for an element
pub fn start_tag(name: &str, attributes: &IndexMap<String, String>, self_closing: bool) -> String {
    let close = if self_closing { " />" } else { ">" };
    format!("<{}{}{}", name, serialize_attributes(attributes), close)
}

/// Copy of `source` with ` attr="uid"` injected right after every element's
/// tag name, so rendered nodes can be mapped back to tree nodes.
pub fn renderable_content(source: &str, tree: &NodeTree, attr: &str) -> String {
    let mut insertions: Vec<(usize, String)> = tree
        .iter()
        .filter(|node| node.is_element())
        .filter_map(|node| {
            let start_tag = node.location().start_tag?;
            let at = start_tag.start_offset + 1 + node.display_name.len();
            Some((at, format!(" {}=\"{}\"", attr, node.uid)))
        })
        .collect();
    insertions.sort_by_key(|(at, _)| *at);

    let mut out = String::with_capacity(source.len() + insertions.len() * (attr.len() + 8));
    let mut cursor = 0;
    for (at, text) in insertions {
        out.push_str(&source[cursor..at]);
        out.push_str(&text);
        cursor = at;
    }
    out.push_str(&source[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::reference::ReferenceData;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_start_tag() {
        let mut attributes = IndexMap::new();
        attributes.insert("class".to_string(), "a \"b\"".to_string());
        attributes.insert("hidden".to_string(), String::new());
        assert_eq!(
            start_tag("div", &attributes, false),
            "<div class=\"a &quot;b&quot;\" hidden>"
        );
        assert_eq!(start_tag("br", &IndexMap::new(), true), "<br />");
    }

    #[test]
    fn test_renderable_content() {
        let source = "<!DOCTYPE html><div class=\"x\"><BR></div>";
        let tree = parse(source, &ReferenceData::html()).unwrap();
        assert_eq!(
            renderable_content(source, &tree, "data-id"),
            "<!DOCTYPE html><div data-id=\"2\" class=\"x\"><BR data-id=\"3\"></div>"
        );
    }
}
