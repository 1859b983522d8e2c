use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tessera_parser::serializer::escape_attribute;

/// Void elements never get a closing tag when serialized
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Node of the rendered live view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StageNode {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        children: Vec<StageNode>,
    },

    Text { content: String },

    Comment { content: String },
}

impl StageNode {
    pub fn element(tag: impl Into<String>) -> Self {
        StageNode::Element {
            tag: tag.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        StageNode::Text {
            content: content.into(),
        }
    }

    pub fn comment(content: impl Into<String>) -> Self {
        StageNode::Comment {
            content: content.into(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let StageNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_child(mut self, child: StageNode) -> Self {
        if let StageNode::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, new_children: Vec<StageNode>) -> Self {
        if let StageNode::Element {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            StageNode::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            StageNode::Element { attributes, .. } => attributes.get(key).map(String::as_str),
            _ => None,
        }
    }

    pub fn children(&self) -> &[StageNode] {
        match self {
            StageNode::Element { children, .. } => children,
            _ => &[],
        }
    }

    /// Depth-first search for the element carrying `attr="value"`
    pub fn find_by_attr(&self, attr: &str, value: &str) -> Option<&StageNode> {
        if self.attr(attr) == Some(value) {
            return Some(self);
        }
        self.children()
            .iter()
            .find_map(|child| child.find_by_attr(attr, value))
    }

    /// Outer HTML of this node
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            StageNode::Element {
                tag,
                attributes,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in attributes {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_TAGS.contains(&tag.as_str()) && children.is_empty() {
                    return;
                }
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            StageNode::Text { content } => out.push_str(content),
            StageNode::Comment { content } => {
                out.push_str("<!--");
                out.push_str(content);
                out.push_str("-->");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_html() {
        let node = StageNode::element("p")
            .with_attr("class", "a\"b")
            .with_child(StageNode::text("hi"))
            .with_child(StageNode::element("br"))
            .with_child(StageNode::comment(" c "));
        assert_eq!(node.to_html(), "<p class=\"a&quot;b\">hi<br><!-- c --></p>");
    }

    #[test]
    fn test_find_by_attr() {
        let node = StageNode::element("div")
            .with_child(StageNode::element("span").with_attr("data-id", "4"));
        assert_eq!(node.find_by_attr("data-id", "4").and_then(StageNode::tag), Some("span"));
        assert!(node.find_by_attr("data-id", "5").is_none());
    }
}
