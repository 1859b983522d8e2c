//! Node tree to live view rendering

use crate::vdom::StageNode;
use tessera_parser::{NodeKind, NodeTree, NodeUid};

/// Render a parsed tree into a live view rooted at an `html` element.
///
/// Every element gets `stage_attr="<uid>"` so the view can be mapped back to
/// tree nodes. The doctype is dropped. When the document has no top-level
/// `html` element, one is synthesized around the top-level nodes.
pub fn render_tree(tree: &NodeTree, stage_attr: &str) -> StageNode {
    let root = tree.root();
    let html = root
        .children
        .iter()
        .filter_map(|uid| tree.get(*uid))
        .find(|node| node.is_element() && node.display_name == "html");

    match html {
        Some(html) => render_node(tree, html.uid, stage_attr)
            .unwrap_or_else(|| StageNode::element("html")),
        None => StageNode::element("html").with_children(
            root.children
                .iter()
                .filter_map(|uid| render_node(tree, *uid, stage_attr))
                .collect(),
        ),
    }
}

fn render_node(tree: &NodeTree, uid: NodeUid, stage_attr: &str) -> Option<StageNode> {
    let node = tree.get(uid)?;
    match &node.data.kind {
        NodeKind::Element { .. } => {
            let mut element = StageNode::element(node.display_name.clone());
            for (key, value) in &node.data.attribs {
                element = element.with_attr(key.clone(), value.clone());
            }
            let children = node
                .children
                .iter()
                .filter_map(|child| render_node(tree, *child, stage_attr))
                .collect();
            Some(
                element
                    .with_attr(stage_attr, uid.to_string())
                    .with_children(children),
            )
        }
        NodeKind::Text { content } => Some(StageNode::text(content.clone())),
        NodeKind::Comment { content } => Some(StageNode::comment(content.clone())),
        NodeKind::Document | NodeKind::Doctype { .. } => None,
    }
}
