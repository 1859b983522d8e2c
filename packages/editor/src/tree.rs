//! # Node Tree Store
//!
//! Holds the valid-tree projection and the ordering helpers every structural
//! action relies on. The projection is rebuilt from scratch after each parse;
//! nothing here mutates a tree across parse generations.

use serde::Serialize;
use std::collections::HashSet;
use std::ops::Deref;
use tessera_parser::{Node, NodeTree, NodeUid};

/// Raw tree filtered to valid nodes reachable through valid ancestors
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidNodeTree(NodeTree);

impl Deref for ValidNodeTree {
    type Target = NodeTree;

    fn deref(&self) -> &NodeTree {
        &self.0
    }
}

impl ValidNodeTree {
    pub fn into_inner(self) -> NodeTree {
        self.0
    }
}

/// Project a raw tree onto its valid nodes.
///
/// Uids are collected breadth-first (descending only through valid nodes) and
/// processed in reverse, so every child is settled before its parent.
pub fn project(raw: &NodeTree) -> ValidNodeTree {
    let order = raw.bfs_uids_where(raw.root_uid(), |node| node.data.valid);

    let mut kept: HashSet<NodeUid> = HashSet::with_capacity(order.len());
    let mut nodes = Vec::with_capacity(order.len());
    for uid in order.into_iter().rev() {
        let Some(node) = raw.get(uid) else { continue };
        if !node.data.valid {
            continue;
        }
        let mut node = node.clone();
        node.children.retain(|child| kept.contains(child));
        node.is_entity = node.children.is_empty();
        kept.insert(uid);
        nodes.push(node);
    }

    ValidNodeTree(NodeTree::from_nodes(raw.root_uid(), nodes))
}

/// Drop uids that are missing, duplicated, or nested inside another uid of
/// the same set. Order of first appearance is kept.
pub fn top_level(tree: &NodeTree, uids: &[NodeUid]) -> Vec<NodeUid> {
    let set: HashSet<NodeUid> = uids.iter().copied().filter(|u| tree.contains(*u)).collect();
    let mut seen = HashSet::new();
    uids.iter()
        .copied()
        .filter(|uid| set.contains(uid))
        .filter(|uid| !tree.ancestors(*uid).iter().any(|a| set.contains(a)))
        .filter(|uid| seen.insert(*uid))
        .collect()
}

fn span_key(tree: &NodeTree, uid: NodeUid) -> (usize, usize) {
    tree.get(uid)
        .map(|n| {
            let span = n.location().span;
            (span.start_offset, span.end_offset)
        })
        .unwrap_or((usize::MAX, usize::MAX))
}

/// Ascending by start position
pub fn sort_by_start(tree: &NodeTree, uids: &mut [NodeUid]) {
    uids.sort_by_key(|uid| span_key(tree, *uid).0);
}

/// Descending by end position, the order multi-node edits are applied in
pub fn sort_by_end_desc(tree: &NodeTree, uids: &mut [NodeUid]) {
    uids.sort_by_key(|uid| std::cmp::Reverse(span_key(tree, *uid).1));
}

/// Index of `uid` among its parent's children
pub fn child_index(tree: &NodeTree, uid: NodeUid) -> Option<usize> {
    let parent = tree.get(tree.get(uid)?.parent_uid?)?;
    parent.children.iter().position(|c| *c == uid)
}

pub fn parent<'t>(tree: &'t NodeTree, uid: NodeUid) -> Option<&'t Node> {
    tree.get(tree.get(uid)?.parent_uid?)
}

/// Node to select when a document is opened: the first element inside
/// `body`, else the first element of the document.
pub fn initial_selection(tree: &ValidNodeTree) -> Option<NodeUid> {
    let root = tree.root_uid();
    let order: Vec<NodeUid> = tree
        .document_order(root)
        .into_iter()
        .filter(|uid| *uid != root)
        .collect();
    let in_body = order.iter().copied().find(|uid| {
        parent(tree, *uid)
            .map(|p| p.display_name == "body")
            .unwrap_or(false)
    });
    in_body.or_else(|| order.first().copied())
}

/// Valid ancestors that must be expanded to reveal `selection`, in document
/// order, root excluded.
pub fn ancestors_to_expand(tree: &ValidNodeTree, selection: &[NodeUid]) -> Vec<NodeUid> {
    let mut wanted = HashSet::new();
    for uid in selection {
        for ancestor in tree.ancestors(*uid) {
            if ancestor != tree.root_uid() {
                wanted.insert(ancestor);
            }
        }
    }
    tree.document_order(tree.root_uid())
        .into_iter()
        .filter(|uid| wanted.contains(uid))
        .collect()
}
