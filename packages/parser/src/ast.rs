use crate::location::SourceCodeLocation;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Node identifier, unique within one parse.
///
/// Uids are assigned in document (pre-)order, so parsing the same text twice
/// yields the same uids. Nothing else about them is stable across edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeUid(pub u32);

impl NodeUid {
    /// The document node
    pub const ROOT: NodeUid = NodeUid(0);
}

impl fmt::Display for NodeUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Path of the document node
pub const ROOT_PATH: &str = "0";

/// Separator between segments of a `unique_node_path`
pub const PATH_SEPARATOR: char = '_';

/// Display names of the synthetic (non-element) nodes
pub const DOCUMENT_NAME: &str = "#document";
pub const TEXT_NAME: &str = "#text";
pub const COMMENT_NAME: &str = "#comment";
pub const DOCTYPE_NAME: &str = "!doctype";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    Document,
    Doctype { value: String },
    Element { self_closing: bool },
    Text { content: String },
    Comment { content: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub kind: NodeKind,
    /// Eligible for the valid-tree projection
    pub valid: bool,
    pub attribs: IndexMap<String, String>,
    pub source_code_location: SourceCodeLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub uid: NodeUid,
    /// `None` only for the document node
    pub parent_uid: Option<NodeUid>,
    pub children: Vec<NodeUid>,
    pub display_name: String,
    pub is_entity: bool,
    pub unique_node_path: String,
    pub data: NodeData,
}

impl Node {
    pub fn is_element(&self) -> bool {
        matches!(self.data.kind, NodeKind::Element { .. })
    }

    pub fn is_root(&self) -> bool {
        self.parent_uid.is_none()
    }

    pub fn location(&self) -> &SourceCodeLocation {
        &self.data.source_code_location
    }

    /// Ordinal of this node among its parent's children of the same class,
    /// read back from the last path segment.
    pub fn ordinal(&self) -> Option<usize> {
        path_ordinal(&self.unique_node_path)
    }
}

/// Last segment of an element path, as an index
pub fn path_ordinal(path: &str) -> Option<usize> {
    let (_, last) = path.rsplit_once(PATH_SEPARATOR)?;
    last.parse().ok()
}

/// Path of the parent, or `None` for the root path
pub fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once(PATH_SEPARATOR).map(|(parent, _)| parent)
}

pub fn child_path(parent: &str, ordinal: usize) -> String {
    format!("{}{}{}", parent, PATH_SEPARATOR, ordinal)
}

/// Mapping of uid to node for one parse generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTree {
    nodes: HashMap<NodeUid, Node>,
    root: NodeUid,
}

impl NodeTree {
    pub fn new(root: Node) -> Self {
        let uid = root.uid;
        let mut nodes = HashMap::new();
        nodes.insert(uid, root);
        Self { nodes, root: uid }
    }

    /// Build a tree from nodes that already link to each other. `root` must
    /// be among them.
    pub fn from_nodes(root: NodeUid, nodes: impl IntoIterator<Item = Node>) -> Self {
        let nodes = nodes.into_iter().map(|n| (n.uid, n)).collect();
        Self { nodes, root }
    }

    pub fn root_uid(&self) -> NodeUid {
        self.root
    }

    pub fn root(&self) -> &Node {
        &self.nodes[&self.root]
    }

    pub fn get(&self, uid: NodeUid) -> Option<&Node> {
        self.nodes.get(&uid)
    }

    pub fn get_mut(&mut self, uid: NodeUid) -> Option<&mut Node> {
        self.nodes.get_mut(&uid)
    }

    pub fn contains(&self, uid: NodeUid) -> bool {
        self.nodes.contains_key(&uid)
    }

    pub fn insert(&mut self, node: Node) {
        self.nodes.insert(node.uid, node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Uids reachable from `from` in breadth-first order, `from` included
    pub fn bfs_uids(&self, from: NodeUid) -> Vec<NodeUid> {
        self.bfs_uids_where(from, |_| true)
    }

    /// Breadth-first walk that only descends into nodes accepted by `descend`
    pub fn bfs_uids_where(&self, from: NodeUid, descend: impl Fn(&Node) -> bool) -> Vec<NodeUid> {
        let mut uids = Vec::new();
        let mut queue = VecDeque::new();
        if self.contains(from) {
            queue.push_back(from);
        }
        while let Some(uid) = queue.pop_front() {
            uids.push(uid);
            if let Some(node) = self.get(uid) {
                if uid == from || descend(node) {
                    queue.extend(node.children.iter().copied().filter(|c| self.contains(*c)));
                }
            }
        }
        uids
    }

    /// Uids of `from` and its descendants in document order
    pub fn document_order(&self, from: NodeUid) -> Vec<NodeUid> {
        let mut uids = Vec::new();
        let mut stack = vec![from];
        while let Some(uid) = stack.pop() {
            let Some(node) = self.get(uid) else { continue };
            uids.push(uid);
            stack.extend(node.children.iter().rev().copied());
        }
        uids
    }

    pub fn find_by_path(&self, path: &str) -> Option<&Node> {
        self.nodes.values().find(|n| n.unique_node_path == path)
    }

    /// Ancestors of `uid`, nearest first, root last
    pub fn ancestors(&self, uid: NodeUid) -> Vec<NodeUid> {
        let mut ancestors = Vec::new();
        let mut current = self.get(uid).and_then(|n| n.parent_uid);
        while let Some(parent) = current {
            ancestors.push(parent);
            current = self.get(parent).and_then(|n| n.parent_uid);
        }
        ancestors
    }

    pub fn is_ancestor(&self, ancestor: NodeUid, uid: NodeUid) -> bool {
        self.ancestors(uid).contains(&ancestor)
    }
}
