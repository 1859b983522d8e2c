//! # Selection Resolver
//!
//! Uids do not survive a re-parse, so actions describe the selection they
//! want in the *next* generation as a `SelectionIntent` made of
//! `unique_node_path`s. Paths taken before an edit are carried through the
//! edit with `PathShifts`, which replays the sibling insertions and removals
//! the edit performed.
//!
//! A path that no longer exists resolves to an empty selection, never to an
//! error.

use crate::tree::ValidNodeTree;
use serde::{Deserialize, Serialize};
use tessera_parser::ast::{child_path, parent_path, PATH_SEPARATOR};
use tessera_parser::NodeUid;
use tracing::warn;

/// Selection requested for the next parse generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SelectionIntent {
    Clear,
    /// Select the nodes at these paths
    Paths { paths: Vec<String> },
    /// Select the children of `parent_path` starting at `first_ordinal`
    /// whose tag names match `tag_names`, in order
    Children {
        parent_path: String,
        first_ordinal: usize,
        tag_names: Vec<String>,
    },
}

impl SelectionIntent {
    pub fn paths(paths: impl IntoIterator<Item = String>) -> Self {
        SelectionIntent::Paths {
            paths: paths.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathShift {
    /// The node at this path (and its subtree) was removed
    Removed(String),
    /// `count` element children were inserted under `parent` at `at`
    Inserted {
        parent: String,
        at: usize,
        count: usize,
    },
}

/// Sibling insertions and removals performed by an edit, in the order they
/// happened. Each shift is expressed in the coordinates of its own moment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathShifts {
    shifts: Vec<PathShift>,
}

impl PathShifts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn removed(&mut self, path: impl Into<String>) {
        self.shifts.push(PathShift::Removed(path.into()));
    }

    pub fn inserted(&mut self, parent: impl Into<String>, at: usize, count: usize) {
        if count > 0 {
            self.shifts.push(PathShift::Inserted {
                parent: parent.into(),
                at,
                count,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.shifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    /// Where `path` ends up after every shift, or `None` if it was removed.
    pub fn apply(&self, path: &str) -> Option<String> {
        self.apply_from(0, path)
    }

    /// Like `apply`, for a path expressed in the coordinates right after the
    /// first `start` shifts.
    pub fn apply_from(&self, start: usize, path: &str) -> Option<String> {
        let mut current = path.to_string();
        for shift in self.shifts.iter().skip(start) {
            current = match shift {
                PathShift::Removed(removed) => {
                    if is_same_or_inside(&current, removed) {
                        return None;
                    }
                    let parent = parent_path(removed)?;
                    let ordinal = tessera_parser::ast::path_ordinal(removed)?;
                    shift_segment(&current, parent, ordinal + 1, -1)
                }
                PathShift::Inserted { parent, at, count } => {
                    shift_segment(&current, parent, *at, *count as isize)
                }
            };
        }
        Some(current)
    }
}

fn is_same_or_inside(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .map(|rest| rest.starts_with(PATH_SEPARATOR))
            .unwrap_or(false)
}

/// Add `delta` to the segment right below `parent` when it is at least `from`
fn shift_segment(path: &str, parent: &str, from: usize, delta: isize) -> String {
    let Some(rest) = path
        .strip_prefix(parent)
        .and_then(|rest| rest.strip_prefix(PATH_SEPARATOR))
    else {
        return path.to_string();
    };
    let (segment, tail) = match rest.find(PATH_SEPARATOR) {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, ""),
    };
    match segment.parse::<usize>() {
        Ok(ordinal) if ordinal >= from => {
            let shifted = (ordinal as isize + delta).max(0) as usize;
            format!("{}{}", child_path(parent, shifted), tail)
        }
        _ => path.to_string(),
    }
}

/// Resolve an intent against a freshly projected tree
pub fn resolve_selection(tree: &ValidNodeTree, intent: &SelectionIntent) -> Vec<NodeUid> {
    match intent {
        SelectionIntent::Clear => Vec::new(),
        SelectionIntent::Paths { paths } => paths
            .iter()
            .filter_map(|path| {
                let found = tree.find_by_path(path).map(|n| n.uid);
                if found.is_none() {
                    warn!(path = %path, "selected path vanished after re-parse");
                }
                found
            })
            .collect(),
        SelectionIntent::Children {
            parent_path,
            first_ordinal,
            tag_names,
        } => {
            let Some(parent) = tree.find_by_path(parent_path) else {
                warn!(path = %parent_path, "anchor path vanished after re-parse");
                return Vec::new();
            };
            parent
                .children
                .iter()
                .skip(*first_ordinal)
                .zip(tag_names)
                .filter_map(|(uid, tag)| tree.get(*uid).filter(|n| &n.display_name == tag))
                .map(|n| n.uid)
                .collect()
        }
    }
}

/// Paths of the given uids in `tree`
pub fn paths_of(tree: &ValidNodeTree, uids: &[NodeUid]) -> Vec<String> {
    uids.iter()
        .filter_map(|uid| tree.get(*uid))
        .map(|n| n.unique_node_path.clone())
        .collect()
}
