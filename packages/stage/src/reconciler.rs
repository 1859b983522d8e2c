//! In-place reconciliation of a rendered live view against a fresh render.
//!
//! Children are matched by position, except that a fresh node never takes
//! the slot of a side-effect or preserved node: it is inserted in front of
//! it instead. Each matched pair gets a policy that decides between
//! skipping, updating in place and replacing. Every change is
//! also recorded as a path-addressed `StagePatch` so a host can replay it.

use crate::vdom::StageNode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Elements with side effects on (re)insertion
const SIDE_EFFECT_TAGS: &[&str] = &["script", "style", "link"];

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Attribute carrying the tree uid of a rendered element
    pub stage_node_id_attr: String,
    /// Attribute marking host-injected nodes that must survive every sync
    pub preserve_attr: String,
}

/// Per-pair reconciliation decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Host-injected node; never touched or discarded
    Preserve,
    /// Replaced only when its serialized form differs; never discarded
    NeverDiscard,
    /// Last edit targeted this node; always refreshed
    ForceUpdate,
    /// Custom element; renders itself, so never updated in place
    Opaque,
    SkipIfEqual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StagePatch {
    ReplaceNode { path: Vec<usize>, node: StageNode },
    UpdateAttributes { path: Vec<usize>, attributes: IndexMap<String, String> },
    UpdateText { path: Vec<usize>, content: String },
    InsertNode { path: Vec<usize>, node: StageNode },
    RemoveNode { path: Vec<usize> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub updated: usize,
    pub replaced: usize,
    pub inserted: usize,
    pub removed: usize,
    pub preserved: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub patches: Vec<StagePatch>,
    pub stats: ReconcileStats,
}

/// Pick the policy for a matched pair
pub fn classify(
    existing: &StageNode,
    fresh: &StageNode,
    hints: &HashSet<String>,
    options: &ReconcileOptions,
) -> Policy {
    if existing.attr(&options.preserve_attr).is_some() {
        return Policy::Preserve;
    }
    if let Some(tag) = existing.tag() {
        if SIDE_EFFECT_TAGS.contains(&tag) && fresh.tag() == Some(tag) {
            return Policy::NeverDiscard;
        }
    }
    let hinted = |node: &StageNode| {
        node.attr(&options.stage_node_id_attr)
            .map(|id| hints.contains(id))
            .unwrap_or(false)
    };
    if hinted(existing) || hinted(fresh) {
        return Policy::ForceUpdate;
    }
    if fresh.tag().map(|t| t.contains('-')).unwrap_or(false) && existing.tag() == fresh.tag() {
        return Policy::Opaque;
    }
    Policy::SkipIfEqual
}

/// Update `existing` in place to match `fresh`.
///
/// `existing` is treated as the document root: it is never replaced, and
/// fresh root attributes are merged over the ones already present.
pub fn reconcile(
    existing: &mut StageNode,
    fresh: &StageNode,
    hints: &HashSet<String>,
    options: &ReconcileOptions,
) -> ReconcileReport {
    let mut reconciler = Reconciler {
        hints,
        options,
        report: ReconcileReport::default(),
    };
    reconciler.root(existing, fresh);
    debug!(
        patches = reconciler.report.patches.len(),
        updated = reconciler.report.stats.updated,
        replaced = reconciler.report.stats.replaced,
        "reconciled live view"
    );
    reconciler.report
}

struct Reconciler<'a> {
    hints: &'a HashSet<String>,
    options: &'a ReconcileOptions,
    report: ReconcileReport,
}

impl<'a> Reconciler<'a> {
    fn root(&mut self, existing: &mut StageNode, fresh: &StageNode) {
        let (
            StageNode::Element {
                attributes,
                children,
                ..
            },
            StageNode::Element {
                attributes: fresh_attributes,
                children: fresh_children,
                ..
            },
        ) = (existing, fresh)
        else {
            return;
        };

        let mut merged = attributes.clone();
        for (key, value) in fresh_attributes {
            merged.insert(key.clone(), value.clone());
        }
        if merged != *attributes {
            *attributes = merged;
            self.report.patches.push(StagePatch::UpdateAttributes {
                path: Vec::new(),
                attributes: attributes.clone(),
            });
            self.report.stats.updated += 1;
        }
        self.children(children, fresh_children, &[]);
    }

    fn node(&mut self, existing: &mut StageNode, fresh: &StageNode, path: Vec<usize>) {
        match classify(existing, fresh, self.hints, self.options) {
            Policy::Preserve => self.report.stats.preserved += 1,
            Policy::NeverDiscard => {
                if self.same_content(existing, fresh) {
                    self.sync_attributes(existing, fresh, path);
                } else {
                    self.replace(existing, fresh, path);
                }
            }
            Policy::Opaque => self.report.stats.skipped += 1,
            Policy::ForceUpdate => self.update(existing, fresh, path),
            Policy::SkipIfEqual => {
                if existing == fresh && !self.contains_hint(fresh) {
                    self.report.stats.skipped += 1;
                } else {
                    self.update(existing, fresh, path);
                }
            }
        }
    }

    fn update(&mut self, existing: &mut StageNode, fresh: &StageNode, path: Vec<usize>) {
        let replace = match (&mut *existing, fresh) {
            (
                StageNode::Element {
                    tag,
                    attributes,
                    children,
                },
                StageNode::Element {
                    tag: fresh_tag,
                    attributes: fresh_attributes,
                    children: fresh_children,
                },
            ) if tag == fresh_tag => {
                if attributes != fresh_attributes {
                    *attributes = fresh_attributes.clone();
                    self.report.patches.push(StagePatch::UpdateAttributes {
                        path: path.clone(),
                        attributes: attributes.clone(),
                    });
                }
                self.report.stats.updated += 1;
                self.children(children, fresh_children, &path);
                false
            }
            (StageNode::Text { content }, StageNode::Text { content: fresh_content })
            | (StageNode::Comment { content }, StageNode::Comment { content: fresh_content }) => {
                if content != fresh_content {
                    *content = fresh_content.clone();
                    self.report.patches.push(StagePatch::UpdateText {
                        path: path.clone(),
                        content: content.clone(),
                    });
                }
                self.report.stats.updated += 1;
                false
            }
            _ => true,
        };
        if replace {
            self.replace(existing, fresh, path);
        }
    }

    /// Equal apart from the stage-node-id, which shifts with every insertion
    /// before the node
    fn same_content(&self, existing: &StageNode, fresh: &StageNode) -> bool {
        let id = self.options.stage_node_id_attr.as_str();
        let stripped = |attributes: &IndexMap<String, String>| {
            attributes
                .iter()
                .filter(|(key, _)| key.as_str() != id)
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<IndexMap<_, _>>()
        };
        match (existing, fresh) {
            (
                StageNode::Element {
                    tag,
                    attributes,
                    children,
                },
                StageNode::Element {
                    tag: fresh_tag,
                    attributes: fresh_attributes,
                    children: fresh_children,
                },
            ) => {
                tag == fresh_tag
                    && children == fresh_children
                    && stripped(attributes) == stripped(fresh_attributes)
            }
            _ => existing == fresh,
        }
    }

    /// Copy attributes over without touching children
    fn sync_attributes(&mut self, existing: &mut StageNode, fresh: &StageNode, path: Vec<usize>) {
        let (
            StageNode::Element { attributes, .. },
            StageNode::Element {
                attributes: fresh_attributes,
                ..
            },
        ) = (existing, fresh)
        else {
            self.report.stats.skipped += 1;
            return;
        };
        if attributes == fresh_attributes {
            self.report.stats.skipped += 1;
            return;
        }
        *attributes = fresh_attributes.clone();
        self.report.patches.push(StagePatch::UpdateAttributes {
            path,
            attributes: attributes.clone(),
        });
        self.report.stats.updated += 1;
    }

    fn replace(&mut self, existing: &mut StageNode, fresh: &StageNode, path: Vec<usize>) {
        *existing = fresh.clone();
        self.report.patches.push(StagePatch::ReplaceNode {
            path,
            node: fresh.clone(),
        });
        self.report.stats.replaced += 1;
    }

    fn children(&mut self, existing: &mut Vec<StageNode>, fresh: &[StageNode], path: &[usize]) {
        let child_path = |index: usize| {
            let mut child = path.to_vec();
            child.push(index);
            child
        };

        let mut cursor = 0;
        for fresh_child in fresh {
            // Preserved nodes keep their slot and are not matched.
            while cursor < existing.len() && self.is_preserved(&existing[cursor]) {
                self.report.stats.preserved += 1;
                cursor += 1;
            }
            let blocked = existing.get(cursor).map_or(false, |current| {
                self.is_side_effect(current) && current.tag() != fresh_child.tag()
            });
            if cursor < existing.len() && !blocked {
                self.node(&mut existing[cursor], fresh_child, child_path(cursor));
            } else {
                existing.insert(cursor, fresh_child.clone());
                self.report.patches.push(StagePatch::InsertNode {
                    path: child_path(cursor),
                    node: fresh_child.clone(),
                });
                self.report.stats.inserted += 1;
            }
            cursor += 1;
        }

        // Leftovers, last first so earlier paths stay valid for replay.
        let mut index = existing.len();
        while index > cursor {
            index -= 1;
            let leftover = &existing[index];
            let keep = self.is_preserved(leftover) || self.is_side_effect(leftover);
            if keep {
                self.report.stats.preserved += 1;
                continue;
            }
            existing.remove(index);
            self.report.patches.push(StagePatch::RemoveNode {
                path: child_path(index),
            });
            self.report.stats.removed += 1;
        }
    }

    fn contains_hint(&self, node: &StageNode) -> bool {
        if self.hints.is_empty() {
            return false;
        }
        node.children().iter().any(|child| {
            child
                .attr(&self.options.stage_node_id_attr)
                .map(|id| self.hints.contains(id))
                .unwrap_or(false)
                || self.contains_hint(child)
        })
    }

    fn is_side_effect(&self, node: &StageNode) -> bool {
        node.tag()
            .map(|tag| SIDE_EFFECT_TAGS.contains(&tag))
            .unwrap_or(false)
    }

    fn is_preserved(&self, node: &StageNode) -> bool {
        node.attr(&self.options.preserve_attr).is_some()
    }
}
