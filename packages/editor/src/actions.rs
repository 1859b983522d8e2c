//! # Structural Actions
//!
//! Tree-level intents (add, move, group, ...) translated into text edits.
//!
//! ## Design Principles
//!
//! 1. **Text is the source of truth**: an action reads the current text and
//!    the valid tree parsed from it, and produces edits against that text.
//! 2. **Validated, then applied**: every rejection happens before an edit is
//!    produced, so a failed action never touches the buffer.
//! 3. **Offset safe**: edits of one batch are addressed against the same
//!    text and applied from the end of the document toward the start.
//! 4. **Path-addressed follow-up**: the selection for the next generation is
//!    expressed as `unique_node_path`s, never as uids.
//!
//! ## Composite actions
//!
//! `move`, cut-paste and `group` need the tree of an intermediate text (after
//! removing the moved nodes). They re-parse that text, re-locate their anchor
//! by its shifted path and hand back one minimal edit covering the whole
//! change.

use crate::clipboard::{display_name, ClipboardKind, ClipboardPanel, ClipboardRecord};
use crate::config::EditorConfig;
use crate::errors::ActionError;
use crate::format::{check_markup, sibling_separator};
use crate::selection::{PathShifts, SelectionIntent};
use crate::text_buffer::{apply_edits, TextEdit, TextRange};
use crate::tree::{
    child_index, parent, project, sort_by_end_desc, sort_by_start, top_level, ValidNodeTree,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tessera_parser::ast::{child_path, parent_path};
use tessera_parser::{
    fragment_tags, parse, start_tag, validate_start_tag, LineIndex, Node, NodeKind, NodeTree,
    NodeUid, ReferenceData, COMMENT_TAG,
};
use tracing::debug;

pub type ActionResult<T> = Result<T, ActionError>;

/// Where pasted markup lands relative to the target node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PastePosition {
    Before,
    After,
    /// Right after the target's opening tag
    Inside,
}

/// Structural actions that change the text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeAction {
    /// Insert a new element built from the reference table
    Add { tag: String },

    Duplicate,

    Remove,

    /// Wrap the selection in a new container
    Group,

    /// Replace each selected container by its content
    Ungroup,

    /// Drop the selection onto `target`. `position` is the child slot when
    /// `is_between` is set.
    Move {
        target: NodeUid,
        is_between: bool,
        position: usize,
    },

    /// Paste `content`, the pending cut or the clipboard, in that order
    Paste {
        target: NodeUid,
        position: PastePosition,
        content: Option<String>,
    },

    /// Turn the selected elements into `tag`
    Rename { tag: String },

    UpdateSettings {
        target: NodeUid,
        attributes: IndexMap<String, String>,
    },

    /// Replace an element's inner content
    UpdateText { target: NodeUid, content: String },
}

impl NodeAction {
    pub fn name(&self) -> &'static str {
        match self {
            NodeAction::Add { .. } => "add",
            NodeAction::Duplicate => "duplicate",
            NodeAction::Remove => "remove",
            NodeAction::Group => "group",
            NodeAction::Ungroup => "ungroup",
            NodeAction::Move { .. } => "move",
            NodeAction::Paste { .. } => "paste",
            NodeAction::Rename { .. } => "rename",
            NodeAction::UpdateSettings { .. } => "updateSettings",
            NodeAction::UpdateText { .. } => "updateText",
        }
    }
}

/// Payload of a paste
#[derive(Debug, Clone, Copy)]
pub enum PasteSource<'p> {
    Text(&'p str),
    /// Nodes marked by a cut, removed from their old place by the paste
    Cut(&'p ClipboardRecord),
}

/// Inputs every action reads
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    pub text: &'a str,
    pub tree: &'a ValidNodeTree,
    pub selection: &'a [NodeUid],
}

/// Result of a text-changing action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    /// Full text after the edits
    pub text: String,
    /// Edits addressed against the text the action read
    pub edits: Vec<TextEdit>,
    /// What to select once `text` has been parsed
    pub selection: SelectionIntent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    pub text: String,
    pub display_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsOutcome {
    pub is_success: bool,
    /// New attributes on success, the unchanged ones on failure
    pub settings: IndexMap<String, String>,
    pub outcome: Option<ActionOutcome>,
}

/// Structural edit engine
pub struct NodeActions<'a> {
    reference: &'a ReferenceData,
    config: &'a EditorConfig,
}

impl<'a> NodeActions<'a> {
    pub fn new(reference: &'a ReferenceData, config: &'a EditorConfig) -> Self {
        Self { reference, config }
    }

    /// Insert `tag` as the last child of the earliest selected node, or right
    /// after it when the node cannot hold `tag`.
    pub fn add(&self, ctx: ActionContext<'_>, tag: &str) -> ActionResult<ActionOutcome> {
        let mut selected = self.targets(ctx)?;
        sort_by_start(ctx.tree, &mut selected);
        let node = self.node(ctx.tree, selected[0])?;

        let template = self.reference.template(tag);
        check_markup(&template, self.reference)?;
        let is_comment = tag == COMMENT_TAG;
        let tag_names = if is_comment {
            Vec::new()
        } else {
            vec![tag.to_string()]
        };

        let location = node.location();
        if let Some(end_tag) = location
            .end_tag
            .filter(|_| self.reference.can_contain(Some(node.display_name.as_str()), tag))
        {
            let edit = TextEdit::insert_before(&end_tag, template);
            let selection = if is_comment {
                SelectionIntent::paths([node.unique_node_path.clone()])
            } else {
                SelectionIntent::Children {
                    parent_path: node.unique_node_path.clone(),
                    first_ordinal: node.children.len(),
                    tag_names,
                }
            };
            debug!(tag, parent = %node.display_name, "adding as last child");
            return Ok(finish(ctx.text, vec![edit], selection));
        }

        let parent_tag = self.parent_tag(ctx.tree, node);
        if self.config.is_protected(&node.display_name)
            || !self.reference.can_contain(parent_tag, tag)
        {
            return Err(ActionError::NotPermitted {
                tag: tag.to_string(),
                parent: node.display_name.clone(),
            });
        }

        let separator = sibling_separator(ctx.text, &location.span);
        let edit = TextEdit::insert_after(&location.span, format!("{}{}", separator, template));
        let selection = match (is_comment, parent_path(&node.unique_node_path), node.ordinal()) {
            (false, Some(parent), Some(ordinal)) => SelectionIntent::Children {
                parent_path: parent.to_string(),
                first_ordinal: ordinal + 1,
                tag_names,
            },
            _ => SelectionIntent::paths([node.unique_node_path.clone()]),
        };
        debug!(tag, sibling = %node.display_name, "adding after selected node");
        Ok(finish(ctx.text, vec![edit], selection))
    }

    /// Insert a copy of every selected node right after itself
    pub fn duplicate(&self, ctx: ActionContext<'_>) -> ActionResult<ActionOutcome> {
        let selected = self.targets(ctx)?;
        self.guard_protected(ctx.tree, &selected)?;

        let mut ordered = selected.clone();
        sort_by_end_desc(ctx.tree, &mut ordered);

        let mut edits = Vec::with_capacity(ordered.len());
        let mut shifts = PathShifts::new();
        for uid in &ordered {
            let node = self.node(ctx.tree, *uid)?;
            let span = node.location().span;
            let copy = &ctx.text[span.offsets()];
            let separator = sibling_separator(ctx.text, &span);
            edits.push(TextEdit::insert_after(&span, format!("{}{}", separator, copy)));
            if let (Some(parent), Some(ordinal)) =
                (parent_path(&node.unique_node_path), node.ordinal())
            {
                shifts.inserted(parent, ordinal + 1, 1);
            }
        }

        let selection = self.shifted_selection(ctx.tree, &selected, &shifts);
        Ok(finish(ctx.text, edits, selection))
    }

    /// Source of the selected nodes in document order
    pub fn copy(&self, ctx: ActionContext<'_>) -> ActionResult<CopyOutcome> {
        let mut selected = self.targets(ctx)?;
        sort_by_start(ctx.tree, &mut selected);
        Ok(CopyOutcome {
            text: self.concat_source(ctx.text, ctx.tree, &selected)?,
            display_names: self.display_names(ctx.tree, &selected),
        })
    }

    /// Mark the selection as cut. The text is untouched until a paste.
    pub fn cut(&self, ctx: ActionContext<'_>) -> ActionResult<ClipboardRecord> {
        self.guard_protected(ctx.tree, &self.targets(ctx)?)?;
        self.record(ctx, ClipboardKind::Cut)
    }

    /// Clipboard record describing the selection
    pub fn record(&self, ctx: ActionContext<'_>, kind: ClipboardKind) -> ActionResult<ClipboardRecord> {
        let mut selected = self.targets(ctx)?;
        sort_by_start(ctx.tree, &mut selected);
        let paths = selected
            .iter()
            .map(|uid| self.node(ctx.tree, *uid).map(|n| n.unique_node_path.clone()))
            .collect::<ActionResult<Vec<_>>>()?;
        Ok(ClipboardRecord {
            panel: ClipboardPanel::Node,
            kind,
            display_names: self.display_names(ctx.tree, &selected),
            uids: selected,
            paths,
        })
    }

    pub fn paste(
        &self,
        ctx: ActionContext<'_>,
        target: NodeUid,
        position: PastePosition,
        source: PasteSource<'_>,
    ) -> ActionResult<ActionOutcome> {
        let target_node = self.node(ctx.tree, target)?;
        if target_node.is_root() {
            return Err(ActionError::InvalidTarget("the document root".to_string()));
        }
        if position != PastePosition::Inside && self.config.is_protected(&target_node.display_name)
        {
            return Err(ActionError::ProtectedNode(target_node.display_name.clone()));
        }

        match source {
            PasteSource::Text(payload) => {
                if payload.trim().is_empty() {
                    return Err(ActionError::NothingToPaste);
                }
                let tags = fragment_tags(payload, self.reference)?;
                self.check_placement(ctx.tree, target_node, position, &tags)?;
                let (edits, selection) =
                    self.insert_fragment(ctx.text, target_node, position, payload, &tags)?;
                Ok(finish(ctx.text, edits, selection))
            }
            PasteSource::Cut(record) => {
                // A recorded path may point at another node once the text moved on.
                let cut = record
                    .paths
                    .iter()
                    .zip(&record.display_names)
                    .map(|(path, name)| {
                        ctx.tree
                            .find_by_path(path)
                            .filter(|n| display_name(&n.display_name) == *name)
                            .map(|n| n.uid)
                            .ok_or_else(|| ActionError::Unresolved(path.clone()))
                    })
                    .collect::<ActionResult<Vec<_>>>()?;
                let cut = top_level(ctx.tree, &cut);
                if cut.is_empty() {
                    return Err(ActionError::NothingToPaste);
                }
                self.guard_protected(ctx.tree, &cut)?;
                if cut.contains(&target) || cut.iter().any(|c| ctx.tree.is_ancestor(*c, target)) {
                    return Err(ActionError::MoveIntoSelf);
                }
                self.relocate(ctx, &cut, target, position)
            }
        }
    }

    /// Delete every selected node
    pub fn remove(&self, ctx: ActionContext<'_>) -> ActionResult<ActionOutcome> {
        let selected = self.targets(ctx)?;
        self.guard_protected(ctx.tree, &selected)?;

        let mut ordered = selected.clone();
        sort_by_end_desc(ctx.tree, &mut ordered);

        let mut edits = Vec::with_capacity(ordered.len());
        let mut shifts = PathShifts::new();
        for uid in &ordered {
            let node = self.node(ctx.tree, *uid)?;
            edits.push(TextEdit::delete(&node.location().span));
            shifts.removed(node.unique_node_path.clone());
        }

        let selection = self.selection_after_remove(ctx.tree, &selected, &shifts);
        Ok(finish(ctx.text, edits, selection))
    }

    /// Move the selection to a drop position on `target`
    pub fn move_nodes(
        &self,
        ctx: ActionContext<'_>,
        target: NodeUid,
        is_between: bool,
        position: usize,
    ) -> ActionResult<ActionOutcome> {
        let selected = self.targets(ctx)?;
        if selected.contains(&target) || selected.iter().any(|s| ctx.tree.is_ancestor(*s, target))
        {
            return Err(ActionError::MoveIntoSelf);
        }
        self.guard_protected(ctx.tree, &selected)?;

        let target_node = self.node(ctx.tree, target)?;
        let (anchor, placement) = move_anchor(target_node, is_between, position, &selected);
        let anchor_node = self.node(ctx.tree, anchor)?;
        if placement == PastePosition::After && self.config.is_protected(&anchor_node.display_name)
        {
            return Err(ActionError::ProtectedNode(anchor_node.display_name.clone()));
        }
        debug!(
            anchor = %anchor_node.unique_node_path,
            ?placement,
            count = selected.len(),
            "moving nodes"
        );
        self.relocate(ctx, &selected, anchor, placement)
    }

    /// Wrap the selection in a new `group_tag` element placed where the
    /// earliest selected node was.
    pub fn group(&self, ctx: ActionContext<'_>) -> ActionResult<ActionOutcome> {
        let mut selected = self.targets(ctx)?;
        self.guard_protected(ctx.tree, &selected)?;
        sort_by_start(ctx.tree, &mut selected);

        let group_tag = &self.config.group_tag;
        let first = self.node(ctx.tree, selected[0])?;
        let parent_tag = self.parent_tag(ctx.tree, first);
        if !self.reference.can_contain(parent_tag, group_tag) {
            return Err(ActionError::NotPermitted {
                tag: group_tag.clone(),
                parent: parent_tag.unwrap_or_default().to_string(),
            });
        }

        let content = self.concat_source(ctx.text, ctx.tree, &selected)?;
        let wrapper = format!("<{}>{}</{}>", group_tag, content, group_tag);
        check_markup(&wrapper, self.reference)?;

        let mut edits = vec![TextEdit::replace(&first.location().span, wrapper)];
        for uid in &selected[1..] {
            edits.push(TextEdit::delete(&self.node(ctx.tree, *uid)?.location().span));
        }

        let selection = match (parent_path(&first.unique_node_path), first.ordinal()) {
            (Some(parent), Some(ordinal)) => SelectionIntent::Children {
                parent_path: parent.to_string(),
                first_ordinal: ordinal,
                tag_names: vec![group_tag.clone()],
            },
            _ => SelectionIntent::Clear,
        };
        Ok(finish(ctx.text, edits, selection))
    }

    /// Replace each selected container with its own content
    pub fn ungroup(&self, ctx: ActionContext<'_>) -> ActionResult<ActionOutcome> {
        let selected = self.targets(ctx)?;
        self.guard_protected(ctx.tree, &selected)?;

        let mut ordered = selected;
        sort_by_end_desc(ctx.tree, &mut ordered);

        let mut edits = Vec::with_capacity(ordered.len());
        let mut shifts = PathShifts::new();
        // (shift count when recorded, paths of the unwrapped children)
        let mut unwrapped: Vec<(usize, Vec<String>)> = Vec::new();

        for uid in &ordered {
            let node = self.node(ctx.tree, *uid)?;
            let location = node.location();
            let Some(inner) = location.inner_offsets() else {
                return Err(ActionError::NotAContainer(node.display_name.clone()));
            };

            let parent_tag = self.parent_tag(ctx.tree, node);
            let child_tags = self.child_tags(ctx.tree, node);
            for tag in &child_tags {
                if !self.reference.can_contain(parent_tag, tag) {
                    return Err(ActionError::NotPermitted {
                        tag: tag.clone(),
                        parent: parent_tag.unwrap_or_default().to_string(),
                    });
                }
            }

            edits.push(TextEdit::replace(&location.span, ctx.text[inner].trim()));

            let (Some(parent), Some(ordinal)) = (parent_path(&node.unique_node_path), node.ordinal())
            else {
                continue;
            };
            shifts.removed(node.unique_node_path.clone());
            shifts.inserted(parent, ordinal, child_tags.len());
            let paths = (0..child_tags.len())
                .map(|i| child_path(parent, ordinal + i))
                .collect();
            unwrapped.push((shifts.len(), paths));
        }

        let paths = unwrapped
            .into_iter()
            .flat_map(|(recorded, paths)| {
                let shifts = &shifts;
                paths
                    .into_iter()
                    .filter_map(move |path| shifts.apply_from(recorded, &path))
            })
            .collect::<Vec<_>>();
        Ok(finish(ctx.text, edits, SelectionIntent::paths(paths)))
    }

    /// Rebuild the opening tag of `target` with `attributes`. Invalid markup
    /// is reported through `is_success` and leaves the text alone.
    pub fn update_settings(
        &self,
        ctx: ActionContext<'_>,
        target: NodeUid,
        attributes: IndexMap<String, String>,
    ) -> ActionResult<SettingsOutcome> {
        let node = self.node(ctx.tree, target)?;
        let NodeKind::Element { self_closing } = node.data.kind else {
            return Err(ActionError::NotAnElement);
        };
        let Some(start) = node.location().start_tag else {
            return Err(ActionError::NotAnElement);
        };

        let rebuilt = start_tag(&node.display_name, &attributes, self_closing);
        if let Err(err) = validate_start_tag(&rebuilt) {
            debug!(error = %err, tag = %rebuilt, "rejected attribute update");
            return Ok(SettingsOutcome {
                is_success: false,
                settings: node.data.attribs.clone(),
                outcome: None,
            });
        }

        let selection = SelectionIntent::paths([node.unique_node_path.clone()]);
        let outcome = finish(ctx.text, vec![TextEdit::replace(&start, rebuilt)], selection);
        Ok(SettingsOutcome {
            is_success: true,
            settings: attributes,
            outcome: Some(outcome),
        })
    }

    /// Attributes of an element in source order
    pub fn element_settings(
        &self,
        tree: &NodeTree,
        target: NodeUid,
    ) -> ActionResult<IndexMap<String, String>> {
        let node = self.node(tree, target)?;
        if !node.is_element() {
            return Err(ActionError::NotAnElement);
        }
        Ok(node.data.attribs.clone())
    }

    /// Turn every selected element into `tag`, keeping attributes and content
    pub fn rename(&self, ctx: ActionContext<'_>, tag: &str) -> ActionResult<ActionOutcome> {
        let tag = tag.trim().to_ascii_lowercase();
        validate_start_tag(&format!("<{}>", tag))
            .map_err(|err| ActionError::Validation(err.to_string()))?;

        let selected = self.targets(ctx)?;
        self.guard_protected(ctx.tree, &selected)?;
        let becomes_void = self.reference.is_void(&tag);
        let index = LineIndex::new(ctx.text);

        let mut ordered = selected.clone();
        sort_by_end_desc(ctx.tree, &mut ordered);
        let mut edits = Vec::new();
        for uid in &ordered {
            let node = self.node(ctx.tree, *uid)?;
            let location = node.location();
            let Some(start) = location.start_tag else {
                return Err(ActionError::NotAnElement);
            };

            let parent_tag = self.parent_tag(ctx.tree, node);
            if !self.reference.can_contain(parent_tag, &tag) {
                return Err(ActionError::NotPermitted {
                    tag: tag.clone(),
                    parent: parent_tag.unwrap_or_default().to_string(),
                });
            }
            for child in self.child_tags(ctx.tree, node) {
                if !self.reference.can_contain(Some(tag.as_str()), &child) {
                    return Err(ActionError::NotPermitted {
                        tag: child,
                        parent: tag.clone(),
                    });
                }
            }
            let has_content = location
                .inner_offsets()
                .map(|inner| !ctx.text[inner].trim().is_empty())
                .unwrap_or(false);
            if becomes_void && has_content {
                return Err(ActionError::NotAContainer(tag.clone()));
            }

            // Edits of one node are pushed back to front.
            let self_closing = matches!(node.data.kind, NodeKind::Element { self_closing: true });
            match location.end_tag {
                Some(end) if becomes_void => edits.push(TextEdit::delete(&end)),
                Some(end) => edits.push(TextEdit::replace(&end, format!("</{}>", tag))),
                None if !becomes_void && !self_closing => {
                    edits.push(TextEdit::insert_after(&start, format!("</{}>", tag)))
                }
                None => {}
            }
            let name_start = start.start_offset + 1;
            let name = index.span(name_start..name_start + node.display_name.len());
            edits.push(TextEdit::replace(&name, tag.clone()));
        }

        let selection = SelectionIntent::paths(
            selected
                .iter()
                .filter_map(|uid| ctx.tree.get(*uid))
                .map(|n| n.unique_node_path.clone()),
        );
        Ok(finish(ctx.text, edits, selection))
    }

    /// Replace the inner content of `target`. Nodes without a closing tag are
    /// replaced as a whole.
    pub fn update_text(
        &self,
        ctx: ActionContext<'_>,
        target: NodeUid,
        content: &str,
    ) -> ActionResult<ActionOutcome> {
        let node = self.node(ctx.tree, target)?;
        if node.is_root() {
            return Err(ActionError::InvalidTarget("the document root".to_string()));
        }
        check_markup(content, self.reference)?;

        let location = node.location();
        let range = match location.inner_offsets() {
            Some(inner) => LineIndex::new(ctx.text).span(inner),
            None => location.span,
        };
        let selection = SelectionIntent::paths([node.unique_node_path.clone()]);
        Ok(finish(ctx.text, vec![TextEdit::replace(&range, content)], selection))
    }

    // Shared steps

    /// Remove `nodes`, re-locate `anchor` in the resulting text and insert
    /// the removed source there.
    fn relocate(
        &self,
        ctx: ActionContext<'_>,
        nodes: &[NodeUid],
        anchor: NodeUid,
        placement: PastePosition,
    ) -> ActionResult<ActionOutcome> {
        let mut ascending = nodes.to_vec();
        sort_by_start(ctx.tree, &mut ascending);
        let payload = self.concat_source(ctx.text, ctx.tree, &ascending)?;
        let tags = fragment_tags(&payload, self.reference)?;

        let anchor_node = self.node(ctx.tree, anchor)?;
        self.check_placement(ctx.tree, anchor_node, placement, &tags)?;

        let mut ordered = nodes.to_vec();
        sort_by_end_desc(ctx.tree, &mut ordered);
        let mut removals = Vec::with_capacity(ordered.len());
        let mut shifts = PathShifts::new();
        for uid in &ordered {
            let node = self.node(ctx.tree, *uid)?;
            removals.push(TextEdit::delete(&node.location().span));
            shifts.removed(node.unique_node_path.clone());
        }
        let removed_text = apply_edits(ctx.text, &removals);

        let anchor_path = shifts
            .apply(&anchor_node.unique_node_path)
            .ok_or_else(|| ActionError::Unresolved(anchor_node.unique_node_path.clone()))?;
        let tree = self.reparse(&removed_text)?;
        let relocated = tree
            .find_by_path(&anchor_path)
            .filter(|n| n.display_name == anchor_node.display_name)
            .ok_or_else(|| ActionError::Unresolved(anchor_path.clone()))?;

        let (edits, selection) =
            self.insert_fragment(&removed_text, relocated, placement, &payload, &tags)?;
        let final_text = apply_edits(&removed_text, &edits);
        Ok(composite(ctx.text, final_text, selection))
    }

    /// Edits inserting `fragment` at `position` of `target`, and the
    /// selection of its top-level elements
    fn insert_fragment(
        &self,
        text: &str,
        target: &Node,
        position: PastePosition,
        fragment: &str,
        tags: &[String],
    ) -> ActionResult<(Vec<TextEdit>, SelectionIntent)> {
        let location = target.location();
        let span = location.span;
        let (edit, parent, first_ordinal) = match position {
            PastePosition::Before => {
                let separator = sibling_separator(text, &span);
                let edit = TextEdit::insert_before(&span, format!("{}{}", fragment, separator));
                (edit, parent_path(&target.unique_node_path), target.ordinal())
            }
            PastePosition::After => {
                let separator = sibling_separator(text, &span);
                let edit = TextEdit::insert_after(&span, format!("{}{}", separator, fragment));
                (
                    edit,
                    parent_path(&target.unique_node_path),
                    target.ordinal().map(|o| o + 1),
                )
            }
            PastePosition::Inside => {
                let (Some(start), Some(_)) = (location.start_tag, location.end_tag) else {
                    return Err(ActionError::NotAContainer(target.display_name.clone()));
                };
                let edit = TextEdit {
                    range: TextRange::at(start.end()),
                    text: fragment.to_string(),
                };
                (edit, Some(target.unique_node_path.as_str()), Some(0))
            }
        };

        let selection = match (parent, first_ordinal) {
            (Some(parent), Some(first_ordinal)) if !tags.is_empty() => SelectionIntent::Children {
                parent_path: parent.to_string(),
                first_ordinal,
                tag_names: tags.to_vec(),
            },
            _ => SelectionIntent::paths([target.unique_node_path.clone()]),
        };
        Ok((vec![edit], selection))
    }

    fn check_placement(
        &self,
        tree: &NodeTree,
        target: &Node,
        position: PastePosition,
        tags: &[String],
    ) -> ActionResult<()> {
        let parent_tag = match position {
            PastePosition::Inside => {
                if target.location().end_tag.is_none() {
                    return Err(ActionError::NotAContainer(target.display_name.clone()));
                }
                Some(target.display_name.as_str())
            }
            PastePosition::Before | PastePosition::After => self.parent_tag(tree, target),
        };
        for tag in tags {
            if !self.reference.can_contain(parent_tag, tag) {
                return Err(ActionError::NotPermitted {
                    tag: tag.clone(),
                    parent: parent_tag.unwrap_or_default().to_string(),
                });
            }
        }
        Ok(())
    }

    fn selection_after_remove(
        &self,
        tree: &NodeTree,
        removed: &[NodeUid],
        shifts: &PathShifts,
    ) -> SelectionIntent {
        let mut ascending = removed.to_vec();
        sort_by_start(tree, &mut ascending);
        let Some(first) = ascending.first().and_then(|uid| tree.get(*uid)) else {
            return SelectionIntent::Clear;
        };
        let Some(parent_node) = parent(tree, first.uid) else {
            return SelectionIntent::Clear;
        };
        let siblings = &parent_node.children;
        let index = child_index(tree, first.uid).unwrap_or(0);
        let kept = |uid: &&NodeUid| !removed.contains(uid);

        let candidate = siblings[..index]
            .iter()
            .rev()
            .find(kept)
            .and_then(|uid| tree.get(*uid))
            .or_else(|| (!parent_node.is_root()).then_some(parent_node))
            .or_else(|| {
                siblings[index + 1..]
                    .iter()
                    .find(kept)
                    .and_then(|uid| tree.get(*uid))
            });

        match candidate.and_then(|node| shifts.apply(&node.unique_node_path)) {
            Some(path) => SelectionIntent::paths([path]),
            None => SelectionIntent::Clear,
        }
    }

    fn shifted_selection(
        &self,
        tree: &NodeTree,
        uids: &[NodeUid],
        shifts: &PathShifts,
    ) -> SelectionIntent {
        SelectionIntent::paths(
            uids.iter()
                .filter_map(|uid| tree.get(*uid))
                .filter_map(|n| shifts.apply(&n.unique_node_path)),
        )
    }

    // Lookups and guards

    /// The selection as top-level, non-root nodes
    fn targets(&self, ctx: ActionContext<'_>) -> ActionResult<Vec<NodeUid>> {
        if ctx.selection.contains(&ctx.tree.root_uid()) {
            return Err(ActionError::InvalidTarget("the document root".to_string()));
        }
        let selected = top_level(ctx.tree, ctx.selection);
        if selected.is_empty() {
            return Err(match ctx.selection.first() {
                Some(uid) => ActionError::NodeNotFound(*uid),
                None => ActionError::NoSelection,
            });
        }
        Ok(selected)
    }

    fn node<'t>(&self, tree: &'t NodeTree, uid: NodeUid) -> ActionResult<&'t Node> {
        tree.get(uid).ok_or(ActionError::NodeNotFound(uid))
    }

    fn guard_protected(&self, tree: &NodeTree, uids: &[NodeUid]) -> ActionResult<()> {
        for uid in uids {
            let node = self.node(tree, *uid)?;
            if self.config.is_protected(&node.display_name) {
                return Err(ActionError::ProtectedNode(node.display_name.clone()));
            }
        }
        Ok(())
    }

    /// Tag of the parent element, `None` when the parent is the document
    fn parent_tag<'t>(&self, tree: &'t NodeTree, node: &Node) -> Option<&'t str> {
        parent(tree, node.uid)
            .filter(|p| !p.is_root())
            .map(|p| p.display_name.as_str())
    }

    fn child_tags(&self, tree: &NodeTree, node: &Node) -> Vec<String> {
        node.children
            .iter()
            .filter_map(|uid| tree.get(*uid))
            .filter(|n| n.is_element())
            .map(|n| n.display_name.clone())
            .collect()
    }

    fn concat_source(&self, text: &str, tree: &NodeTree, uids: &[NodeUid]) -> ActionResult<String> {
        let mut out = String::new();
        for uid in uids {
            out.push_str(&text[self.node(tree, *uid)?.location().span.offsets()]);
        }
        Ok(out)
    }

    fn display_names(&self, tree: &NodeTree, uids: &[NodeUid]) -> Vec<String> {
        uids.iter()
            .filter_map(|uid| tree.get(*uid))
            .map(|n| display_name(&n.display_name))
            .collect()
    }

    fn reparse(&self, text: &str) -> ActionResult<ValidNodeTree> {
        Ok(project(&parse(text, self.reference)?))
    }
}

/// Anchor node and placement for a drop on `target`
fn move_anchor(
    target: &Node,
    is_between: bool,
    position: usize,
    selected: &[NodeUid],
) -> (NodeUid, PastePosition) {
    let inside = (target.uid, PastePosition::Inside);
    if is_between && position == 0 {
        return inside;
    }
    let (Some(slot), Some(last)) = (position.checked_sub(1), target.children.len().checked_sub(1))
    else {
        return inside;
    };
    // Selected siblings are about to be removed; anchor on the nearest one
    // that stays.
    target.children[..=slot.min(last)]
        .iter()
        .rev()
        .find(|uid| !selected.contains(uid))
        .map(|uid| (*uid, PastePosition::After))
        .unwrap_or(inside)
}

fn finish(text: &str, edits: Vec<TextEdit>, selection: SelectionIntent) -> ActionOutcome {
    ActionOutcome {
        text: apply_edits(text, &edits),
        edits,
        selection,
    }
}

fn composite(old: &str, new: String, selection: SelectionIntent) -> ActionOutcome {
    ActionOutcome {
        edits: TextEdit::diff(old, &new).into_iter().collect(),
        text: new,
        selection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn valid(source: &str) -> ValidNodeTree {
        project(&parse(source, &ReferenceData::html()).unwrap())
    }

    fn uid(tree: &NodeTree, path: &str) -> NodeUid {
        tree.find_by_path(path).unwrap().uid
    }

    #[test]
    fn test_move_anchor() {
        let tree = valid("<ul><li>a</li><li>b</li><li>c</li></ul>");
        let ul = tree.find_by_path("0_0").unwrap();
        let (a, b) = (uid(&tree, "0_0_0"), uid(&tree, "0_0_1"));

        assert_eq!(move_anchor(ul, true, 0, &[]), (ul.uid, PastePosition::Inside));
        assert_eq!(move_anchor(ul, true, 2, &[]), (b, PastePosition::After));
        assert_eq!(move_anchor(ul, true, 2, &[b]), (a, PastePosition::After));
        assert_eq!(move_anchor(ul, true, 1, &[a]), (ul.uid, PastePosition::Inside));
        assert_eq!(
            move_anchor(ul, true, 9, &[]),
            (uid(&tree, "0_0_2"), PastePosition::After)
        );
        assert_eq!(move_anchor(ul, false, 0, &[]), (ul.uid, PastePosition::Inside));
    }

    #[test]
    fn test_cut_record_must_match_node_name() {
        let source = "<div><b>new</b><p>cut me</p></div>";
        let tree = valid(source);
        let config = EditorConfig::default();
        let reference = ReferenceData::html();
        let actions = NodeActions::new(&reference, &config);
        let ctx = ActionContext {
            text: source,
            tree: &tree,
            selection: &[],
        };
        // Recorded when <p> was the first child
        let record = ClipboardRecord {
            panel: ClipboardPanel::Node,
            kind: ClipboardKind::Cut,
            uids: Vec::new(),
            paths: vec!["0_0_0".to_string()],
            display_names: vec![display_name("p")],
        };
        let target = uid(&tree, "0_0");
        assert_eq!(
            actions.paste(ctx, target, PastePosition::Inside, PasteSource::Cut(&record)),
            Err(ActionError::Unresolved("0_0_0".to_string()))
        );
    }

    #[test]
    fn test_rename_swaps_both_tags() {
        let source = "<div><b class=\"x\">hi</b></div>";
        let tree = valid(source);
        let config = EditorConfig::default();
        let reference = ReferenceData::html();
        let actions = NodeActions::new(&reference, &config);
        let selection = [uid(&tree, "0_0_0")];
        let ctx = ActionContext {
            text: source,
            tree: &tree,
            selection: &selection,
        };
        let outcome = actions.rename(ctx, "strong").unwrap();
        assert_eq!(outcome.text, "<div><strong class=\"x\">hi</strong></div>");
    }
}
