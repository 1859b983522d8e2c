//! # Editor Session
//!
//! Coordinates one open document: the text buffer, both trees of the
//! current parse generation, the selection, the clipboard record, history
//! and the live view.
//!
//! Every text change runs the same pipeline:
//!
//! ```text
//! text → parse → raw tree → valid tree → live view → selection → history
//! ```
//!
//! Writes made by the session itself are remembered as the synced text, so
//! the host echoing them back through `on_buffer_changed` is a no-op.

use crate::actions::{
    ActionContext, ActionOutcome, CopyOutcome, NodeAction, NodeActions, PastePosition,
    PasteSource, SettingsOutcome,
};
use crate::clipboard::{Clipboard, ClipboardKind, ClipboardRecord, MemoryClipboard};
use crate::config::EditorConfig;
use crate::errors::{ActionError, EditorError};
use crate::history::{History, HistoryEvent};
use crate::persistence::Persistence;
use crate::selection::{paths_of, resolve_selection, SelectionIntent};
use crate::text_buffer::{MemoryBuffer, TextBuffer};
use crate::tree::{ancestors_to_expand, initial_selection, project, ValidNodeTree};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tessera_parser::{
    parse_document, NodeTree, NodeUid, ParseOptions, ParsedDocument, ReferenceData,
};
use tessera_stage::{LiveView, ReconcileReport};
use tracing::{debug, info, instrument, warn};

/// Who produced a text change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// Typed into the buffer by the user
    User,
    /// Written by a structural action
    Programmatic,
    /// Restored from history, never recorded again
    Replay,
}

/// Outcome of one pass of the sync pipeline
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub reconcile: ReconcileReport,
    pub selection: Vec<NodeUid>,
    pub committed: bool,
}

/// Trees of the current parse generation
#[derive(Debug, Clone)]
struct Generation {
    /// Text the trees were parsed from
    text: String,
    raw: NodeTree,
    valid: ValidNodeTree,
    renderable_content: String,
}

pub struct EditorSession {
    config: EditorConfig,
    options: ParseOptions,
    buffer: Option<Box<dyn TextBuffer>>,
    file: Option<PathBuf>,
    generation: Option<Generation>,
    selection: Vec<NodeUid>,
    clipboard: Box<dyn Clipboard>,
    clipboard_record: Option<ClipboardRecord>,
    history: History,
    live_view: LiveView,
    persistence: Option<Box<dyn Persistence>>,

    /// Last text that went through the pipeline
    synced_text: Option<String>,
}

impl EditorSession {
    pub fn new(config: EditorConfig, reference: ReferenceData) -> Self {
        let options = config.parse_options(reference);
        let history = History::new(config.history_limit);
        let live_view = LiveView::new(config.reconcile_options());
        Self {
            config,
            options,
            buffer: None,
            file: None,
            generation: None,
            selection: Vec::new(),
            clipboard: Box::new(MemoryClipboard::new()),
            clipboard_record: None,
            history,
            live_view,
            persistence: None,
            synced_text: None,
        }
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Receive the renderable content of every synced document
    pub fn with_persistence(mut self, persistence: Box<dyn Persistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn attach_buffer(&mut self, buffer: Box<dyn TextBuffer>) {
        self.buffer = Some(buffer);
        self.synced_text = None;
    }

    /// Open `text` as the document at `path`.
    ///
    /// The live view is rebuilt from scratch and history restarts from this
    /// text. A document that fails to parse leaves the session untouched.
    #[instrument(skip(self, path, text), fields(path = %path.as_ref().display()))]
    pub fn open(&mut self, path: impl AsRef<Path>, text: &str) -> Result<(), EditorError> {
        let parsed = parse_document(text, &self.options)?;
        let valid = project(&parsed.tree);

        let buffer = self
            .buffer
            .get_or_insert_with(|| Box::new(MemoryBuffer::default()) as Box<dyn TextBuffer>);
        buffer.set_value(text);

        self.file = Some(path.as_ref().to_path_buf());
        self.clipboard_record = self.clipboard_record.take().filter(|r| !r.is_pending_cut());
        self.selection = initial_selection(&valid).into_iter().collect();
        self.live_view.load(&parsed.tree);
        self.history
            .reset(HistoryEvent::new(text, paths_of(&valid, &self.selection)));
        self.synced_text = Some(text.to_string());
        self.generation = Some(Generation {
            text: text.to_string(),
            raw: parsed.tree,
            valid,
            renderable_content: parsed.renderable_content,
        });
        self.persist_preview();
        info!(nodes = self.valid_tree().map(|t| t.len()).unwrap_or(0), "opened document");
        Ok(())
    }

    /// Run the pipeline for text the host changed in the buffer. Echoes of
    /// the session's own writes are ignored.
    pub fn on_buffer_changed(&mut self) -> Result<Option<SyncReport>, EditorError> {
        let text = self.buffer()?.value();
        if self.synced_text.as_deref() == Some(text.as_str()) {
            return Ok(None);
        }
        let keep = SelectionIntent::paths(self.selected_paths());
        self.sync(text, ChangeOrigin::User, keep).map(Some)
    }

    /// Apply a structural action. With `skip_update` the outcome is computed
    /// and returned without touching the buffer.
    #[instrument(skip(self, action), fields(action = action.name()))]
    pub fn apply(
        &mut self,
        action: NodeAction,
        skip_update: bool,
    ) -> Result<ActionOutcome, EditorError> {
        let text = self.current_text()?;

        let mut converted_cut = None;
        let outcome = {
            let tree = &self.generation()?.valid;
            let actions = NodeActions::new(&self.options.reference, &self.config);
            let ctx = ActionContext {
                text: &text,
                tree,
                selection: &self.selection,
            };
            match &action {
                NodeAction::Add { tag } => actions.add(ctx, tag)?,
                NodeAction::Duplicate => actions.duplicate(ctx)?,
                NodeAction::Remove => actions.remove(ctx)?,
                NodeAction::Group => actions.group(ctx)?,
                NodeAction::Ungroup => actions.ungroup(ctx)?,
                NodeAction::Move {
                    target,
                    is_between,
                    position,
                } => actions.move_nodes(ctx, *target, *is_between, *position)?,
                NodeAction::Paste {
                    target,
                    position,
                    content,
                } => {
                    let (outcome, payload) =
                        self.paste_with(&actions, ctx, *target, *position, content.as_deref())?;
                    converted_cut = payload;
                    outcome
                }
                NodeAction::Rename { tag } => actions.rename(ctx, tag)?,
                NodeAction::UpdateSettings { target, attributes } => {
                    let settings = actions.update_settings(ctx, *target, attributes.clone())?;
                    settings.outcome.ok_or_else(|| {
                        ActionError::Validation(format!("invalid attributes for node {}", target))
                    })?
                }
                NodeAction::UpdateText { target, content } => {
                    actions.update_text(ctx, *target, content)?
                }
            }
        };

        if skip_update {
            return Ok(outcome);
        }
        let parsed = parse_document(&outcome.text, &self.options)?;

        if let Some(payload) = converted_cut {
            // The cut is spent; pasting again inserts a copy.
            if let Some(record) = self.clipboard_record.as_mut() {
                record.kind = ClipboardKind::Copy;
            }
            if let Err(err) = self.clipboard.write(&payload) {
                warn!(error = %err, "could not write moved source to clipboard");
            }
        }
        self.commit(&outcome, parsed)?;
        Ok(outcome)
    }

    /// Paste with the usual source precedence: explicit content, then a
    /// pending cut, then the clipboard. Also returns the moved source when a
    /// pending cut was consumed.
    fn paste_with(
        &self,
        actions: &NodeActions<'_>,
        ctx: ActionContext<'_>,
        target: NodeUid,
        position: PastePosition,
        content: Option<&str>,
    ) -> Result<(ActionOutcome, Option<String>), ActionError> {
        if let Some(content) = content {
            let outcome = actions.paste(ctx, target, position, PasteSource::Text(content))?;
            return Ok((outcome, None));
        }
        if let Some(record) = self.clipboard_record.as_ref().filter(|r| r.is_pending_cut()) {
            let cut_uids: Vec<NodeUid> = record
                .paths
                .iter()
                .filter_map(|path| ctx.tree.find_by_path(path).map(|n| n.uid))
                .collect();
            let payload = actions
                .copy(ActionContext {
                    selection: &cut_uids,
                    ..ctx
                })?
                .text;
            let outcome = actions.paste(ctx, target, position, PasteSource::Cut(record))?;
            return Ok((outcome, Some(payload)));
        }
        let clipboard = self.clipboard.read()?;
        let outcome = actions.paste(ctx, target, position, PasteSource::Text(&clipboard))?;
        Ok((outcome, None))
    }

    pub fn paste(
        &mut self,
        target: NodeUid,
        position: PastePosition,
        content: Option<String>,
    ) -> Result<ActionOutcome, EditorError> {
        self.apply(
            NodeAction::Paste {
                target,
                position,
                content,
            },
            false,
        )
    }

    /// Copy the selection to the clipboard
    pub fn copy(&mut self) -> Result<CopyOutcome, EditorError> {
        let text = self.current_text()?;
        let tree = &self.generation()?.valid;
        let actions = NodeActions::new(&self.options.reference, &self.config);
        let ctx = ActionContext {
            text: &text,
            tree,
            selection: &self.selection,
        };
        let copied = actions.copy(ctx)?;
        let record = actions.record(ctx, ClipboardKind::Copy)?;

        self.clipboard.write(&copied.text).map_err(ActionError::from)?;
        self.clipboard_record = Some(record);
        debug!(names = ?copied.display_names, "copied");
        Ok(copied)
    }

    /// Mark the selection as cut. Nothing is removed until the next paste.
    pub fn cut(&mut self) -> Result<ClipboardRecord, EditorError> {
        let text = self.current_text()?;
        let tree = &self.generation()?.valid;
        let actions = NodeActions::new(&self.options.reference, &self.config);
        let ctx = ActionContext {
            text: &text,
            tree,
            selection: &self.selection,
        };
        let record = actions.cut(ctx)?;
        let copied = actions.copy(ctx)?;
        if let Err(err) = self.clipboard.write(&copied.text) {
            warn!(error = %err, "could not write cut source to clipboard");
        }
        self.clipboard_record = Some(record.clone());
        debug!(names = ?record.display_names, "cut pending");
        Ok(record)
    }

    /// Rebuild the opening tag of `target`. Invalid attributes are reported
    /// through `is_success` with the previous settings.
    pub fn update_settings(
        &mut self,
        target: NodeUid,
        attributes: IndexMap<String, String>,
        skip_update: bool,
    ) -> Result<SettingsOutcome, EditorError> {
        let text = self.current_text()?;
        let settings = {
            let tree = &self.generation()?.valid;
            let actions = NodeActions::new(&self.options.reference, &self.config);
            let ctx = ActionContext {
                text: &text,
                tree,
                selection: &self.selection,
            };
            actions.update_settings(ctx, target, attributes)?
        };
        if !skip_update {
            if let Some(outcome) = &settings.outcome {
                let parsed = parse_document(&outcome.text, &self.options)?;
                self.commit(outcome, parsed)?;
            }
        }
        Ok(settings)
    }

    pub fn element_settings(&self, target: NodeUid) -> Result<IndexMap<String, String>, EditorError> {
        let tree = &self.generation()?.valid;
        let actions = NodeActions::new(&self.options.reference, &self.config);
        Ok(actions.element_settings(tree, target)?)
    }

    /// Restore the previous history state. Returns false at the origin.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        let text = self.buffer()?.value();
        let selection = self.selected_paths();
        let Some(event) = self.history.undo(&text, &selection).cloned() else {
            return Ok(false);
        };
        self.replay(event)?;
        Ok(true)
    }

    /// Restore the next history state. Returns false at the latest state.
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        let Some(event) = self.history.redo().cloned() else {
            return Ok(false);
        };
        self.replay(event)?;
        Ok(true)
    }

    fn replay(&mut self, event: HistoryEvent) -> Result<(), EditorError> {
        self.buffer_mut()?.set_value(&event.text);
        self.sync(
            event.text,
            ChangeOrigin::Replay,
            SelectionIntent::paths(event.selection),
        )?;
        Ok(())
    }

    /// Write an action's edits to the buffer and sync the result. `parsed`
    /// is the already validated parse of `outcome.text`.
    fn commit(
        &mut self,
        outcome: &ActionOutcome,
        parsed: ParsedDocument,
    ) -> Result<SyncReport, EditorError> {
        let buffer = self.buffer_mut()?;
        buffer.apply_edits(&outcome.edits);
        let text = buffer.value();
        if text != outcome.text {
            warn!("buffer merged edits differently than computed");
            return self.sync(text, ChangeOrigin::Programmatic, outcome.selection.clone());
        }
        self.sync_parsed(text, parsed, ChangeOrigin::Programmatic, &outcome.selection)
    }

    /// Text the current trees were parsed from, after syncing any change the
    /// host made without notifying the session. A buffer holding text that
    /// does not parse yields that parse error.
    fn current_text(&mut self) -> Result<String, EditorError> {
        self.on_buffer_changed()?;
        let text = self.buffer()?.value();
        let generation = self.generation()?;
        if text == generation.text {
            return Ok(text);
        }
        match parse_document(&text, &self.options) {
            Err(err) => Err(err.into()),
            Ok(_) => Err(ActionError::OutOfSync.into()),
        }
    }

    #[instrument(skip(self, text, intent), fields(len = text.len()))]
    fn sync(
        &mut self,
        text: String,
        origin: ChangeOrigin,
        intent: SelectionIntent,
    ) -> Result<SyncReport, EditorError> {
        let parsed = match parse_document(&text, &self.options) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, ?origin, "parse failed, keeping previous tree");
                // Remember the text so the same failure is not retried.
                self.synced_text = Some(text);
                return Err(err.into());
            }
        };
        self.sync_parsed(text, parsed, origin, &intent)
    }

    fn sync_parsed(
        &mut self,
        text: String,
        parsed: ParsedDocument,
        origin: ChangeOrigin,
        intent: &SelectionIntent,
    ) -> Result<SyncReport, EditorError> {
        let valid = project(&parsed.tree);
        let selection = resolve_selection(&valid, intent);

        let text_changed = self
            .generation
            .as_ref()
            .map_or(true, |generation| generation.text != text);
        if let Some(record) = self
            .clipboard_record
            .as_mut()
            .filter(|record| record.is_pending_cut() && text_changed)
        {
            // Recorded paths point into the old text.
            debug!(names = ?record.display_names, "pending cut invalidated by edit");
            record.kind = ClipboardKind::Copy;
        }

        let reconcile = if self.live_view.is_loaded() {
            self.live_view.sync(&parsed.tree, &selection)
        } else {
            self.live_view.load(&parsed.tree);
            ReconcileReport::default()
        };

        let committed = origin != ChangeOrigin::Replay;
        if committed {
            self.history
                .commit(HistoryEvent::new(text.as_str(), paths_of(&valid, &selection)));
        }

        debug!(
            ?origin,
            selected = selection.len(),
            patches = reconcile.patches.len(),
            "synced"
        );
        self.selection = selection.clone();
        self.synced_text = Some(text.clone());
        self.generation = Some(Generation {
            text,
            raw: parsed.tree,
            valid,
            renderable_content: parsed.renderable_content,
        });
        self.persist_preview();

        Ok(SyncReport {
            reconcile,
            selection,
            committed,
        })
    }

    /// Persistence failures are logged, the buffer stays the source of truth.
    fn persist_preview(&mut self) {
        let (Some(persistence), Some(file), Some(generation)) =
            (self.persistence.as_mut(), self.file.as_ref(), self.generation.as_ref())
        else {
            return;
        };
        let Some(name) = file.file_name() else {
            return;
        };
        if let Err(err) = persistence.write(Path::new(name), &generation.renderable_content) {
            warn!(error = %err, file = %file.display(), "could not persist preview");
        }
    }

    // Selection

    pub fn select(&mut self, uids: &[NodeUid]) {
        self.selection = match self.generation.as_ref() {
            Some(generation) => uids
                .iter()
                .copied()
                .filter(|uid| generation.valid.contains(*uid))
                .collect(),
            None => Vec::new(),
        };
    }

    /// Select nodes by path. Unknown paths are dropped.
    pub fn select_paths<S: AsRef<str>>(&mut self, paths: &[S]) -> Vec<NodeUid> {
        self.selection = match self.generation.as_ref() {
            Some(generation) => resolve_selection(
                &generation.valid,
                &SelectionIntent::paths(paths.iter().map(|p| p.as_ref().to_string())),
            ),
            None => Vec::new(),
        };
        self.selection.clone()
    }

    pub fn selection(&self) -> &[NodeUid] {
        &self.selection
    }

    pub fn selected_paths(&self) -> Vec<String> {
        match self.generation.as_ref() {
            Some(generation) => paths_of(&generation.valid, &self.selection),
            None => Vec::new(),
        }
    }

    /// Nodes to expand in a tree panel so the selection is visible
    pub fn ancestors_to_expand(&self) -> Vec<NodeUid> {
        match self.generation.as_ref() {
            Some(generation) => ancestors_to_expand(&generation.valid, &self.selection),
            None => Vec::new(),
        }
    }

    // Accessors

    pub fn text(&self) -> String {
        self.buffer.as_ref().map(|b| b.value()).unwrap_or_default()
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.options.reference
    }

    pub fn raw_tree(&self) -> Option<&NodeTree> {
        self.generation.as_ref().map(|g| &g.raw)
    }

    pub fn valid_tree(&self) -> Option<&ValidNodeTree> {
        self.generation.as_ref().map(|g| &g.valid)
    }

    pub fn renderable_content(&self) -> Option<&str> {
        self.generation
            .as_ref()
            .map(|g| g.renderable_content.as_str())
    }

    pub fn clipboard_record(&self) -> Option<&ClipboardRecord> {
        self.clipboard_record.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn live_view(&self) -> &LiveView {
        &self.live_view
    }

    fn buffer(&self) -> Result<&dyn TextBuffer, ActionError> {
        self.buffer.as_deref().ok_or(ActionError::MissingTextBuffer)
    }

    fn buffer_mut(&mut self) -> Result<&mut Box<dyn TextBuffer>, ActionError> {
        self.buffer.as_mut().ok_or(ActionError::MissingTextBuffer)
    }

    fn generation(&self) -> Result<&Generation, ActionError> {
        self.generation.as_ref().ok_or(ActionError::MissingTextBuffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::FsPersistence;
    use pretty_assertions::assert_eq;

    fn session(text: &str) -> EditorSession {
        let mut session = EditorSession::new(EditorConfig::default(), ReferenceData::html());
        session.open("index.html", text).unwrap();
        session
    }

    #[test]
    fn test_open_selects_first_body_element() {
        let session = session("<html><head></head><body><main></main></body></html>");
        assert_eq!(session.selected_paths(), vec!["0_0_1_0"]);
        assert_eq!(session.history().len(), 1);
        assert!(session.live_view().is_loaded());
    }

    #[test]
    fn test_echo_is_ignored() {
        let mut session = session("<div></div>");
        session.apply(NodeAction::Add { tag: "p".into() }, false).unwrap();
        assert!(session.on_buffer_changed().unwrap().is_none());
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_user_edit_keeps_selection_by_path() {
        let mut session = session("<div></div><p></p>");
        session.select_paths(&["0_1"]);
        session.buffer_mut().unwrap().set_value("<div></div>\n<p class=\"x\"></p>");
        let report = session.on_buffer_changed().unwrap().unwrap();
        assert!(report.committed);
        assert_eq!(session.selected_paths(), vec!["0_1"]);
    }

    #[test]
    fn test_parse_failure_keeps_previous_tree() {
        let mut session = session("<div></div>");
        session.buffer_mut().unwrap().set_value("<div><p>a < b</p></div>");
        assert!(session.on_buffer_changed().is_err());
        assert_eq!(session.valid_tree().unwrap().len(), 2);
        // Same text again is not re-parsed
        assert!(session.on_buffer_changed().unwrap().is_none());
    }

    #[test]
    fn test_skip_update_leaves_buffer_alone() {
        let mut session = session("<div></div>");
        let outcome = session.apply(NodeAction::Duplicate, true).unwrap();
        assert_eq!(outcome.text, "<div></div><div></div>");
        assert_eq!(session.text(), "<div></div>");
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_undo_restores_text_and_selection() {
        let mut session = session("<div></div>");
        session.apply(NodeAction::Add { tag: "p".into() }, false).unwrap();
        assert_eq!(session.text(), "<div><p></p></div>");

        assert!(session.undo().unwrap());
        assert_eq!(session.text(), "<div></div>");
        assert_eq!(session.selected_paths(), vec!["0_0"]);
        assert_eq!(session.history().len(), 2);

        assert!(session.redo().unwrap());
        assert_eq!(session.text(), "<div><p></p></div>");
        assert_eq!(session.selected_paths(), vec!["0_0_0"]);
    }

    #[test]
    fn test_preview_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = EditorSession::new(EditorConfig::default(), ReferenceData::html())
            .with_persistence(Box::new(FsPersistence::new(dir.path())));
        session.open("pages/index.html", "<p></p>").unwrap();

        let written = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert_eq!(written, "<p data-tessera-node-id=\"1\"></p>");
    }

    #[test]
    fn test_actions_need_an_open_document() {
        let mut session = EditorSession::new(EditorConfig::default(), ReferenceData::html());
        let err = session.apply(NodeAction::Remove, false).unwrap_err();
        assert!(matches!(
            err,
            EditorError::Action(ActionError::MissingTextBuffer)
        ));
    }
}
