//! # Tessera Editor
//!
//! Structural edit engine for markup documents edited visually.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: text → raw node tree with spans     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: valid tree + structural actions     │
//! │  - Project the raw tree onto valid nodes    │
//! │  - Turn actions into text edits             │
//! │  - Resolve selection across re-parses       │
//! │  - Record history                           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ stage: reconcile the live view              │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Text is source of truth**: trees and the live view are derived and
//!    rebuilt after every change
//! 2. **Uids live for one parse**: nodes are re-identified by path
//! 3. **Validate, then apply**: a rejected action never reaches the buffer
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tessera_editor::{EditorConfig, EditorSession, NodeAction};
//! use tessera_parser::ReferenceData;
//!
//! let mut session = EditorSession::new(EditorConfig::default(), ReferenceData::html());
//! session.open("index.html", "<div></div>")?;
//!
//! session.apply(NodeAction::Add { tag: "p".into() }, false)?;
//! assert_eq!(session.text(), "<div><p></p></div>");
//!
//! session.undo()?;
//! ```

mod actions;
mod clipboard;
mod config;
mod errors;
mod format;
mod history;
mod persistence;
mod selection;
mod session;
mod text_buffer;
mod tree;

pub use actions::{
    ActionContext, ActionOutcome, ActionResult, CopyOutcome, NodeAction, NodeActions,
    PastePosition, PasteSource, SettingsOutcome,
};
pub use clipboard::{
    display_name, Clipboard, ClipboardKind, ClipboardPanel, ClipboardRecord, MemoryClipboard,
};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use errors::{ActionError, ClipboardError, ConfigError, EditorError, ErrorKind, PersistError};
pub use format::{check_markup, line_indent, sibling_separator};
pub use history::{History, HistoryEvent};
pub use persistence::{FsPersistence, MemoryPersistence, Persistence};
pub use selection::{paths_of, resolve_selection, PathShifts, SelectionIntent};
pub use session::{ChangeOrigin, EditorSession, SyncReport};
pub use text_buffer::{apply_edits, MemoryBuffer, TextBuffer, TextEdit, TextRange};
pub use tree::{
    ancestors_to_expand, child_index, initial_selection, parent, project, sort_by_end_desc,
    sort_by_start, top_level, ValidNodeTree,
};

// Re-export common types for convenience
pub use tessera_parser::{NodeTree, NodeUid, ReferenceData};
pub use tessera_stage::LiveView;
