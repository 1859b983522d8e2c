//! Error types for the editor

use tessera_parser::{NodeUid, ParseError};
use thiserror::Error;

/// Coarse classification surfaced to users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Precondition,
    Permission,
    Validation,
    Resolution,
}

/// Why a structural action was rejected. Every variant is raised before any
/// text reaches the buffer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("No text buffer is attached")]
    MissingTextBuffer,

    #[error("Text buffer changed since the last parse")]
    OutOfSync,

    #[error("Nothing is selected")]
    NoSelection,

    #[error("Node not found: {0}")]
    NodeNotFound(NodeUid),

    #[error("<{0}> is a protected container")]
    ProtectedNode(String),

    #[error("Cannot move a node into itself or its own selection")]
    MoveIntoSelf,

    #[error("<{tag}> is not permitted inside <{parent}>")]
    NotPermitted { tag: String, parent: String },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("<{0}> cannot hold children")]
    NotAContainer(String),

    #[error("Invalid markup: {0}")]
    Validation(String),

    #[error("Node is not an element")]
    NotAnElement,

    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),

    #[error("Clipboard is empty")]
    NothingToPaste,

    #[error("Could not re-locate node at path {0}")]
    Unresolved(String),
}

impl ActionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::Parse(_) => ErrorKind::Parse,
            ActionError::MissingTextBuffer
            | ActionError::OutOfSync
            | ActionError::NoSelection
            | ActionError::NodeNotFound(_)
            | ActionError::ProtectedNode(_)
            | ActionError::MoveIntoSelf
            | ActionError::InvalidTarget(_)
            | ActionError::NotAContainer(_)
            | ActionError::NotAnElement
            | ActionError::Clipboard(_)
            | ActionError::NothingToPaste => ErrorKind::Precondition,
            ActionError::NotPermitted { .. } => ErrorKind::Permission,
            ActionError::Validation(_) => ErrorKind::Validation,
            ActionError::Unresolved(_) => ErrorKind::Resolution,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("Clipboard access denied")]
    PermissionDenied,

    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditorError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            EditorError::Parse(_) => Some(ErrorKind::Parse),
            EditorError::Action(err) => Some(err.kind()),
            _ => None,
        }
    }
}
