//! Clipboard boundary and the pending copy/cut record.

use crate::errors::ClipboardError;
use serde::{Deserialize, Serialize};
use tessera_parser::NodeUid;

/// System clipboard abstraction
pub trait Clipboard {
    fn write(&mut self, text: &str) -> Result<(), ClipboardError>;

    fn read(&self) -> Result<String, ClipboardError>;
}

/// In-process clipboard, also used for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    text: Option<String>,
    denied: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard that refuses every access
    pub fn denied() -> Self {
        Self {
            text: None,
            denied: true,
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn write(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.denied {
            return Err(ClipboardError::PermissionDenied);
        }
        self.text = Some(text.to_string());
        Ok(())
    }

    fn read(&self) -> Result<String, ClipboardError> {
        if self.denied {
            return Err(ClipboardError::PermissionDenied);
        }
        Ok(self.text.clone().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardPanel {
    /// Node tree or live view
    Node,
    /// Code view
    Code,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardKind {
    Copy,
    Cut,
}

/// The last copy or cut. A cut record means the nodes are still in the
/// source and get removed by the next paste.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardRecord {
    pub panel: ClipboardPanel,
    #[serde(rename = "type")]
    pub kind: ClipboardKind,
    pub uids: Vec<NodeUid>,
    /// Paths of the recorded nodes, valid in the generation they were taken
    pub paths: Vec<String>,
    /// `Node-<tag>` names
    pub display_names: Vec<String>,
}

impl ClipboardRecord {
    pub fn is_pending_cut(&self) -> bool {
        self.panel == ClipboardPanel::Node && self.kind == ClipboardKind::Cut
    }
}

/// Clipboard display name of a node
pub fn display_name(tag: &str) -> String {
    format!("Node-<{}>", tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_clipboard() {
        let mut clipboard = MemoryClipboard::new();
        assert_eq!(clipboard.read().unwrap(), "");
        clipboard.write("<p></p>").unwrap();
        assert_eq!(clipboard.read().unwrap(), "<p></p>");
    }

    #[test]
    fn test_denied_clipboard() {
        let mut clipboard = MemoryClipboard::denied();
        assert_eq!(clipboard.write("x"), Err(ClipboardError::PermissionDenied));
        assert!(clipboard.read().is_err());
    }

    #[test]
    fn test_display_name_wraps_tag() {
        assert_eq!(display_name("div"), "Node-<div>");
    }
}
