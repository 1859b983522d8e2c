//! # Text Buffer
//!
//! The text buffer owns the one authoritative copy of the document text.
//! Structural actions read it, compute `{range, text}` edits against that
//! reading, and hand the whole batch back in a single `apply_edits` call.
//!
//! Ranges use the parser's addressing: 1-based lines, 1-based character
//! columns, end-exclusive. All edits of one batch are expressed against the
//! text as it was *before* the batch.

use serde::{Deserialize, Serialize};
use tessera_parser::{LineIndex, Position, SourceSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl TextRange {
    pub fn start(&self) -> Position {
        Position::new(self.start_line, self.start_col)
    }

    pub fn end(&self) -> Position {
        Position::new(self.end_line, self.end_col)
    }

    /// Empty range at `position`
    pub fn at(position: Position) -> Self {
        Self {
            start_line: position.line,
            start_col: position.col,
            end_line: position.line,
            end_col: position.col,
        }
    }
}

impl From<&SourceSpan> for TextRange {
    fn from(span: &SourceSpan) -> Self {
        Self {
            start_line: span.start_line,
            start_col: span.start_col,
            end_line: span.end_line,
            end_col: span.end_col,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub range: TextRange,
    pub text: String,
}

impl TextEdit {
    pub fn replace(span: &SourceSpan, text: impl Into<String>) -> Self {
        Self {
            range: span.into(),
            text: text.into(),
        }
    }

    pub fn delete(span: &SourceSpan) -> Self {
        Self::replace(span, "")
    }

    /// Insert `text` at the start of `span`
    pub fn insert_before(span: &SourceSpan, text: impl Into<String>) -> Self {
        Self {
            range: TextRange::at(span.start()),
            text: text.into(),
        }
    }

    /// Insert `text` at the end of `span`
    pub fn insert_after(span: &SourceSpan, text: impl Into<String>) -> Self {
        Self {
            range: TextRange::at(span.end()),
            text: text.into(),
        }
    }

    /// Smallest single edit turning `old` into `new`, or `None` when equal.
    pub fn diff(old: &str, new: &str) -> Option<Self> {
        if old == new {
            return None;
        }
        let prefix = common_prefix(old, new);
        let suffix = common_suffix(&old[prefix..], &new[prefix..]);
        let index = LineIndex::new(old);
        let span = index.span(prefix..old.len() - suffix);
        Some(Self::replace(&span, &new[prefix..new.len() - suffix]))
    }
}

fn common_prefix(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map(|((i, _), _)| i)
        .unwrap_or_else(|| a.len().min(b.len()))
}

fn common_suffix(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(ca, cb)| ca == cb)
        .map(|(c, _)| c.len_utf8())
        .sum()
}

/// Apply a batch of edits, all addressed against `text`.
///
/// Edits are applied from the end of the document toward the start, so no
/// edit shifts a range that has not been applied yet. Inserts at the same
/// position keep their batch order.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let index = LineIndex::new(text);
    let mut resolved: Vec<(usize, usize, usize, &str)> = edits
        .iter()
        .enumerate()
        .map(|(order, edit)| {
            let start = index.offset(edit.range.start());
            let end = index.offset(edit.range.end()).max(start);
            (start, end, order, edit.text.as_str())
        })
        .collect();
    resolved.sort_by(|a, b| b.0.cmp(&a.0).then(b.2.cmp(&a.2)));

    let mut out = text.to_string();
    for (start, end, _, replacement) in resolved {
        out.replace_range(start..end, replacement);
    }
    out
}

/// The external editor holding the document text
pub trait TextBuffer {
    fn value(&self) -> String;

    fn value_in_range(&self, range: &TextRange) -> String {
        let text = self.value();
        let index = LineIndex::new(&text);
        let start = index.offset(range.start());
        let end = index.offset(range.end()).max(start);
        text[start..end].to_string()
    }

    fn apply_edits(&mut self, edits: &[TextEdit]);

    fn set_value(&mut self, text: &str);
}

/// In-memory text buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    text: String,
    version: u64,
}

impl MemoryBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            version: 0,
        }
    }

    /// Bumped on every change
    pub fn version(&self) -> u64 {
        self.version
    }
}

impl TextBuffer for MemoryBuffer {
    fn value(&self) -> String {
        self.text.clone()
    }

    fn apply_edits(&mut self, edits: &[TextEdit]) {
        if edits.is_empty() {
            return;
        }
        self.text = apply_edits(&self.text, edits);
        self.version += 1;
    }

    fn set_value(&mut self, text: &str) {
        self.text = text.to_string();
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn range(start: (usize, usize), end: (usize, usize)) -> TextRange {
        TextRange {
            start_line: start.0,
            start_col: start.1,
            end_line: end.0,
            end_col: end.1,
        }
    }

    #[test]
    fn test_batch_is_addressed_against_original_text() {
        let text = "<a></a><b></b>";
        let edits = vec![
            TextEdit {
                range: range((1, 1), (1, 8)),
                text: String::new(),
            },
            TextEdit {
                range: range((1, 8), (1, 15)),
                text: "<i></i>".to_string(),
            },
        ];
        assert_eq!(apply_edits(text, &edits), "<i></i>");
    }

    #[test]
    fn test_inserts_at_same_point_keep_order() {
        let edits = vec![
            TextEdit {
                range: range((1, 2), (1, 2)),
                text: "1".to_string(),
            },
            TextEdit {
                range: range((1, 2), (1, 2)),
                text: "2".to_string(),
            },
        ];
        assert_eq!(apply_edits("ab", &edits), "a12b");
    }

    #[test]
    fn test_diff_is_minimal() {
        let old = "<div><p></p></div>";
        let new = "<div><p></p><p></p></div>";
        let edit = TextEdit::diff(old, new).unwrap();
        assert_eq!(edit.range.start(), edit.range.end());
        assert_eq!(edit.text.len(), 7);
        assert_eq!(apply_edits(old, &[edit]), new);
        assert!(TextEdit::diff("same", "same").is_none());
    }

    #[test]
    fn test_diff_multiline_and_multibyte() {
        let old = "é\n<a>x</a>\n";
        let new = "é\n<a>yz</a>\n";
        let edit = TextEdit::diff(old, new).unwrap();
        assert_eq!(apply_edits(old, &[edit]), new);
    }

    #[test]
    fn test_memory_buffer() {
        let mut buffer = MemoryBuffer::new("hello");
        assert_eq!(buffer.value_in_range(&range((1, 2), (1, 4))), "el");
        buffer.set_value("bye");
        assert_eq!(buffer.value(), "bye");
        assert_eq!(buffer.version(), 1);
    }
}
