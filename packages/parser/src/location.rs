//! Source locations.
//!
//! Lines and columns are 1-based and columns count characters, which is the
//! addressing the text buffer uses. Every span also carries its byte offsets
//! so editing code can sort and slice without converting back.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A 1-based line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// A half-open source range. `end_col` points one past the last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpan {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl SourceSpan {
    pub fn start(&self) -> Position {
        Position::new(self.start_line, self.start_col)
    }

    pub fn end(&self) -> Position {
        Position::new(self.end_line, self.end_col)
    }

    pub fn offsets(&self) -> Range<usize> {
        self.start_offset..self.end_offset
    }

    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    pub fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }

    /// True when `other` lies entirely inside this span.
    pub fn contains(&self, other: &SourceSpan) -> bool {
        self.start_offset <= other.start_offset && other.end_offset <= self.end_offset
    }

    /// True when the two spans share at least one byte.
    pub fn overlaps(&self, other: &SourceSpan) -> bool {
        self.start_offset < other.end_offset && other.start_offset < self.end_offset
    }
}

/// Full location of a node: its whole span plus, for elements, the spans of
/// the opening and closing tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCodeLocation {
    #[serde(flatten)]
    pub span: SourceSpan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_tag: Option<SourceSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_tag: Option<SourceSpan>,
}

impl SourceCodeLocation {
    pub fn new(span: SourceSpan) -> Self {
        Self {
            span,
            start_tag: None,
            end_tag: None,
        }
    }

    /// Byte range between the opening and closing tag, when both exist.
    pub fn inner_offsets(&self) -> Option<Range<usize>> {
        match (&self.start_tag, &self.end_tag) {
            (Some(start), Some(end)) => Some(start.end_offset..end.start_offset),
            _ => None,
        }
    }
}

/// Converts between byte offsets and line/column positions of one text.
#[derive(Debug, Clone)]
pub struct LineIndex<'src> {
    text: &'src str,
    line_starts: Vec<usize>,
}

impl<'src> LineIndex<'src> {
    pub fn new(text: &'src str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn position(&self, offset: usize) -> Position {
        let offset = self.clamp_offset(offset);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let col = self.text[line_start..offset].chars().count() + 1;
        Position::new(line + 1, col)
    }

    /// Byte offset of a position. Out-of-range lines and columns clamp to the
    /// nearest valid position, the way the text buffer validates ranges.
    pub fn offset(&self, position: Position) -> usize {
        if position.line == 0 {
            return 0;
        }
        let Some(&line_start) = self.line_starts.get(position.line - 1) else {
            return self.text.len();
        };
        let line_end = self
            .line_starts
            .get(position.line)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        let line_text = &self.text[line_start..line_end];
        let skip = position.col.saturating_sub(1);
        match line_text.char_indices().nth(skip) {
            Some((i, _)) => line_start + i,
            None => line_end,
        }
    }

    pub fn span(&self, range: Range<usize>) -> SourceSpan {
        let start = self.position(range.start);
        let end = self.position(range.end);
        SourceSpan {
            start_line: start.line,
            start_col: start.col,
            end_line: end.line,
            end_col: end.col,
            start_offset: self.clamp_offset(range.start),
            end_offset: self.clamp_offset(range.end),
        }
    }

    fn clamp_offset(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_are_one_based() {
        let index = LineIndex::new("<div>\n  <p></p>\n</div>");
        assert_eq!(index.position(0), Position::new(1, 1));
        assert_eq!(index.position(5), Position::new(1, 6));
        assert_eq!(index.position(6), Position::new(2, 1));
        assert_eq!(index.position(8), Position::new(2, 3));
    }

    #[test]
    fn test_offset_roundtrip_with_multibyte_chars() {
        let text = "é<b>ü</b>\nx";
        let index = LineIndex::new(text);
        for (offset, _) in text.char_indices() {
            assert_eq!(index.offset(index.position(offset)), offset);
        }
        assert_eq!(index.offset(index.position(text.len())), text.len());
    }

    #[test]
    fn test_offset_clamps_past_line_end() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.offset(Position::new(1, 10)), 2);
        assert_eq!(index.offset(Position::new(9, 1)), 5);
    }

    #[test]
    fn test_span_containment() {
        let index = LineIndex::new("<a><b></b></a>");
        let outer = index.span(0..14);
        let inner = index.span(3..10);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.overlaps(&inner));
    }
}
