//! Layout and validation of inserted markup.

use crate::errors::ActionError;
use tessera_parser::{parse, ReferenceData, SourceSpan};

/// Indentation of the line `offset` sits on, when only whitespace precedes
/// it on that line.
pub fn line_indent(text: &str, offset: usize) -> Option<&str> {
    let line_start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let before = &text[line_start..offset];
    before.chars().all(|c| c == ' ' || c == '\t').then_some(before)
}

/// Separator to put between a node and a sibling inserted right after it:
/// a newline plus the node's indentation when the node starts its own line.
pub fn sibling_separator(text: &str, span: &SourceSpan) -> String {
    match line_indent(text, span.start_offset) {
        Some(indent) if text[..span.start_offset].contains('\n') => format!("\n{}", indent),
        _ => String::new(),
    }
}

/// Check that inserted markup parses on its own.
pub fn check_markup(fragment: &str, reference: &ReferenceData) -> Result<(), ActionError> {
    parse(fragment, reference)?;
    Ok(())
}
