//! Error types for the markup parser

use crate::location::Position;
use std::ops::Range;
use thiserror::Error;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse error with location and context
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unrecognized markup at {}:{}: {message}", position.line, position.col)]
    LexError {
        position: Position,
        range: Range<usize>,
        message: String,
    },

    #[error("Unterminated {construct} starting at {}:{}", position.line, position.col)]
    Unterminated {
        position: Position,
        range: Range<usize>,
        construct: String,
    },

    #[error("Invalid tag at {}:{}: {message}", position.line, position.col)]
    InvalidTag {
        position: Position,
        range: Range<usize>,
        message: String,
    },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::LexError { position, .. }
            | ParseError::Unterminated { position, .. }
            | ParseError::InvalidTag { position, .. } => *position,
        }
    }

    pub fn range(&self) -> Range<usize> {
        match self {
            ParseError::LexError { range, .. }
            | ParseError::Unterminated { range, .. }
            | ParseError::InvalidTag { range, .. } => range.clone(),
        }
    }

    fn label(&self) -> &str {
        match self {
            ParseError::LexError { message, .. } | ParseError::InvalidTag { message, .. } => message,
            ParseError::Unterminated { construct, .. } => construct,
        }
    }
}

/// Pretty-print an error with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_error(source: &str, filename: &str, error: &ParseError) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let range = error.range();
    let start = range.start.min(source.len());
    let end = range.end.clamp(start, source.len());

    let mut output = Vec::new();
    let report = Report::build(ReportKind::Error, filename, start)
        .with_message(error.to_string())
        .with_label(
            Label::new((filename, start..end))
                .with_color(Color::Red)
                .with_message(error.label()),
        )
        .finish();

    if report
        .write((filename, Source::from(source)), &mut output)
        .is_err()
    {
        return error.to_string();
    }

    String::from_utf8(output).unwrap_or_else(|_| error.to_string())
}

/// Plain rendering used when ariadne is disabled
#[cfg(not(feature = "pretty-errors"))]
pub fn format_error(_source: &str, filename: &str, error: &ParseError) -> String {
    format!("{}: {} ({})", filename, error, error.label())
}
