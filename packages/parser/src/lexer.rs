//! Markup lexer using logos
//!
//! The top-level lexer only distinguishes whole constructs (tags, comments,
//! doctype, text). Attributes are scanned from a start tag's slice once the
//! tag has been recognised as a whole, and raw-text elements (`script`,
//! `style`, ...) are skipped over by the parser with `Lexer::bump`.

use crate::error::{ParseError, ParseResult};
use crate::location::LineIndex;
use indexmap::IndexMap;
use logos::{Lexer, Logos};
use std::ops::Range;

/// Markup tokens
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    #[token("<!--", lex_comment)]
    Comment,

    #[regex(r"<![dD][oO][cC][tT][yY][pP][eE][^>]*>")]
    Doctype,

    #[regex(r#"<[a-zA-Z][^\s/>]*(\s+[^\s"'>/=]+(\s*=\s*("[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*\s*/?>"#)]
    StartTag,

    #[regex(r"</[a-zA-Z][^\s>]*\s*>")]
    EndTag,

    #[regex(r"[^<]+")]
    Text,
}

fn lex_comment(lex: &mut Lexer<Token>) -> bool {
    match lex.remainder().find("-->") {
        Some(end) => {
            lex.bump(end + 3);
            true
        }
        None => false,
    }
}

/// A token with its byte range in the source
pub type SpannedToken = (Token, Range<usize>);

/// Tokenize a whole source, failing on the first unrecognised construct.
///
/// Raw-text element bodies are not special-cased here; use the parser for
/// documents containing `script` or `style`.
pub fn tokenize(source: &str) -> ParseResult<Vec<SpannedToken>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => return Err(lex_error(source, span)),
        }
    }
    Ok(tokens)
}

pub(crate) fn lex_error(source: &str, span: Range<usize>) -> ParseError {
    let index = LineIndex::new(source);
    let position = index.position(span.start);
    let rest = &source[span.start..];
    if rest.starts_with("<!--") {
        return ParseError::Unterminated {
            position,
            range: span.start..source.len(),
            construct: "comment".to_string(),
        };
    }
    if rest.len() > 1 && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic() || c == '/') {
        let end = rest.find('>').map(|i| span.start + i + 1).unwrap_or(source.len());
        return ParseError::InvalidTag {
            position,
            range: span.start..end,
            message: "malformed tag".to_string(),
        };
    }
    ParseError::LexError {
        position,
        range: span,
        message: "unescaped '<' (use &lt;)".to_string(),
    }
}

/// Pieces of a start tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTagParts {
    /// Tag name as written in the source
    pub raw_name: String,
    pub attributes: IndexMap<String, String>,
    pub self_closing: bool,
}

/// Split a start-tag slice (`<name attr="v">`) into its parts. The slice must
/// already have been recognised as a `Token::StartTag`.
pub fn scan_start_tag(tag: &str) -> StartTagParts {
    let body = tag.trim_start_matches('<').trim_end_matches('>');
    let (body, self_closing) = match body.strip_suffix('/') {
        Some(rest) => (rest, true),
        None => (body, false),
    };

    let name_end = body
        .find(|c: char| c.is_whitespace())
        .unwrap_or(body.len());
    let raw_name = body[..name_end].to_string();

    let mut attributes = IndexMap::new();
    let mut rest = body[name_end..].trim_start();
    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let key = rest[..key_end].to_ascii_lowercase();
        rest = rest[key_end..].trim_start();

        let mut value = String::new();
        if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (raw, remaining) = match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let inner = &after_eq[1..];
                    let close = inner.find(quote).unwrap_or(inner.len());
                    (&inner[..close], inner.get(close + 1..).unwrap_or(""))
                }
                _ => {
                    let end = after_eq
                        .find(|c: char| c.is_whitespace())
                        .unwrap_or(after_eq.len());
                    (&after_eq[..end], &after_eq[end..])
                }
            };
            value = raw.to_string();
            rest = remaining.trim_start();
        }
        if !key.is_empty() {
            attributes.entry(key).or_insert(value);
        }
    }

    StartTagParts {
        raw_name,
        attributes,
        self_closing,
    }
}

/// Tag name of an end-tag slice (`</name >`)
pub fn end_tag_name(tag: &str) -> &str {
    tag.trim_start_matches("</").trim_end_matches('>').trim_end()
}

/// Check that `tag` is exactly one well-formed start tag.
pub fn validate_start_tag(tag: &str) -> ParseResult<()> {
    let mut lexer = Token::lexer(tag);
    match (lexer.next(), lexer.span()) {
        (Some(Ok(Token::StartTag)), span) if span.end == tag.len() => Ok(()),
        (Some(Err(())), span) => Err(lex_error(tag, span)),
        _ => Err(ParseError::InvalidTag {
            position: LineIndex::new(tag).position(0),
            range: 0..tag.len(),
            message: "expected a single start tag".to_string(),
        }),
    }
}
