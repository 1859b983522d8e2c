pub mod ast;
pub mod error;
pub mod lexer;
pub mod location;
pub mod parser;
pub mod reference;
pub mod serializer;

pub use ast::{Node, NodeData, NodeKind, NodeTree, NodeUid, ROOT_PATH};
pub use error::{format_error, ParseError, ParseResult};
pub use lexer::{tokenize, validate_start_tag, Token};
pub use location::{LineIndex, Position, SourceCodeLocation, SourceSpan};
pub use parser::{fragment_tags, parse, parse_document, ParseOptions, ParsedDocument};
pub use reference::{Containment, ElementReference, ReferenceData, COMMENT_TAG};
pub use serializer::{renderable_content, serialize_attributes, start_tag};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let tree = parse("<p>hi</p>", &ReferenceData::html()).unwrap();
        assert_eq!(tree.len(), 3);
    }
}
