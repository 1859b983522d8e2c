//! Tree builder.
//!
//! Consumes the logos token stream and builds a `NodeTree` whose nodes carry
//! their exact source spans. Recovery is lenient where markup usually is:
//! stray end tags are ignored and unclosed elements end where their nearest
//! closed ancestor's end tag begins (or at end of input). Anything the lexer
//! cannot tokenize is a `ParseError`.

use crate::ast::{
    Node, NodeData, NodeKind, NodeTree, NodeUid, COMMENT_NAME, DOCTYPE_NAME, DOCUMENT_NAME,
    PATH_SEPARATOR, ROOT_PATH, TEXT_NAME,
};
use crate::error::ParseResult;
use crate::lexer::{end_tag_name, lex_error, scan_start_tag, Token};
use crate::location::{LineIndex, SourceCodeLocation};
use crate::reference::ReferenceData;
use crate::serializer::renderable_content;
use indexmap::IndexMap;
use logos::Logos;
use std::ops::Range;

/// Elements whose content is raw text up to the matching end tag
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Default attribute carrying a node's uid in the renderable content
pub const DEFAULT_STAGE_NODE_ID_ATTR: &str = "data-tessera-node-id";

#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub reference: ReferenceData,
    pub stage_node_id_attr: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            reference: ReferenceData::html(),
            stage_node_id_attr: DEFAULT_STAGE_NODE_ID_ATTR.to_string(),
        }
    }
}

/// Output of a full document parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub tree: NodeTree,
    /// Source with the stage node-id attribute injected into every element
    pub renderable_content: String,
}

/// Parse a document into a raw node tree.
pub fn parse(source: &str, reference: &ReferenceData) -> ParseResult<NodeTree> {
    let pending = Builder::new(source, reference).run()?;
    Ok(pending.into_tree(source))
}

/// Parse a document and produce the renderable content alongside the tree.
pub fn parse_document(source: &str, options: &ParseOptions) -> ParseResult<ParsedDocument> {
    let tree = parse(source, &options.reference)?;
    let renderable_content = renderable_content(source, &tree, &options.stage_node_id_attr);
    Ok(ParsedDocument {
        tree,
        renderable_content,
    })
}

/// Display names of the top-level elements of a markup fragment
pub fn fragment_tags(fragment: &str, reference: &ReferenceData) -> ParseResult<Vec<String>> {
    let tree = parse(fragment, reference)?;
    Ok(tree
        .root()
        .children
        .iter()
        .filter_map(|uid| tree.get(*uid))
        .filter(|node| node.is_element())
        .map(|node| node.display_name.clone())
        .collect())
}

/// Node under construction, addressed by arena index
struct PendingNode {
    kind: NodeKind,
    name: String,
    attribs: IndexMap<String, String>,
    range: Range<usize>,
    start_tag: Option<Range<usize>>,
    end_tag: Option<Range<usize>>,
    children: Vec<usize>,
}

impl PendingNode {
    fn leaf(kind: NodeKind, range: Range<usize>) -> Self {
        Self {
            kind,
            name: String::new(),
            attribs: IndexMap::new(),
            range,
            start_tag: None,
            end_tag: None,
            children: Vec::new(),
        }
    }
}

struct Builder<'src, 'r> {
    source: &'src str,
    reference: &'r ReferenceData,
    arena: Vec<PendingNode>,
    /// Open elements, innermost last. Index 0 is always the document.
    open: Vec<usize>,
}

struct PendingTree {
    arena: Vec<PendingNode>,
}

impl<'src, 'r> Builder<'src, 'r> {
    fn new(source: &'src str, reference: &'r ReferenceData) -> Self {
        let document = PendingNode::leaf(NodeKind::Document, 0..source.len());
        Self {
            source,
            reference,
            arena: vec![document],
            open: vec![0],
        }
    }

    fn run(mut self) -> ParseResult<PendingTree> {
        let source = self.source;
        let mut lexer = Token::lexer(source);

        while let Some(token) = lexer.next() {
            let span = lexer.span();
            let slice = &source[span.clone()];
            match token {
                Ok(Token::Text) => {
                    let kind = NodeKind::Text {
                        content: slice.to_string(),
                    };
                    self.append(PendingNode::leaf(kind, span));
                }
                Ok(Token::Comment) => {
                    let content = slice
                        .strip_prefix("<!--")
                        .and_then(|s| s.strip_suffix("-->"))
                        .unwrap_or_default()
                        .to_string();
                    self.append(PendingNode::leaf(NodeKind::Comment { content }, span));
                }
                Ok(Token::Doctype) => {
                    let value = slice[9..slice.len() - 1].trim().to_string();
                    self.append(PendingNode::leaf(NodeKind::Doctype { value }, span));
                }
                Ok(Token::StartTag) => {
                    let parts = scan_start_tag(slice);
                    let name = parts.raw_name.to_ascii_lowercase();
                    let closed = parts.self_closing || self.reference.is_void(&name);
                    let node = PendingNode {
                        kind: NodeKind::Element {
                            self_closing: parts.self_closing,
                        },
                        name: name.clone(),
                        attribs: parts.attributes,
                        range: span.clone(),
                        start_tag: Some(span.clone()),
                        end_tag: None,
                        children: Vec::new(),
                    };
                    let index = self.append(node);
                    if closed {
                        continue;
                    }
                    self.open.push(index);

                    if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                        let needle = format!("</{}", name);
                        let rest = lexer.remainder();
                        let len = rest
                            .to_ascii_lowercase()
                            .find(&needle)
                            .unwrap_or(rest.len());
                        if len > 0 {
                            let kind = NodeKind::Text {
                                content: rest[..len].to_string(),
                            };
                            self.append(PendingNode::leaf(kind, span.end..span.end + len));
                        }
                        lexer.bump(len);
                    }
                }
                Ok(Token::EndTag) => {
                    let name = end_tag_name(slice).to_ascii_lowercase();
                    self.close(&name, span);
                }
                Err(()) => return Err(lex_error(source, span)),
            }
        }

        // Anything still open ends with the input.
        while self.open.len() > 1 {
            if let Some(index) = self.open.pop() {
                self.arena[index].range.end = source.len();
            }
        }

        Ok(PendingTree { arena: self.arena })
    }

    fn append(&mut self, node: PendingNode) -> usize {
        let index = self.arena.len();
        self.arena.push(node);
        let parent = self.open.last().copied().unwrap_or(0);
        self.arena[parent].children.push(index);
        index
    }

    fn close(&mut self, name: &str, end_tag: Range<usize>) {
        let Some(depth) = self
            .open
            .iter()
            .rposition(|&i| i != 0 && self.arena[i].name == name)
        else {
            // Stray end tag
            return;
        };
        while self.open.len() > depth + 1 {
            if let Some(index) = self.open.pop() {
                self.arena[index].range.end = end_tag.start;
            }
        }
        if let Some(index) = self.open.pop() {
            let node = &mut self.arena[index];
            node.range.end = end_tag.end;
            node.end_tag = Some(end_tag);
        }
    }
}

impl PendingTree {
    fn into_tree(mut self, source: &str) -> NodeTree {
        let index = LineIndex::new(source);
        let mut uids = vec![NodeUid::ROOT; self.arena.len()];
        let mut paths = vec![String::new(); self.arena.len()];
        let mut parents: Vec<Option<usize>> = vec![None; self.arena.len()];
        paths[0] = ROOT_PATH.to_string();

        // Preorder numbering, so the same text always yields the same uids.
        let mut next = 0u32;
        let mut stack = vec![0usize];
        while let Some(at) = stack.pop() {
            uids[at] = NodeUid(next);
            next += 1;

            let (mut elements, mut others) = (0usize, 0usize);
            for &child in &self.arena[at].children {
                parents[child] = Some(at);
                paths[child] = if matches!(self.arena[child].kind, NodeKind::Element { .. }) {
                    elements += 1;
                    format!("{}{}{}", paths[at], PATH_SEPARATOR, elements - 1)
                } else {
                    others += 1;
                    format!("{}{}t{}", paths[at], PATH_SEPARATOR, others - 1)
                };
            }
            stack.extend(self.arena[at].children.iter().rev().copied());
        }

        let mut nodes = Vec::with_capacity(self.arena.len());
        for (at, pending) in self.arena.drain(..).enumerate() {
            let valid = matches!(pending.kind, NodeKind::Document | NodeKind::Element { .. });
            let display_name = match &pending.kind {
                NodeKind::Document => DOCUMENT_NAME.to_string(),
                NodeKind::Doctype { .. } => DOCTYPE_NAME.to_string(),
                NodeKind::Element { .. } => pending.name.clone(),
                NodeKind::Text { .. } => TEXT_NAME.to_string(),
                NodeKind::Comment { .. } => COMMENT_NAME.to_string(),
            };
            let mut location = SourceCodeLocation::new(index.span(pending.range.clone()));
            location.start_tag = pending.start_tag.map(|r| index.span(r));
            location.end_tag = pending.end_tag.map(|r| index.span(r));

            nodes.push(Node {
                uid: uids[at],
                parent_uid: parents[at].map(|p| uids[p]),
                children: pending.children.iter().map(|c| uids[*c]).collect(),
                display_name,
                is_entity: true,
                unique_node_path: std::mem::take(&mut paths[at]),
                data: NodeData {
                    kind: pending.kind,
                    valid,
                    attribs: pending.attribs,
                    source_code_location: location,
                },
            });
        }

        // Raw `is_entity`: no element children
        let element_parents: Vec<NodeUid> = nodes
            .iter()
            .filter(|n| n.is_element())
            .filter_map(|n| n.parent_uid)
            .collect();

        let mut tree = NodeTree::from_nodes(uids[0], nodes);
        for uid in element_parents {
            if let Some(parent) = tree.get_mut(uid) {
                parent.is_entity = false;
            }
        }
        tree
    }
}
