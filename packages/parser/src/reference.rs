//! Element reference table.
//!
//! Drives three things: which elements are void, which parent/child pairs are
//! permitted, and the markup template used when inserting a new element.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pseudo tag name used for inserting a comment node
pub const COMMENT_TAG: &str = "!--...--";

/// What an element may contain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "tags")]
pub enum Containment {
    /// Void element, no content at all
    None,
    /// Text and comments only
    Text,
    Any,
    /// Only the listed element tags (plus comments)
    Only(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementReference {
    /// Opening tag text used in templates, e.g. `<a`
    pub tag: String,
    /// Default attributes, already serialized (` href="#"`)
    #[serde(default)]
    pub attributes: String,
    /// Default inner content
    #[serde(default)]
    pub content: String,
    pub contain: Containment,
    /// Restricts where this element may be placed
    #[serde(default)]
    pub parents: Option<Vec<String>>,
}

impl ElementReference {
    pub fn is_void(&self) -> bool {
        self.contain == Containment::None
    }

    /// Full markup for a freshly inserted element
    pub fn template(&self, name: &str) -> String {
        if self.is_void() {
            format!("{}{}>", self.tag, self.attributes)
        } else {
            format!("{}{}>{}</{}>", self.tag, self.attributes, self.content, name)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub elements: HashMap<String, ElementReference>,
}

type Row = (&'static str, &'static str, &'static str, Contain, &'static [&'static str]);

#[derive(Clone, Copy)]
enum Contain {
    Void,
    Text,
    Any,
    Only(&'static [&'static str]),
}

const LIST_ITEMS: &[&str] = &["li"];
const TABLE_PARTS: &[&str] = &["caption", "colgroup", "thead", "tbody", "tfoot", "tr"];
const ROWS: &[&str] = &["tr"];
const CELLS: &[&str] = &["td", "th"];
const OPTIONS: &[&str] = &["option", "optgroup"];
const DEFINITIONS: &[&str] = &["dt", "dd"];
const DOCUMENT: &[&str] = &["head", "body"];
const HEAD_CONTENT: &[&str] = &["title", "base", "meta", "link", "style", "script", "noscript"];

const ANYWHERE: &[&str] = &[];

#[rustfmt::skip]
const HTML_ELEMENTS: &[Row] = &[
    // name, default attributes, default content, containment, permitted parents
    ("html", " lang=\"en\"", "", Contain::Only(DOCUMENT), ANYWHERE),
    ("head", "", "", Contain::Only(HEAD_CONTENT), &["html"]),
    ("body", "", "", Contain::Any, &["html"]),
    ("title", "", "Title", Contain::Text, &["head"]),
    ("base", " href=\"/\"", "", Contain::Void, &["head"]),
    ("meta", " charset=\"utf-8\"", "", Contain::Void, &["head"]),
    ("link", " rel=\"stylesheet\" href=\"\"", "", Contain::Void, ANYWHERE),
    ("style", "", "", Contain::Text, ANYWHERE),
    ("script", "", "", Contain::Text, ANYWHERE),
    ("noscript", "", "", Contain::Any, ANYWHERE),
    ("div", "", "", Contain::Any, ANYWHERE),
    ("span", "", "Text", Contain::Any, ANYWHERE),
    ("section", "", "", Contain::Any, ANYWHERE),
    ("article", "", "", Contain::Any, ANYWHERE),
    ("aside", "", "", Contain::Any, ANYWHERE),
    ("header", "", "", Contain::Any, ANYWHERE),
    ("footer", "", "", Contain::Any, ANYWHERE),
    ("main", "", "", Contain::Any, ANYWHERE),
    ("nav", "", "", Contain::Any, ANYWHERE),
    ("figure", "", "", Contain::Any, ANYWHERE),
    ("figcaption", "", "Caption", Contain::Any, ANYWHERE),
    ("h1", "", "Heading 1", Contain::Any, ANYWHERE),
    ("h2", "", "Heading 2", Contain::Any, ANYWHERE),
    ("h3", "", "Heading 3", Contain::Any, ANYWHERE),
    ("h4", "", "Heading 4", Contain::Any, ANYWHERE),
    ("h5", "", "Heading 5", Contain::Any, ANYWHERE),
    ("h6", "", "Heading 6", Contain::Any, ANYWHERE),
    ("p", "", "", Contain::Any, ANYWHERE),
    ("a", " href=\"#\"", "Link", Contain::Any, ANYWHERE),
    ("b", "", "Bold", Contain::Any, ANYWHERE),
    ("i", "", "Italic", Contain::Any, ANYWHERE),
    ("em", "", "Emphasis", Contain::Any, ANYWHERE),
    ("strong", "", "Strong", Contain::Any, ANYWHERE),
    ("small", "", "Small", Contain::Any, ANYWHERE),
    ("code", "", "", Contain::Any, ANYWHERE),
    ("pre", "", "", Contain::Any, ANYWHERE),
    ("blockquote", "", "", Contain::Any, ANYWHERE),
    ("label", "", "Label", Contain::Any, ANYWHERE),
    ("button", " type=\"button\"", "Button", Contain::Any, ANYWHERE),
    ("form", "", "", Contain::Any, ANYWHERE),
    ("textarea", "", "", Contain::Text, ANYWHERE),
    ("select", "", "", Contain::Only(OPTIONS), ANYWHERE),
    ("optgroup", " label=\"Group\"", "", Contain::Only(&["option"]), &["select"]),
    ("option", "", "Option", Contain::Text, &["select", "optgroup", "datalist"]),
    ("datalist", "", "", Contain::Only(&["option"]), ANYWHERE),
    ("ul", "", "", Contain::Only(LIST_ITEMS), ANYWHERE),
    ("ol", "", "", Contain::Only(LIST_ITEMS), ANYWHERE),
    ("li", "", "List item", Contain::Any, &["ul", "ol", "menu"]),
    ("menu", "", "", Contain::Only(LIST_ITEMS), ANYWHERE),
    ("dl", "", "", Contain::Only(DEFINITIONS), ANYWHERE),
    ("dt", "", "Term", Contain::Any, &["dl"]),
    ("dd", "", "Description", Contain::Any, &["dl"]),
    ("table", "", "", Contain::Only(TABLE_PARTS), ANYWHERE),
    ("caption", "", "Caption", Contain::Any, &["table"]),
    ("colgroup", "", "", Contain::Only(&["col"]), &["table"]),
    ("col", "", "", Contain::Void, &["colgroup"]),
    ("thead", "", "", Contain::Only(ROWS), &["table"]),
    ("tbody", "", "", Contain::Only(ROWS), &["table"]),
    ("tfoot", "", "", Contain::Only(ROWS), &["table"]),
    ("tr", "", "", Contain::Only(CELLS), &["table", "thead", "tbody", "tfoot"]),
    ("td", "", "Cell", Contain::Any, &["tr"]),
    ("th", "", "Header", Contain::Any, &["tr"]),
    ("img", " src=\"\" alt=\"\"", "", Contain::Void, ANYWHERE),
    ("input", " type=\"text\"", "", Contain::Void, ANYWHERE),
    ("br", "", "", Contain::Void, ANYWHERE),
    ("hr", "", "", Contain::Void, ANYWHERE),
    ("wbr", "", "", Contain::Void, ANYWHERE),
    ("area", "", "", Contain::Void, ANYWHERE),
    ("embed", "", "", Contain::Void, ANYWHERE),
    ("source", "", "", Contain::Void, ANYWHERE),
    ("track", "", "", Contain::Void, ANYWHERE),
    ("param", "", "", Contain::Void, ANYWHERE),
    ("iframe", " src=\"\"", "", Contain::Any, ANYWHERE),
    ("video", " controls", "", Contain::Any, ANYWHERE),
    ("audio", " controls", "", Contain::Any, ANYWHERE),
    ("canvas", "", "", Contain::Any, ANYWHERE),
    ("svg", "", "", Contain::Any, ANYWHERE),
];

impl ReferenceData {
    /// The built-in HTML reference
    pub fn html() -> Self {
        let mut elements = HashMap::new();
        for (name, attributes, content, contain, parents) in HTML_ELEMENTS {
            let contain = match contain {
                Contain::Void => Containment::None,
                Contain::Text => Containment::Text,
                Contain::Any => Containment::Any,
                Contain::Only(tags) => Containment::Only(owned_tags(tags)),
            };
            let parents = (!parents.is_empty()).then(|| owned_tags(parents));
            elements.insert(
                name.to_string(),
                ElementReference {
                    tag: format!("<{}", name),
                    attributes: attributes.to_string(),
                    content: content.to_string(),
                    contain,
                    parents,
                },
            );
        }
        Self { elements }
    }

    /// Load a reference table from its JSON form (`{"elements": {...}}`)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn get(&self, tag: &str) -> Option<&ElementReference> {
        self.elements.get(tag)
    }

    pub fn is_void(&self, tag: &str) -> bool {
        self.get(tag).map(ElementReference::is_void).unwrap_or(false)
    }

    /// Markup for inserting `tag`. Unknown tags get a plain open/close pair.
    pub fn template(&self, tag: &str) -> String {
        if tag == COMMENT_TAG {
            return "<!-- -->".to_string();
        }
        match self.get(tag) {
            Some(reference) => reference.template(tag),
            None => format!("<{}></{}>", tag, tag),
        }
    }

    /// Whether `child` may be placed directly inside `parent`. `None` stands
    /// for the document root, which accepts anything.
    pub fn can_contain(&self, parent: Option<&str>, child: &str) -> bool {
        let Some(parent) = parent else {
            return true;
        };
        let parent_ref = self.get(parent);

        if child == COMMENT_TAG || child == "#comment" {
            return !parent_ref.map(ElementReference::is_void).unwrap_or(false);
        }

        if let Some(parents) = self.get(child).and_then(|r| r.parents.as_ref()) {
            if !parents.iter().any(|p| p == parent) {
                return false;
            }
        }

        match parent_ref.map(|r| &r.contain) {
            None | Some(Containment::Any) => true,
            Some(Containment::None) | Some(Containment::Text) => false,
            Some(Containment::Only(tags)) => tags.iter().any(|t| t == child),
        }
    }
}

fn owned_tags(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|t| t.to_string()).collect()
}
