//! Integration tests for the editor crate

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use tessera_editor::{
    apply_edits, project, ActionContext, ActionError, ClipboardKind, EditorConfig, EditorError,
    EditorSession, ErrorKind, MemoryBuffer, MemoryClipboard, NodeAction, NodeActions, NodeTree,
    NodeUid, PastePosition, ReferenceData, TextBuffer, TextEdit, ValidNodeTree,
};
use tessera_parser::{parse, COMMENT_TAG};

/// Buffer shared between the session and a simulated host editor
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<MemoryBuffer>>);

impl TextBuffer for SharedBuffer {
    fn value(&self) -> String {
        self.0.borrow().value()
    }

    fn apply_edits(&mut self, edits: &[TextEdit]) {
        self.0.borrow_mut().apply_edits(edits);
    }

    fn set_value(&mut self, text: &str) {
        self.0.borrow_mut().set_value(text);
    }
}

fn open(text: &str) -> EditorSession {
    let mut session = EditorSession::new(EditorConfig::default(), ReferenceData::html());
    session.open("index.html", text).unwrap();
    session
}

fn uid_at(session: &EditorSession, path: &str) -> NodeUid {
    session.valid_tree().unwrap().find_by_path(path).unwrap().uid
}

fn action_error(result: Result<impl std::fmt::Debug, EditorError>) -> ActionError {
    match result {
        Err(EditorError::Action(err)) => err,
        other => panic!("expected an action error, got {:?}", other),
    }
}

/// Tag names, attributes and child counts in document order
fn shape(tree: &NodeTree) -> Vec<(String, String, Vec<(String, String)>, usize)> {
    tree.document_order(tree.root_uid())
        .into_iter()
        .filter_map(|uid| tree.get(uid))
        .map(|node| {
            (
                node.unique_node_path.clone(),
                node.display_name.clone(),
                node.data
                    .attribs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                node.children.len(),
            )
        })
        .collect()
}

#[test]
fn test_add_nests_new_child() {
    let mut session = open("<div></div>");
    assert_eq!(session.selected_paths(), vec!["0_0"]);

    session.apply(NodeAction::Add { tag: "p".into() }, false).unwrap();

    assert_eq!(session.text(), "<div><p></p></div>");
    assert_eq!(session.selected_paths(), vec!["0_0_0"]);
    let p = uid_at(&session, "0_0_0");
    assert!(session.live_view().find(p).is_some());
}

#[test]
fn test_add_falls_back_to_sibling() {
    let mut session = open("<ul><li></li></ul>");
    session.apply(NodeAction::Add { tag: "p".into() }, false).unwrap();
    assert_eq!(session.text(), "<ul><li></li></ul><p></p>");
    assert_eq!(session.selected_paths(), vec!["0_1"]);
}

#[test]
fn test_add_rejects_forbidden_tag() {
    let mut session = open("<ul><li></li></ul>");
    session.select_paths(&["0_0_0"]);
    let err = action_error(session.apply(NodeAction::Add { tag: "td".into() }, false));
    assert_eq!(err.kind(), ErrorKind::Permission);
    assert_eq!(session.text(), "<ul><li></li></ul>");
}

#[test]
fn test_add_comment_keeps_selection() {
    let mut session = open("<div></div>");
    session
        .apply(NodeAction::Add { tag: COMMENT_TAG.into() }, false)
        .unwrap();
    assert_eq!(session.text(), "<div><!-- --></div>");
    assert_eq!(session.selected_paths(), vec!["0_0"]);
}

#[test]
fn test_group_wraps_selection() {
    let mut session = open("<div><a></a><b></b></div>");
    session.select_paths(&["0_0_0", "0_0_1"]);

    session.apply(NodeAction::Group, false).unwrap();

    assert_eq!(session.text(), "<div><div><a></a><b></b></div></div>");
    assert_eq!(session.selected_paths(), vec!["0_0_0"]);
    let tree = session.valid_tree().unwrap();
    assert_eq!(tree.find_by_path("0_0_0").unwrap().display_name, "div");
}

#[test]
fn test_ungroup_unwraps_children() {
    let mut session = open("<section><div><p></p><span></span></div></section>");
    session.select_paths(&["0_0_0"]);

    session.apply(NodeAction::Ungroup, false).unwrap();

    assert_eq!(session.text(), "<section><p></p><span></span></section>");
    assert_eq!(session.selected_paths(), vec!["0_0_0", "0_0_1"]);
}

#[test]
fn test_undo_at_origin_is_noop() {
    let mut session = open("<main><p>hello</p></main>");
    assert_eq!(session.history().len(), 1);
    assert!(!session.undo().unwrap());
    assert_eq!(session.text(), "<main><p>hello</p></main>");
}

#[test]
fn test_undo_does_not_record_replay() {
    let mut session = open("<div></div>");
    session.apply(NodeAction::Duplicate, false).unwrap();
    assert_eq!(session.text(), "<div></div><div></div>");

    assert!(session.undo().unwrap());
    assert_eq!(session.text(), "<div></div>");
    assert_eq!(session.history().len(), 2);
    assert!(session.history().can_redo());
}

#[test]
fn test_protected_nodes_reject_remove_and_move() {
    let source = "<html><head></head><body><p></p></body></html>";
    let mut session = open(source);

    session.select_paths(&["0_0_1"]);
    let err = action_error(session.apply(NodeAction::Remove, false));
    assert_eq!(err, ActionError::ProtectedNode("body".to_string()));
    assert_eq!(err.kind(), ErrorKind::Precondition);

    session.select_paths(&["0_0_0"]);
    let body = uid_at(&session, "0_0_1");
    let err = action_error(session.apply(
        NodeAction::Move {
            target: body,
            is_between: true,
            position: 0,
        },
        false,
    ));
    assert_eq!(err, ActionError::ProtectedNode("head".to_string()));
    assert_eq!(session.text(), source);
}

#[test]
fn test_move_into_self_is_rejected() {
    let source = "<div><p></p></div>";
    let mut session = open(source);
    let div = uid_at(&session, "0_0");
    let p = uid_at(&session, "0_0_0");

    for target in [div, p] {
        session.select(&[div]);
        let err = action_error(session.apply(
            NodeAction::Move {
                target,
                is_between: true,
                position: 0,
            },
            false,
        ));
        assert_eq!(err, ActionError::MoveIntoSelf);
    }
    assert_eq!(session.text(), source);
}

#[test]
fn test_move_to_first_slot() {
    let mut session = open("<ul><li>a</li><li>b</li><li>c</li></ul>");
    session.select_paths(&["0_0_2"]);
    let ul = uid_at(&session, "0_0");

    session
        .apply(
            NodeAction::Move {
                target: ul,
                is_between: true,
                position: 0,
            },
            false,
        )
        .unwrap();

    assert_eq!(session.text(), "<ul><li>c</li><li>a</li><li>b</li></ul>");
    assert_eq!(session.selected_paths(), vec!["0_0_0"]);
}

#[test]
fn test_move_after_sibling() {
    let mut session = open("<ul><li>a</li><li>b</li><li>c</li></ul>");
    session.select_paths(&["0_0_0"]);
    let ul = uid_at(&session, "0_0");

    session
        .apply(
            NodeAction::Move {
                target: ul,
                is_between: true,
                position: 2,
            },
            false,
        )
        .unwrap();

    assert_eq!(session.text(), "<ul><li>b</li><li>a</li><li>c</li></ul>");
    assert_eq!(session.selected_paths(), vec!["0_0_1"]);
}

#[test]
fn test_remove_selects_neighbour() {
    let mut session = open("<ul><li>a</li><li>b</li></ul>");
    session.select_paths(&["0_0_1"]);
    session.apply(NodeAction::Remove, false).unwrap();
    assert_eq!(session.text(), "<ul><li>a</li></ul>");
    assert_eq!(session.selected_paths(), vec!["0_0_0"]);

    session.apply(NodeAction::Remove, false).unwrap();
    assert_eq!(session.text(), "<ul></ul>");
    assert_eq!(session.selected_paths(), vec!["0_0"]);
}

#[test]
fn test_remove_many_is_offset_safe() {
    let mut session = open("<div><a></a><b></b><i></i></div>");
    session.select_paths(&["0_0_2", "0_0_0"]);
    session.apply(NodeAction::Remove, false).unwrap();
    assert_eq!(session.text(), "<div><b></b></div>");
    assert_eq!(session.selected_paths(), vec!["0_0"]);
}

#[test]
fn test_duplicate_keeps_indentation() {
    let mut session = open("<ul>\n  <li>a</li>\n</ul>");
    session.select_paths(&["0_0_0"]);
    session.apply(NodeAction::Duplicate, false).unwrap();
    assert_eq!(session.text(), "<ul>\n  <li>a</li>\n  <li>a</li>\n</ul>");
    assert_eq!(session.selected_paths(), vec!["0_0_0"]);
}

#[test]
fn test_copy_paste_matches_duplicate() {
    let source = "<section><h1 class=\"t\">x</h1><p>y</p></section>";

    let mut duplicated = open(source);
    duplicated.select_paths(&["0_0_0"]);
    duplicated.apply(NodeAction::Duplicate, false).unwrap();

    let mut pasted = open(source);
    pasted.select_paths(&["0_0_0"]);
    let copied = pasted.copy().unwrap();
    assert_eq!(copied.text, "<h1 class=\"t\">x</h1>");
    assert_eq!(copied.display_names, vec!["Node-<h1>"]);
    let h1 = uid_at(&pasted, "0_0_0");
    pasted.paste(h1, PastePosition::After, None).unwrap();

    assert_eq!(
        shape(duplicated.valid_tree().unwrap()),
        shape(pasted.valid_tree().unwrap())
    );
    assert_eq!(pasted.selected_paths(), vec!["0_0_1"]);
}

#[test]
fn test_cut_is_applied_by_paste() {
    let mut session = open("<div><p>a</p><span>b</span></div>");
    session.select_paths(&["0_0_0"]);

    let record = session.cut().unwrap();
    assert!(record.is_pending_cut());
    assert_eq!(session.text(), "<div><p>a</p><span>b</span></div>");

    let span = uid_at(&session, "0_0_1");
    session.paste(span, PastePosition::After, None).unwrap();
    assert_eq!(session.text(), "<div><span>b</span><p>a</p></div>");
    assert_eq!(session.selected_paths(), vec!["0_0_1"]);
    assert_eq!(session.clipboard_record().unwrap().kind, ClipboardKind::Copy);

    // A second paste inserts a copy
    let span = uid_at(&session, "0_0_0");
    session.paste(span, PastePosition::After, None).unwrap();
    assert_eq!(session.text(), "<div><span>b</span><p>a</p><p>a</p></div>");
}

#[test]
fn test_edit_after_cut_turns_cut_into_copy() {
    let mut session = open("<section><div></div><p>cut me</p></section>");
    session.select_paths(&["0_0_1"]);
    session.cut().unwrap();

    let div = uid_at(&session, "0_0_0");
    session
        .paste(div, PastePosition::Before, Some("<b>new</b>".into()))
        .unwrap();
    assert_eq!(session.clipboard_record().unwrap().kind, ClipboardKind::Copy);

    // The cut paths are stale, so the clipboard source is pasted as a copy
    let section = uid_at(&session, "0_0");
    session.paste(section, PastePosition::Inside, None).unwrap();
    assert_eq!(
        session.text(),
        "<section><p>cut me</p><b>new</b><div></div><p>cut me</p></section>"
    );
}

#[test]
fn test_action_after_unparsable_edit_leaves_buffer() {
    let mut host = SharedBuffer::default();
    let mut session = EditorSession::new(EditorConfig::default(), ReferenceData::html());
    session.attach_buffer(Box::new(host.clone()));
    session.open("index.html", "<div></div>").unwrap();

    host.set_value("ab < c<div></div>");
    assert!(session.on_buffer_changed().is_err());

    let result = session.apply(NodeAction::Add { tag: "p".into() }, false);
    assert!(matches!(result, Err(EditorError::Parse(_))));
    assert_eq!(host.value(), "ab < c<div></div>");
    assert!(matches!(session.copy(), Err(EditorError::Parse(_))));

    // Once the text parses again, actions work on it
    host.set_value("<div></div><span></span>");
    session.on_buffer_changed().unwrap();
    session.apply(NodeAction::Add { tag: "p".into() }, false).unwrap();
    assert_eq!(host.value(), "<div><p></p></div><span></span>");
}

#[test]
fn test_paste_inside_and_before() {
    let mut session = open("<div><p>a</p></div>");
    let div = uid_at(&session, "0_0");
    session
        .paste(div, PastePosition::Inside, Some("<b>x</b>".into()))
        .unwrap();
    assert_eq!(session.text(), "<div><b>x</b><p>a</p></div>");
    assert_eq!(session.selected_paths(), vec!["0_0_0"]);

    let p = uid_at(&session, "0_0_1");
    session
        .paste(p, PastePosition::Before, Some("<i></i>".into()))
        .unwrap();
    assert_eq!(session.text(), "<div><b>x</b><i></i><p>a</p></div>");
    assert_eq!(session.selected_paths(), vec!["0_0_1"]);
}

#[test]
fn test_paste_checks_permission() {
    let mut session = open("<div><p>a</p></div>");
    let p = uid_at(&session, "0_0_0");
    let err = action_error(session.paste(p, PastePosition::After, Some("<li>x</li>".into())));
    assert_eq!(err.kind(), ErrorKind::Permission);
    assert_eq!(session.text(), "<div><p>a</p></div>");
}

#[test]
fn test_denied_clipboard_is_reported() {
    let mut session = EditorSession::new(EditorConfig::default(), ReferenceData::html())
        .with_clipboard(Box::new(MemoryClipboard::denied()));
    session.open("index.html", "<div></div>").unwrap();

    let err = action_error(session.copy());
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert_eq!(session.text(), "<div></div>");
}

#[test]
fn test_update_settings() {
    let mut session = open("<div><a href=\"#\">x</a></div>");
    let a = uid_at(&session, "0_0_0");

    let mut attributes = indexmap::IndexMap::new();
    attributes.insert("href".to_string(), "/home".to_string());
    attributes.insert("title".to_string(), "Home".to_string());
    let result = session.update_settings(a, attributes.clone(), false).unwrap();
    assert!(result.is_success);
    assert_eq!(
        session.text(),
        "<div><a href=\"/home\" title=\"Home\">x</a></div>"
    );
    let a = uid_at(&session, "0_0_0");
    assert_eq!(session.element_settings(a).unwrap(), attributes);

    let mut invalid = indexmap::IndexMap::new();
    invalid.insert("x\"y".to_string(), "1".to_string());
    let result = session.update_settings(a, invalid, false).unwrap();
    assert!(!result.is_success);
    assert_eq!(result.settings, attributes);
    assert_eq!(
        session.text(),
        "<div><a href=\"/home\" title=\"Home\">x</a></div>"
    );
}

#[test]
fn test_rename_and_update_text() {
    let mut session = open("<div><b>old</b></div>");
    session.select_paths(&["0_0_0"]);
    session
        .apply(NodeAction::Rename { tag: "strong".into() }, false)
        .unwrap();
    assert_eq!(session.text(), "<div><strong>old</strong></div>");

    let strong = uid_at(&session, "0_0_0");
    session
        .apply(
            NodeAction::UpdateText {
                target: strong,
                content: "new".into(),
            },
            false,
        )
        .unwrap();
    assert_eq!(session.text(), "<div><strong>new</strong></div>");
}

#[test]
fn test_ancestors_to_expand() {
    let mut session = open("<div><ul><li></li></ul></div>");
    session.select_paths(&["0_0_0_0"]);
    let expected = vec![uid_at(&session, "0_0"), uid_at(&session, "0_0_0")];
    assert_eq!(session.ancestors_to_expand(), expected);
}

fn valid(text: &str) -> ValidNodeTree {
    project(&parse(text, &ReferenceData::html()).unwrap())
}

fn markup() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        Just("text".to_string()),
        Just("<!-- c -->".to_string()),
        Just("<br>".to_string()),
        Just("<p></p>".to_string()),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        (
            prop::sample::select(vec!["div", "section", "span"]),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(tag, children)| format!("<{tag}>{}</{tag}>", children.concat()))
    })
}

proptest! {
    #[test]
    fn prop_projection_is_idempotent(source in markup()) {
        let once = valid(&source);
        let twice = project(&once);
        prop_assert_eq!(&once, &twice);
        for node in once.iter() {
            for child in &node.children {
                prop_assert!(once.get(*child).map(|c| c.is_element()).unwrap_or(false));
            }
        }
    }

    #[test]
    fn prop_batch_removal_matches_sequential(
        tags in prop::collection::vec(prop::sample::select(vec!["p", "span", "b", "i"]), 1..8),
        mask in prop::collection::vec(any::<bool>(), 8),
    ) {
        let items: Vec<String> = tags.iter().map(|t| format!("  <{t}>x</{t}>")).collect();
        let text = format!("<div>\n{}\n</div>", items.join("\n"));
        let tree = valid(&text);
        let div = tree.find_by_path("0_0").unwrap();
        let chosen: Vec<usize> = (0..div.children.len()).filter(|i| mask[*i]).collect();
        prop_assume!(!chosen.is_empty());

        // Edits in ascending order; the batch applies them end to start
        let edits: Vec<TextEdit> = chosen
            .iter()
            .map(|i| TextEdit::delete(&tree.get(div.children[*i]).unwrap().location().span))
            .collect();
        let batch = apply_edits(&text, &edits);

        // One deletion at a time, re-parsing in between
        let mut sequential = text.clone();
        for (removed, ordinal) in chosen.iter().enumerate() {
            let tree = valid(&sequential);
            let path = format!("0_0_{}", ordinal - removed);
            let span = tree.find_by_path(&path).unwrap().location().span;
            sequential = apply_edits(&sequential, &[TextEdit::delete(&span)]);
        }
        prop_assert_eq!(&batch, &sequential);

        let config = EditorConfig::default();
        let reference = ReferenceData::html();
        let selection: Vec<NodeUid> = chosen.iter().map(|i| div.children[*i]).collect();
        let outcome = NodeActions::new(&reference, &config)
            .remove(ActionContext { text: &text, tree: &tree, selection: &selection })
            .unwrap();
        prop_assert_eq!(&outcome.text, &sequential);
    }
}
