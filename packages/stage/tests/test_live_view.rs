use pretty_assertions::assert_eq;
use tessera_parser::{parse, NodeUid, ReferenceData};
use tessera_stage::{LiveView, ReconcileOptions, StageNode, StagePatch};

fn options() -> ReconcileOptions {
    ReconcileOptions {
        stage_node_id_attr: "data-tessera-node-id".to_string(),
        preserve_attr: "data-tessera-preserve".to_string(),
    }
}

fn tree(source: &str) -> tessera_parser::NodeTree {
    parse(source, &ReferenceData::html()).unwrap()
}

#[test]
fn test_sync_before_load_renders() {
    let mut view = LiveView::new(options());
    let report = view.sync(&tree("<p>a</p>"), &[]);
    assert!(report.patches.is_empty());
    assert_eq!(view.to_html(), "<html><p data-tessera-node-id=\"1\">a</p></html>");
}

#[test]
fn test_edit_sequence_keeps_view_in_step() {
    let mut view = LiveView::new(options());
    view.load(&tree("<html><body><h1>Title</h1><p>Body</p></body></html>"));

    let edited = tree("<html><body><h1>Title</h1><p>Body</p><p>New</p></body></html>");
    let report = view.sync(&edited, &[]);
    assert_eq!(report.stats.inserted, 1);
    assert_eq!(
        view.to_html(),
        tessera_stage::render_tree(&edited, "data-tessera-node-id").to_html()
    );
}

#[test]
fn test_unchanged_elements_are_skipped() {
    let source = "<html><body><p>a</p><p>b</p></body></html>";
    let mut view = LiveView::new(options());
    view.load(&tree(source));
    let report = view.sync(&tree(source), &[]);
    assert!(report.patches.is_empty());
}

#[test]
fn test_hinted_node_is_refreshed() {
    let source = "<html><body><p>a</p></body></html>";
    let mut view = LiveView::new(options());
    view.load(&tree(source));
    let p = tree(source).find_by_path("0_0_0_0").unwrap().uid;
    let report = view.sync(&tree(source), &[p]);
    assert_eq!(report.stats.updated, 2);
    assert!(report.patches.is_empty());
}

#[test]
fn test_find_rendered_node() {
    let mut view = LiveView::new(options());
    view.load(&tree("<div><span>x</span></div>"));
    assert_eq!(view.find(NodeUid(2)).and_then(StageNode::tag), Some("span"));
    assert!(view.find(NodeUid(99)).is_none());
}

#[test]
fn test_insertion_before_script_does_not_rerun_it() {
    let mut view = LiveView::new(options());
    view.load(&tree("<html><body><script>boot()</script></body></html>"));

    let edited = tree("<html><body><p></p><script>boot()</script></body></html>");
    let report = view.sync(&edited, &[]);
    assert_eq!(report.stats.replaced, 0);
    assert_eq!(report.stats.inserted, 1);
    assert!(report
        .patches
        .iter()
        .all(|patch| !matches!(patch, StagePatch::ReplaceNode { .. } | StagePatch::RemoveNode { .. })));
    assert_eq!(
        view.to_html(),
        tessera_stage::render_tree(&edited, "data-tessera-node-id").to_html()
    );
}
