use crate::reconciler::{reconcile, ReconcileOptions, ReconcileReport};
use crate::render::render_tree;
use crate::vdom::StageNode;
use std::collections::HashSet;
use tessera_parser::{NodeTree, NodeUid};
use tracing::{debug, instrument};

/// The rendered live view of the document being edited
#[derive(Debug, Clone)]
pub struct LiveView {
    root: Option<StageNode>,
    options: ReconcileOptions,
}

impl LiveView {
    pub fn new(options: ReconcileOptions) -> Self {
        Self {
            root: None,
            options,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.root.is_some()
    }

    pub fn root(&self) -> Option<&StageNode> {
        self.root.as_ref()
    }

    /// Discard the current view and render `tree` from scratch. Used when a
    /// different document is opened.
    pub fn load(&mut self, tree: &NodeTree) {
        debug!(nodes = tree.len(), "loading live view");
        self.root = Some(render_tree(tree, &self.options.stage_node_id_attr));
    }

    /// Bring the view up to date with `tree`, forcing a refresh of `hints`.
    #[instrument(skip(self, tree), fields(hints = hints.len()))]
    pub fn sync(&mut self, tree: &NodeTree, hints: &[NodeUid]) -> ReconcileReport {
        let fresh = render_tree(tree, &self.options.stage_node_id_attr);
        let Some(root) = self.root.as_mut() else {
            self.root = Some(fresh);
            return ReconcileReport::default();
        };
        let hints: HashSet<String> = hints.iter().map(|uid| uid.to_string()).collect();
        reconcile(root, &fresh, &hints, &self.options)
    }

    /// Rendered element for a tree node
    pub fn find(&self, uid: NodeUid) -> Option<&StageNode> {
        self.root
            .as_ref()?
            .find_by_attr(&self.options.stage_node_id_attr, &uid.to_string())
    }

    pub fn to_html(&self) -> String {
        self.root.as_ref().map(StageNode::to_html).unwrap_or_default()
    }
}
