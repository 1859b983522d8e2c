pub mod live_view;
pub mod reconciler;
pub mod render;
pub mod vdom;

pub use live_view::LiveView;
pub use reconciler::{
    classify, reconcile, Policy, ReconcileOptions, ReconcileReport, ReconcileStats, StagePatch,
};
pub use render::render_tree;
pub use vdom::StageNode;
