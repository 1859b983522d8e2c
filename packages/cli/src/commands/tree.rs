use super::open_session;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tessera_editor::{NodeTree, NodeUid};
use tessera_parser::{serialize_attributes, NodeKind};

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Markup file to inspect
    pub file: PathBuf,

    /// Include text, comment and doctype nodes
    #[arg(long)]
    pub raw: bool,

    /// Print the tree as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn tree(args: TreeArgs, config: &Config) -> Result<()> {
    let session = open_session(config, &args.file, &[])?;
    let tree: &NodeTree = match (args.raw, session.raw_tree(), session.valid_tree()) {
        (true, Some(raw), _) => raw,
        (false, _, Some(valid)) => valid,
        _ => return Ok(()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(tree)?);
        return Ok(());
    }

    let selected = session.selection().to_vec();
    print_node(tree, tree.root_uid(), 0, &selected);
    Ok(())
}

fn print_node(tree: &NodeTree, uid: NodeUid, depth: usize, selected: &[NodeUid]) {
    let Some(node) = tree.get(uid) else { return };
    let span = node.location().span;
    let label = match &node.data.kind {
        NodeKind::Element { .. } => format!(
            "<{}{}>",
            node.display_name,
            serialize_attributes(&node.data.attribs)
        ),
        NodeKind::Text { content } | NodeKind::Comment { content } => {
            format!("{} {:?}", node.display_name, content.trim())
        }
        _ => node.display_name.clone(),
    };
    let marker = if selected.contains(&uid) { "●" } else { " " };

    println!(
        "{} {}{} {} {}",
        marker.green(),
        "  ".repeat(depth),
        label.bold(),
        node.unique_node_path.cyan(),
        format!(
            "{}:{}-{}:{}",
            span.start_line, span.start_col, span.end_line, span.end_col
        )
        .dimmed()
    );

    for child in &node.children {
        print_node(tree, *child, depth + 1, selected);
    }
}
