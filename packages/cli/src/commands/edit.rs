use super::{open_session, report};
use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use colored::Colorize;
use indexmap::IndexMap;
use std::fs;
use std::path::PathBuf;
use tessera_editor::{EditorSession, NodeAction, NodeUid, PastePosition};
use tracing::debug;

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Markup file to edit in place
    pub file: PathBuf,

    /// Path of a node to select (repeatable); defaults to the initial selection
    #[arg(short, long = "select")]
    pub select: Vec<String>,

    /// Print the edited text instead of writing the file
    #[arg(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub verb: Verb,
}

#[derive(Subcommand, Debug)]
pub enum Verb {
    /// Insert a new element into the selection
    Add { tag: String },

    /// Duplicate the selected nodes
    Duplicate,

    /// Remove the selected nodes
    Remove,

    /// Wrap the selected nodes in a container
    Group,

    /// Unwrap the selected containers
    Ungroup,

    /// Move the selected nodes onto a target
    Move {
        /// Path of the drop target
        target: String,

        /// Child slot on the target
        #[arg(long, default_value_t = 0)]
        position: usize,

        /// Drop between children instead of onto the target
        #[arg(long)]
        between: bool,
    },

    /// Paste markup (or the selection's source when omitted) at a target
    Paste {
        /// Path of the paste target
        target: String,

        #[arg(long, value_enum, default_value = "after")]
        position: Position,

        /// Markup to paste
        content: Option<String>,
    },

    /// Change the tag of the selected elements
    Rename { tag: String },

    /// Replace the attributes of an element
    Settings {
        target: String,

        /// Attribute as name=value (repeatable)
        #[arg(long = "attr")]
        attrs: Vec<String>,
    },

    /// Replace the content of an element
    Text { target: String, content: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Position {
    Before,
    After,
    Inside,
}

impl From<Position> for PastePosition {
    fn from(position: Position) -> Self {
        match position {
            Position::Before => PastePosition::Before,
            Position::After => PastePosition::After,
            Position::Inside => PastePosition::Inside,
        }
    }
}

pub fn edit(args: EditArgs, config: &Config) -> Result<()> {
    let mut session = open_session(config, &args.file, &args.select)?;
    let source = session.text();

    let text = match args.verb {
        Verb::Settings { target, attrs } => {
            let target = node_at(&session, &target)?;
            let attributes = parse_attributes(&attrs)?;
            let settings = session
                .update_settings(target, attributes, args.dry_run)
                .map_err(|err| report(&source, &args.file, err))?;
            if !settings.is_success {
                return Err(anyhow!("Invalid settings value"));
            }
            settings
                .outcome
                .map(|outcome| outcome.text)
                .unwrap_or_else(|| session.text())
        }
        verb => {
            let action = to_action(&mut session, verb)?;
            let name = action.name();
            let outcome = session
                .apply(action, args.dry_run)
                .map_err(|err| report(&source, &args.file, err))?;
            debug!(action = name, edits = outcome.edits.len(), "applied");
            outcome.text
        }
    };

    if args.dry_run {
        print!("{}", text);
        return Ok(());
    }

    fs::write(&args.file, &text)
        .with_context(|| format!("Cannot write {}", args.file.display()))?;
    println!(
        "{} {} → selected {}",
        "✓".green(),
        args.file.display(),
        session.selected_paths().join(", ").cyan()
    );
    Ok(())
}

fn to_action(session: &mut EditorSession, verb: Verb) -> Result<NodeAction> {
    Ok(match verb {
        Verb::Add { tag } => NodeAction::Add { tag },
        Verb::Duplicate => NodeAction::Duplicate,
        Verb::Remove => NodeAction::Remove,
        Verb::Group => NodeAction::Group,
        Verb::Ungroup => NodeAction::Ungroup,
        Verb::Move {
            target,
            position,
            between,
        } => NodeAction::Move {
            target: node_at(session, &target)?,
            is_between: between,
            position,
        },
        Verb::Paste {
            target,
            position,
            content,
        } => {
            // Without explicit markup, paste what the selection copies
            let content = match content {
                Some(content) => content,
                None => session.copy()?.text,
            };
            NodeAction::Paste {
                target: node_at(session, &target)?,
                position: position.into(),
                content: Some(content),
            }
        }
        Verb::Rename { tag } => NodeAction::Rename { tag },
        Verb::Text { target, content } => NodeAction::UpdateText {
            target: node_at(session, &target)?,
            content,
        },
        Verb::Settings { .. } => return Err(anyhow!("settings is not a structural action")),
    })
}

fn node_at(session: &EditorSession, path: &str) -> Result<NodeUid> {
    session
        .valid_tree()
        .and_then(|tree| tree.find_by_path(path))
        .map(|node| node.uid)
        .ok_or_else(|| anyhow!("No node at path {}", path))
}

fn parse_attributes(attrs: &[String]) -> Result<IndexMap<String, String>> {
    attrs
        .iter()
        .map(|attr| match attr.split_once('=') {
            Some((name, value)) => Ok((name.trim().to_string(), value.to_string())),
            None if !attr.trim().is_empty() => Ok((attr.trim().to_string(), String::new())),
            None => Err(anyhow!("Empty attribute")),
        })
        .collect()
}
