pub mod copy;
pub mod edit;
pub mod tree;

pub use copy::{copy, CopyArgs};
pub use edit::{edit, EditArgs};
pub use tree::{tree, TreeArgs};

use crate::config::Config;
use anyhow::{anyhow, Result};
use std::fs;
use std::path::Path;
use tessera_editor::{EditorError, EditorSession};
use tessera_parser::format_error;

/// Open `file` in a fresh session and select `paths` (the initial selection
/// is kept when `paths` is empty).
pub(crate) fn open_session(config: &Config, file: &Path, paths: &[String]) -> Result<EditorSession> {
    let source = fs::read_to_string(file)
        .map_err(|err| anyhow!("Cannot read {}: {}", file.display(), err))?;

    let mut session = config.session();
    if let Err(err) = session.open(file, &source) {
        return Err(report(&source, file, err));
    }

    if !paths.is_empty() {
        let selected = session.select_paths(paths);
        if selected.len() != paths.len() {
            return Err(anyhow!("No node at some of the paths {:?}", paths));
        }
    }
    Ok(session)
}

/// Turn an editor error into a printable one, rendering parse errors
/// against their source.
pub(crate) fn report(source: &str, file: &Path, err: EditorError) -> anyhow::Error {
    match err {
        EditorError::Parse(parse_err) => {
            eprintln!("{}", format_error(source, &file.display().to_string(), &parse_err));
            anyhow!("Failed to parse {}", file.display())
        }
        other => other.into(),
    }
}
