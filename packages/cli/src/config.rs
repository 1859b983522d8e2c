use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tessera_editor::{EditorConfig, EditorSession, FsPersistence, ReferenceData};

/// Editor configuration and reference table for one working directory
#[derive(Debug, Clone)]
pub struct Config {
    pub cwd: PathBuf,
    pub editor: EditorConfig,
    pub reference: ReferenceData,
}

impl Config {
    /// Load `tessera.config.json` from `cwd`, defaults when absent
    pub fn load(cwd: &Path) -> Result<Self> {
        let editor = EditorConfig::load(cwd)
            .with_context(|| format!("Cannot load config in {}", cwd.display()))?;
        let reference = editor
            .reference(cwd)
            .context("Cannot load reference table")?;
        Ok(Self {
            cwd: cwd.to_path_buf(),
            editor,
            reference,
        })
    }

    /// Session writing previews to `previewDir` when configured
    pub fn session(&self) -> EditorSession {
        let session = EditorSession::new(self.editor.clone(), self.reference.clone());
        match self.editor.preview_dir(&self.cwd) {
            Some(dir) => session.with_persistence(Box::new(FsPersistence::new(dir))),
            None => session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.editor.group_tag, "div");
        assert!(config.reference.get("div").is_some());
    }

    #[test]
    fn test_session_persists_preview() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(tessera_editor::DEFAULT_CONFIG_NAME),
            r#"{"previewDir": "preview"}"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        let mut session = config.session();
        session.open("index.html", "<p></p>").unwrap();
        assert!(dir.path().join("preview/index.html").exists());
    }
}
