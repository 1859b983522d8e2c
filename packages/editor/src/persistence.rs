use crate::errors::PersistError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Destination for rendered previews
pub trait Persistence {
    fn write(&mut self, path: &Path, content: &str) -> Result<(), PersistError>;
}

/// Writes into a directory on disk
pub struct FsPersistence {
    root: PathBuf,
}

impl FsPersistence {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Persistence for FsPersistence {
    fn write(&mut self, path: &Path, content: &str) -> Result<(), PersistError> {
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(target, content)?;
        Ok(())
    }
}

/// Keeps written files in memory for testing
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    pub files: HashMap<PathBuf, String>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for MemoryPersistence {
    fn write(&mut self, path: &Path, content: &str) -> Result<(), PersistError> {
        self.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }
}
