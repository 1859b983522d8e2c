use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tessera_parser::parser::DEFAULT_STAGE_NODE_ID_ATTR;
use tessera_parser::{ParseOptions, ReferenceData};
use tessera_stage::ReconcileOptions;

pub const DEFAULT_CONFIG_NAME: &str = "tessera.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Root containers that cannot be removed or moved
    pub protected_tags: Vec<String>,

    /// Wrapper element used by group
    pub group_tag: String,

    /// Attribute mapping rendered nodes back to tree uids
    pub stage_node_id_attr: String,

    /// Attribute marking host-injected nodes in the live view
    pub preserve_attr: String,

    /// Maximum retained history events, 0 for unlimited
    pub history_limit: usize,

    /// JSON reference table replacing the built-in one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_path: Option<String>,

    /// Directory receiving the renderable content of each synced document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_dir: Option<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            protected_tags: vec!["html".to_string(), "head".to_string(), "body".to_string()],
            group_tag: "div".to_string(),
            stage_node_id_attr: DEFAULT_STAGE_NODE_ID_ATTR.to_string(),
            preserve_attr: "data-tessera-preserve".to_string(),
            history_limit: 200,
            reference_path: None,
            preview_dir: None,
        }
    }
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults when absent
    pub fn load(cwd: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_path = cwd.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(EditorConfig::default())
        }
    }

    pub fn is_protected(&self, tag: &str) -> bool {
        self.protected_tags.iter().any(|t| t == tag)
    }

    /// Reference table, read from `reference_path` (relative to `cwd`) when set
    pub fn reference(&self, cwd: impl AsRef<Path>) -> Result<ReferenceData, ConfigError> {
        match &self.reference_path {
            Some(path) => {
                let content = std::fs::read_to_string(cwd.as_ref().join(path))?;
                Ok(ReferenceData::from_json(&content)?)
            }
            None => Ok(ReferenceData::html()),
        }
    }

    pub fn preview_dir(&self, cwd: impl AsRef<Path>) -> Option<PathBuf> {
        self.preview_dir.as_ref().map(|dir| cwd.as_ref().join(dir))
    }

    pub fn parse_options(&self, reference: ReferenceData) -> ParseOptions {
        ParseOptions {
            reference,
            stage_node_id_attr: self.stage_node_id_attr.clone(),
        }
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            stage_node_id_attr: self.stage_node_id_attr.clone(),
            preserve_attr: self.preserve_attr.clone(),
        }
    }
}
