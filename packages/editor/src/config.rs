use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::EditorResult;

pub const DEFAULT_CONFIG_NAME: &str = "scribe.config.json";

/// Scribe configuration file format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Capabilities to enable, in order
    #[serde(default)]
    pub plugins: Vec<String>,

    /// Inline documents hold text directly, without blocks
    #[serde(default)]
    pub inline: bool,

    /// Whether the editor starts out accepting edits
    #[serde(default)]
    pub editable: bool,
}

impl EditorConfig {
    pub fn new(plugins: &[&str]) -> Self {
        Self {
            plugins: plugins.iter().map(|name| name.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn inline(mut self, inline: bool) -> Self {
        self.inline = inline;
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Load config from a directory
    pub fn load(dir: impl AsRef<Path>) -> EditorResult<Self> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(EditorConfig::default())
        }
    }
}
