pub mod inspect;
pub mod ops;
pub mod run;

pub use inspect::{inspect, InspectArgs};
pub use run::{run, RunArgs};

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use scribe_editor::{Editor, EditorConfig, NodeJson};

/// Build an editor from the directory's config, optionally loading a
/// document JSON file into it
pub fn open_editor(cwd: &Path, document: Option<&Path>, editable: bool) -> Result<Editor> {
    let mut config = EditorConfig::load(cwd)?;
    if editable {
        config.editable = true;
    }
    tracing::debug!(plugins = ?config.plugins, inline = config.inline, "loaded config");

    let mut editor = Editor::new(config)?;
    if let Some(path) = document {
        let source = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
        let json: NodeJson =
            serde_json::from_str(&source).with_context(|| format!("Invalid document JSON in {}", path.display()))?;
        editor.set_content(&json)?;
    }
    Ok(editor)
}
