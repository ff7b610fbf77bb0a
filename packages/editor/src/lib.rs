//! # Scribe Editor
//!
//! Capability layer on top of the document model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: schema, nodes, transactions, state   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ commands + predicates: curried combinators  │
//! │  - name → options → (state, dispatch)       │
//! │  - if_then_else branching on live state     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ capabilities: bold, heading, image, list... │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ plugins: derived state, dedup, events       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: name dispatch, enable/disable, on() │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Commands are values**: a command reports whether it applies and only
//!    dispatches when given a dispatch
//! 2. **Observers see changes only**: derived state is compared structurally
//!    and unchanged records are never re-announced
//! 3. **Notifications after installation**: selection and input events go out
//!    once the new state is in place
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scribe_editor::{Editor, EditorConfig, EventKind};
//!
//! let mut editor = Editor::new(EditorConfig::new(&["bold", "heading"]).editable(true))?;
//! editor.on(EventKind::Plugin, |event| println!("{event:?}"));
//!
//! editor.insert_text("Hello")?;
//! editor.set_selection(Selection::text(1, 6))?;
//! editor.toggle_format("bold", None)?;
//! ```

pub mod capability;
pub mod commands;
pub mod config;
pub mod definitions;
mod editor;
pub mod emitter;
pub mod equality;
mod errors;
pub mod plugins;
pub mod predicates;
pub mod queue;
pub mod registry;
pub mod schemas;

pub use capability::{Capability, CapabilityKind, InputRule, OperationKind};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use editor::Editor;
pub use emitter::{EditorEvent, EventKind, ListenerId};
pub use equality::{is_equal, Value};
pub use errors::{EditorError, EditorResult};
pub use plugins::PluginState;

// Re-export common model types for convenience
pub use scribe_model::{Attrs, NodeJson, Selection};

#[cfg(test)]
pub(crate) mod test_support {
    use std::rc::Rc;
    use std::sync::Arc;

    use scribe_model::{AnyPlugin, EditorState, Node, NodeJson, Schema, Selection, StateConfig};

    use crate::definitions::ALL;
    use crate::schemas::build_schema;

    /// Block schema with every capability's fragment
    pub fn schema() -> Arc<Schema> {
        let names: Vec<String> = ALL.iter().map(|name| name.to_string()).collect();
        Arc::new(build_schema(false, &names).unwrap())
    }

    pub fn paragraph(text: &str) -> serde_json::Value {
        serde_json::json!({ "type": "paragraph", "content": [{ "type": "text", "text": text }] })
    }

    pub fn state_from(doc: serde_json::Value, selection: Selection, plugins: Vec<Rc<dyn AnyPlugin>>) -> EditorState {
        let schema = schema();
        let json: NodeJson = serde_json::from_value(doc).unwrap();
        let doc = Node::from_json(&schema, &json).unwrap();
        EditorState::create(StateConfig {
            schema,
            doc: Some(doc),
            selection: Some(selection),
            plugins,
        })
        .unwrap()
    }

    pub fn state_with(doc: serde_json::Value, selection: Selection) -> EditorState {
        state_from(doc, selection, Vec::new())
    }
}
