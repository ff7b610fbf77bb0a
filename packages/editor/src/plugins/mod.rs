//! # Editor Plugins
//!
//! Everything the editor hangs off the document model is a [`Plugin`]:
//!
//! ```text
//! EditablePlugin ─ StatePlugin(bold) ─ KeymapPlugin(bold) ─ ... ─ KeymapPlugin(editor) ─ EventsPlugin
//! ```
//!
//! Fields are computed in that order on every transition. State plugins push
//! derived state changes onto the notification queue as they happen; the
//! events plugin runs last and only defers its notifications.
//!
//! [`Plugin`]: scribe_model::Plugin

mod editable;
mod events;
mod keymap;
mod state;

pub use editable::EditablePlugin;
pub use events::EventsPlugin;
pub use keymap::{normalize_chord, KeymapPlugin};
pub use state::{PluginState, StatePlugin};
