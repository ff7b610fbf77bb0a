use scribe_model::{EditorState, Plugin, PluginKey, Transaction};

/// Holds whether the editor accepts user edits. A transaction with a boolean
/// under this plugin's key replaces the flag.
pub struct EditablePlugin {
    key: PluginKey,
    initial: bool,
}

impl EditablePlugin {
    pub fn new(initial: bool) -> Self {
        Self {
            key: PluginKey::new("editable"),
            initial,
        }
    }
}

impl Plugin for EditablePlugin {
    type State = bool;

    fn key(&self) -> &PluginKey {
        &self.key
    }

    fn init(&self, _state: &EditorState) -> bool {
        self.initial
    }

    fn apply(&self, tr: &Transaction, value: &bool, _old: &EditorState, _new: &EditorState) -> bool {
        tr.get_meta(self.key.as_str())
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(*value)
    }

    fn editable(&self, state: &EditorState) -> Option<bool> {
        state.field::<bool>(&self.key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::state_from;
    use scribe_model::Selection;
    use serde_json::json;
    use std::rc::Rc;

    #[test]
    fn test_meta_toggles_editable() {
        let plugin = EditablePlugin::new(false);
        let key = plugin.key().clone();
        let state = state_from(json!({ "type": "doc", "content": [{ "type": "paragraph" }] }), Selection::cursor_at(1), vec![Rc::new(plugin)]);
        assert!(!state.is_editable());

        let mut tr = state.tr();
        tr.set_meta(key.as_str(), true);
        let state = state.apply(&tr);
        assert!(state.is_editable());

        let state = state.apply(&state.tr());
        assert!(state.is_editable());
    }
}
