use scribe_model::{EditorState, Plugin, PluginKey, Transaction};

use crate::queue::{Notification, NotificationQueue};

/// Tracks the non-empty selection and defers `select` and `input`
/// notifications until the transition is installed
pub struct EventsPlugin {
    key: PluginKey,
    queue: NotificationQueue,
}

impl EventsPlugin {
    pub fn new(queue: NotificationQueue) -> Self {
        Self {
            key: PluginKey::new("events"),
            queue,
        }
    }
}

impl Plugin for EventsPlugin {
    /// Boundaries of the current selection, `None` while it is empty
    type State = Option<(usize, usize)>;

    fn key(&self) -> &PluginKey {
        &self.key
    }

    fn init(&self, state: &EditorState) -> Self::State {
        boundaries(state)
    }

    fn apply(&self, tr: &Transaction, value: &Self::State, _old: &EditorState, new: &EditorState) -> Self::State {
        let selection = new.selection();
        let boundaries = boundaries(new);

        if boundaries != *value {
            self.queue
                .defer(Notification::Select(boundaries.map(|_| selection)));
        }
        if tr.doc_changed() {
            self.queue.defer(Notification::Input);
        }

        boundaries
    }
}

fn boundaries(state: &EditorState) -> Option<(usize, usize)> {
    let selection = state.selection();
    (!selection.empty()).then(|| (selection.from(), selection.to()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{paragraph, state_from};
    use scribe_model::Selection;
    use serde_json::json;
    use std::rc::Rc;

    #[test]
    fn test_select_and_input() {
        let queue = NotificationQueue::new();
        let state = state_from(
            json!({ "type": "doc", "content": [paragraph("hello")] }),
            Selection::cursor_at(1),
            vec![Rc::new(EventsPlugin::new(queue.clone()))],
        );

        let mut tr = state.tr();
        tr.set_selection(Selection::text(1, 3)).unwrap();
        let state = state.apply(&tr);
        let drained = queue.drain();
        assert_eq!(drained.len(), 1);
        assert!(matches!(drained[0], Notification::Select(Some(selection)) if selection == Selection::text(1, 3)));

        // Same boundaries, nothing new
        let state = state.apply(&state.tr());
        assert!(queue.is_empty());

        let mut tr = state.tr();
        tr.insert_text("J").unwrap();
        let _state = state.apply(&tr);
        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0], Notification::Select(None)));
        assert!(matches!(drained[1], Notification::Input));
    }

    #[test]
    fn test_starts_from_initial_selection() {
        let queue = NotificationQueue::new();
        let state = state_from(
            json!({ "type": "doc", "content": [paragraph("hello")] }),
            Selection::text(1, 4),
            vec![Rc::new(EventsPlugin::new(queue.clone()))],
        );

        let state = state.apply(&state.tr());
        assert!(queue.is_empty());

        let mut tr = state.tr();
        tr.set_selection(Selection::text(4, 1)).unwrap();
        state.apply(&tr);
        assert!(queue.is_empty());
    }
}
