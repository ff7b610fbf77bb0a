use std::rc::Rc;

use scribe_model::{EditorState, Plugin, PluginKey, Transaction};
use serde::Serialize;
use tracing::debug;

use crate::capability::{Capability, CapabilityKind};
use crate::equality::{is_equal, Value};
use crate::queue::{Notification, NotificationQueue};

/// What observers see of a capability
#[derive(Debug, Clone, Serialize)]
pub struct PluginState {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CapabilityKind,
    pub applicable: bool,
    pub applied: bool,
    pub meta: Value,
}

impl PluginState {
    pub fn derive(capability: &Capability, state: &EditorState) -> Self {
        Self {
            name: capability.name().to_string(),
            kind: capability.kind(),
            applicable: capability.is_applicable(state),
            applied: capability.is_applied(state),
            meta: capability.meta(state),
        }
    }

    pub fn to_value(&self) -> Value {
        let kind = match self.kind {
            CapabilityKind::Format => "Format",
            CapabilityKind::Embed => "Embed",
            CapabilityKind::Input => "Input",
        };
        Value::object([
            ("name", Value::from(self.name.as_str())),
            ("type", Value::from(kind)),
            ("applicable", Value::from(self.applicable)),
            ("applied", Value::from(self.applied)),
            ("meta", self.meta.clone()),
        ])
    }
}

/// Keeps one capability's derived state as a plugin field
pub struct StatePlugin {
    key: PluginKey,
    capability: Capability,
    queue: NotificationQueue,
}

impl StatePlugin {
    pub fn new(capability: Capability, queue: NotificationQueue) -> Self {
        Self {
            key: PluginKey::new(capability.name()),
            capability,
            queue,
        }
    }
}

impl Plugin for StatePlugin {
    type State = Rc<PluginState>;

    fn key(&self) -> &PluginKey {
        &self.key
    }

    fn init(&self, state: &EditorState) -> Rc<PluginState> {
        let derived = Rc::new(PluginState::derive(&self.capability, state));
        self.queue.push_immediate(Notification::Plugin(Rc::clone(&derived)));
        derived
    }

    fn apply(&self, _tr: &Transaction, value: &Rc<PluginState>, _old: &EditorState, new: &EditorState) -> Rc<PluginState> {
        let next = PluginState::derive(&self.capability, new);
        if is_equal(&value.to_value(), &next.to_value()) {
            return Rc::clone(value);
        }

        debug!(capability = %next.name, applicable = next.applicable, applied = next.applied, "plugin state changed");
        let next = Rc::new(next);
        self.queue.push_immediate(Notification::Plugin(Rc::clone(&next)));
        next
    }
}
