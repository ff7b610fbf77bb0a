use std::rc::Rc;

use scribe_model::{EditorState, PluginKey, Schema};

use crate::capability::Capability;
use crate::definitions::by_name;
use crate::errors::{EditorError, EditorResult};
use crate::plugins::PluginState;

struct Entry {
    capability: Capability,
    state: Rc<PluginState>,
}

/// Enabled capabilities in configuration order, with their latest derived
/// state
#[derive(Default)]
pub struct Registry {
    entries: Vec<Entry>,
}

/// Capabilities for `names`, failing on the first unknown one
pub fn resolve(names: &[String]) -> EditorResult<Vec<Capability>> {
    names
        .iter()
        .map(|name| by_name(name).ok_or_else(|| EditorError::UnknownCapability(name.clone())))
        .collect()
}

/// Every capability must find the types it declares in `schema`
pub fn validate(capabilities: &[Capability], schema: &Schema) -> EditorResult<()> {
    for capability in capabilities {
        for type_name in capability.required_types() {
            if schema.lookup(type_name).is_none() {
                return Err(EditorError::MissingSchemaType {
                    capability: capability.name().to_string(),
                    type_name: type_name.clone(),
                });
            }
        }
    }
    Ok(())
}

impl Registry {
    /// Read the initial derived state of each capability off `state`
    pub fn build(capabilities: Vec<(Capability, PluginKey)>, state: &EditorState) -> Self {
        let entries = capabilities
            .into_iter()
            .map(|(capability, key)| {
                let derived = state
                    .field::<Rc<PluginState>>(&key)
                    .cloned()
                    .unwrap_or_else(|| Rc::new(PluginState::derive(&capability, state)));
                Entry {
                    capability,
                    state: derived,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn capability(&self, name: &str) -> Option<&Capability> {
        self.entry(name).map(|entry| &entry.capability)
    }

    pub fn state(&self, name: &str) -> Option<&Rc<PluginState>> {
        self.entry(name).map(|entry| &entry.state)
    }

    pub fn update(&mut self, state: Rc<PluginState>) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.capability.name() == state.name) {
            entry.state = state;
        }
    }

    pub fn states(&self) -> impl Iterator<Item = &Rc<PluginState>> {
        self.entries.iter().map(|entry| &entry.state)
    }

    pub fn capabilities(&self) -> impl Iterator<Item = &Capability> {
        self.entries.iter().map(|entry| &entry.capability)
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.capability.name() == name)
    }
}
