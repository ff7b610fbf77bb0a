//! # Editor Facade
//!
//! One entry point per operation kind, dispatched by capability name:
//!
//! ```text
//! format("bold") ─> registry lookup ─> applicable? ─> operation(kind) ─> command(state, dispatch)
//!                      NotFound        NotApplicable   UnsupportedOperation        │
//!                                                                                  ▼
//!                                     observers <─ flush queue <─ plugins <─ state.apply(tr)
//! ```
//!
//! Enabling or disabling capabilities rebuilds the schema, the plugins and
//! the state. The current document is carried over through its JSON form and
//! coerced into the new schema.

use std::rc::Rc;
use std::sync::Arc;

use scribe_model::{AnyPlugin, Attrs, EditorState, Node, NodeJson, PluginKey, Schema, Selection, StateConfig, Transaction};
use tracing::{debug, info};

use crate::capability::{Capability, InputRule, OperationKind};
use crate::commands::insert_hard_break;
use crate::config::EditorConfig;
use crate::emitter::{EditorEvent, Emitter, EventKind, Listener, ListenerId};
use crate::errors::{EditorError, EditorResult};
use crate::plugins::{EditablePlugin, EventsPlugin, KeymapPlugin, PluginState, StatePlugin};
use crate::queue::{Notification, NotificationQueue};
use crate::registry::{self, Registry};
use crate::schemas::build_schema;

/// Everything rebuilt together when the capability set changes
struct Session {
    schema: Arc<Schema>,
    state: EditorState,
    registry: Registry,
    queue: NotificationQueue,
    editable_key: PluginKey,
}

impl Session {
    fn build(
        config: &EditorConfig,
        doc: Option<&NodeJson>,
        selection: Option<Selection>,
        editable: bool,
    ) -> EditorResult<Self> {
        let capabilities = registry::resolve(&config.plugins)?;
        let schema = Arc::new(build_schema(config.inline, &config.plugins)?);
        registry::validate(&capabilities, &schema)?;

        let doc = match doc {
            Some(json) => Node::coerce_json(&schema, json)?,
            None => schema.empty_doc()?,
        };
        let selection = match selection {
            Some(selection) if selection.validate(&doc).is_ok() => selection,
            Some(selection) => Selection::near(&doc, selection.from()),
            None => Selection::at_start(&doc),
        };

        let queue = NotificationQueue::new();
        let editable_plugin = EditablePlugin::new(editable);
        let editable_key = scribe_model::Plugin::key(&editable_plugin).clone();

        let mut plugins: Vec<Rc<dyn AnyPlugin>> = vec![Rc::new(editable_plugin)];
        let mut keyed = Vec::with_capacity(capabilities.len());
        for capability in capabilities {
            let plugin = StatePlugin::new(capability.clone(), queue.clone());
            keyed.push((capability.clone(), scribe_model::Plugin::key(&plugin).clone()));
            plugins.push(Rc::new(plugin));

            if !capability.keymap().is_empty() {
                plugins.push(Rc::new(KeymapPlugin::new(capability.name(), capability.keymap())));
            }
        }
        let hard_break = if config.inline { "Enter" } else { "Mod-Enter" };
        plugins.push(Rc::new(KeymapPlugin::new(
            "editor",
            &[(hard_break.to_string(), insert_hard_break())],
        )));
        plugins.push(Rc::new(EventsPlugin::new(queue.clone())));

        let state = EditorState::create(StateConfig {
            schema: Arc::clone(&schema),
            doc: Some(doc),
            selection: Some(selection),
            plugins,
        })?;
        let registry = Registry::build(keyed, &state);

        info!(capabilities = ?config.plugins, inline = config.inline, "editor set up");

        Ok(Self {
            schema,
            state,
            registry,
            queue,
            editable_key,
        })
    }
}

pub struct Editor {
    config: EditorConfig,
    session: Session,
    emitter: Emitter,
    selection: Option<Selection>,
}

impl Editor {
    pub fn new(config: EditorConfig) -> EditorResult<Self> {
        Self::with_listeners(config, Vec::new())
    }

    /// Build an editor whose listeners also see the initial plugin
    /// notifications
    pub fn with_listeners(config: EditorConfig, listeners: Vec<(EventKind, Listener)>) -> EditorResult<Self> {
        let session = Session::build(&config, None, None, config.editable)?;
        let mut emitter = Emitter::new();
        for (kind, listener) in listeners {
            emitter.on(kind, listener);
        }

        let mut editor = Self {
            config,
            session,
            emitter,
            selection: None,
        };
        editor.flush();
        Ok(editor)
    }

    pub fn state(&self) -> &EditorState {
        &self.session.state
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.session.schema
    }

    /// Enabled capability names, in order
    pub fn plugins(&self) -> &[String] {
        &self.config.plugins
    }

    pub fn is_inline(&self) -> bool {
        self.config.inline
    }

    /// Last non-empty selection reported to observers
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Derived state of every enabled capability
    pub fn capabilities(&self) -> Vec<Rc<PluginState>> {
        self.session.registry.states().cloned().collect()
    }

    pub fn capability(&self, name: &str) -> Option<Rc<PluginState>> {
        self.session.registry.state(name).cloned()
    }

    /// Autoformat rules of the enabled capabilities
    pub fn input_rules(&self) -> Vec<InputRule> {
        self.session
            .registry
            .capabilities()
            .flat_map(|capability| capability.input_rules(&self.session.schema))
            .collect()
    }

    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&EditorEvent) + 'static,
    {
        self.emitter.on(kind, Box::new(listener))
    }

    pub fn off(&mut self, kind: EventKind, id: ListenerId) -> bool {
        self.emitter.off(kind, id)
    }

    pub fn format(&mut self, name: &str, options: Option<Attrs>) -> EditorResult<bool> {
        self.with_capability(name, OperationKind::Apply, options)
    }

    pub fn remove_format(&mut self, name: &str) -> EditorResult<bool> {
        self.with_capability(name, OperationKind::Remove, None)
    }

    pub fn toggle_format(&mut self, name: &str, options: Option<Attrs>) -> EditorResult<bool> {
        self.with_capability(name, OperationKind::Toggle, options)
    }

    pub fn embed(&mut self, name: &str, options: Option<Attrs>) -> EditorResult<bool> {
        self.with_capability(name, OperationKind::Embed, options)
    }

    /// Enable capabilities ahead of the current ones; already enabled names
    /// are ignored
    pub fn enable_capabilities(&mut self, names: &[&str]) -> EditorResult<()> {
        let mut plugins: Vec<String> = Vec::with_capacity(names.len() + self.config.plugins.len());
        for name in names {
            if !self.config.plugins.iter().any(|enabled| enabled == name) && !plugins.iter().any(|added| added == name) {
                plugins.push(name.to_string());
            }
        }
        plugins.extend(self.config.plugins.iter().cloned());
        self.rebuild(plugins)
    }

    pub fn disable_capabilities(&mut self, names: &[&str]) -> EditorResult<()> {
        let plugins = self
            .config
            .plugins
            .iter()
            .filter(|enabled| !names.contains(&enabled.as_str()))
            .cloned()
            .collect();
        self.rebuild(plugins)
    }

    pub fn is_editable(&self) -> bool {
        self.session.state.is_editable()
    }

    pub fn set_editable(&mut self, editable: bool) {
        let mut tr = self.session.state.tr();
        tr.set_meta(self.session.editable_key.as_str(), editable);
        self.dispatch(tr);
    }

    pub fn focus(&mut self) {
        self.emitter.emit(&EditorEvent::Focus);
    }

    pub fn blur(&mut self) {
        self.emitter.emit(&EditorEvent::Blur);
    }

    pub fn set_selection(&mut self, selection: Selection) -> EditorResult<()> {
        let mut tr = self.session.state.tr();
        tr.set_selection(selection)?;
        self.dispatch(tr);
        Ok(())
    }

    /// Type `text` over the selection
    pub fn insert_text(&mut self, text: &str) -> EditorResult<()> {
        if !self.is_editable() {
            return Err(EditorError::ReadOnly);
        }
        let mut tr = self.session.state.tr();
        tr.insert_text(text)?;
        self.dispatch(tr);
        Ok(())
    }

    /// Offer a key chord to the keymaps, first taker wins
    pub fn handle_key(&mut self, chord: &str) -> EditorResult<bool> {
        if !self.is_editable() {
            return Err(EditorError::ReadOnly);
        }

        let state = self.session.state.clone();
        for plugin in state.plugins() {
            if plugin.handle_key(&state, chord, &mut |tr: Transaction| self.dispatch(tr)) {
                debug!(chord, "key handled");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Replace the whole document, coercing it into the current schema
    pub fn set_content(&mut self, json: &NodeJson) -> EditorResult<()> {
        let doc = Node::coerce_json(&self.session.schema, json)?;
        let mut tr = self.session.state.tr();
        let size = tr.doc().content_size();
        tr.replace_with(0, size, doc.children().to_vec())?;
        self.dispatch(tr);
        Ok(())
    }

    pub fn content(&self) -> NodeJson {
        self.session.state.doc().to_json()
    }

    fn with_capability(&mut self, name: &str, kind: OperationKind, options: Option<Attrs>) -> EditorResult<bool> {
        let registry = &self.session.registry;
        let capability: &Capability = registry
            .capability(name)
            .ok_or_else(|| EditorError::NotFound(name.to_string()))?;
        if !registry.state(name).map_or(false, |state| state.applicable) {
            return Err(EditorError::NotApplicable(name.to_string()));
        }
        let operation = capability
            .operation(kind)
            .ok_or_else(|| EditorError::UnsupportedOperation {
                name: name.to_string(),
                operation: kind.to_string(),
            })?;

        let command = operation(options);
        let state = self.session.state.clone();
        let applied = command(&state, Some(&mut |tr: Transaction| self.dispatch(tr)));
        debug!(capability = name, operation = %kind, applied, "ran capability");
        Ok(applied)
    }

    fn dispatch(&mut self, tr: Transaction) {
        self.session.state = self.session.state.apply(&tr);
        self.flush();
    }

    /// Deliver queued notifications: plugin state first, then selection and
    /// input
    fn flush(&mut self) {
        for notification in self.session.queue.drain() {
            let event = match notification {
                Notification::Plugin(state) => {
                    self.session.registry.update(Rc::clone(&state));
                    EditorEvent::Plugin(state)
                }
                Notification::Select(selection) => {
                    self.selection = selection;
                    EditorEvent::Select(selection)
                }
                Notification::Input => EditorEvent::Input,
            };
            self.emitter.emit(&event);
        }
    }

    fn rebuild(&mut self, plugins: Vec<String>) -> EditorResult<()> {
        let config = EditorConfig {
            plugins,
            ..self.config.clone()
        };
        let doc = self.content();
        let session = Session::build(&config, Some(&doc), Some(self.session.state.selection()), self.is_editable())?;

        self.config = config;
        self.session = session;
        self.flush();
        Ok(())
    }
}
