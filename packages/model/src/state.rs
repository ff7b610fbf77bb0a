//! # Editor State
//!
//! An [`EditorState`] is an immutable snapshot: document, selection, stored
//! marks and one state field per plugin. Applying a [`Transaction`] produces
//! the next snapshot; plugins compute their fields in registration order,
//! each seeing the fields of the plugins before it on the new state.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::error::ModelResult;
use crate::node::{Mark, Node};
use crate::schema::Schema;
use crate::selection::Selection;
use crate::transaction::Transaction;

/// Receives the transaction a command built
pub type Dispatch<'a> = &'a mut dyn FnMut(Transaction);

/// Returns whether the command applies; dispatches at most one transaction
/// when a dispatch is given.
pub type Command = Rc<dyn Fn(&EditorState, Option<Dispatch<'_>>) -> bool>;

/// Shorter-lived copy of an optional dispatch, for handing it down to
/// another command without giving it up.
pub fn reborrow<'a>(dispatch: &'a mut Option<Dispatch<'_>>) -> Option<Dispatch<'a>> {
    match dispatch {
        Some(dispatch) => Some(&mut **dispatch),
        None => None,
    }
}

static KEY_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Unique key of a plugin instance, also used as its transaction meta key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PluginKey(Arc<str>);

impl PluginKey {
    pub fn new(name: &str) -> Self {
        let id = KEY_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(Arc::from(format!("{name}${id}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait Plugin: 'static {
    type State: Clone + 'static;

    fn key(&self) -> &PluginKey;

    fn init(&self, state: &EditorState) -> Self::State;

    /// Compute this plugin's field for `new` from its value on `old`
    fn apply(&self, tr: &Transaction, value: &Self::State, old: &EditorState, new: &EditorState) -> Self::State;

    fn handle_key(&self, _state: &EditorState, _chord: &str, _dispatch: Dispatch<'_>) -> bool {
        false
    }

    /// `Some` overrides whether the editor accepts user edits
    fn editable(&self, _state: &EditorState) -> Option<bool> {
        None
    }
}

/// Object safe view of a [`Plugin`]
pub trait AnyPlugin {
    fn key(&self) -> &PluginKey;
    fn init_field(&self, state: &EditorState) -> Rc<dyn Any>;
    fn apply_field(&self, tr: &Transaction, value: &Rc<dyn Any>, old: &EditorState, new: &EditorState) -> Rc<dyn Any>;
    fn handle_key(&self, state: &EditorState, chord: &str, dispatch: Dispatch<'_>) -> bool;
    fn editable(&self, state: &EditorState) -> Option<bool>;
}

impl<P: Plugin> AnyPlugin for P {
    fn key(&self) -> &PluginKey {
        Plugin::key(self)
    }

    fn init_field(&self, state: &EditorState) -> Rc<dyn Any> {
        Rc::new(self.init(state))
    }

    fn apply_field(&self, tr: &Transaction, value: &Rc<dyn Any>, old: &EditorState, new: &EditorState) -> Rc<dyn Any> {
        match value.downcast_ref::<P::State>() {
            Some(value) => Rc::new(self.apply(tr, value, old, new)),
            None => {
                warn!(plugin = %Plugin::key(self), "plugin field has an unexpected type, reinitializing");
                Rc::new(self.init(new))
            }
        }
    }

    fn handle_key(&self, state: &EditorState, chord: &str, dispatch: Dispatch<'_>) -> bool {
        Plugin::handle_key(self, state, chord, dispatch)
    }

    fn editable(&self, state: &EditorState) -> Option<bool> {
        Plugin::editable(self, state)
    }
}

pub struct StateConfig {
    pub schema: Arc<Schema>,
    /// Defaults to the schema's empty document
    pub doc: Option<Node>,
    /// Defaults to the start of the document
    pub selection: Option<Selection>,
    pub plugins: Vec<Rc<dyn AnyPlugin>>,
}

#[derive(Clone)]
pub struct EditorState {
    schema: Arc<Schema>,
    doc: Arc<Node>,
    selection: Selection,
    stored_marks: Option<Vec<Mark>>,
    plugins: Rc<[Rc<dyn AnyPlugin>]>,
    fields: Vec<Rc<dyn Any>>,
}

impl EditorState {
    pub fn create(config: StateConfig) -> ModelResult<Self> {
        let doc = match config.doc {
            Some(doc) => {
                doc.check()?;
                doc
            }
            None => config.schema.empty_doc()?,
        };
        let selection = match config.selection {
            Some(selection) => {
                selection.validate(&doc)?;
                selection
            }
            None => Selection::at_start(&doc),
        };

        let mut state = Self {
            schema: config.schema,
            doc: Arc::new(doc),
            selection,
            stored_marks: None,
            plugins: config.plugins.into(),
            fields: Vec::new(),
        };

        let plugins = Rc::clone(&state.plugins);
        for plugin in plugins.iter() {
            let field = plugin.init_field(&state);
            state.fields.push(field);
        }

        Ok(state)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn doc(&self) -> &Arc<Node> {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn stored_marks(&self) -> Option<&[Mark]> {
        self.stored_marks.as_deref()
    }

    pub fn plugins(&self) -> &[Rc<dyn AnyPlugin>] {
        &self.plugins
    }

    pub fn tr(&self) -> Transaction {
        Transaction::new(
            Arc::clone(&self.schema),
            Arc::clone(&self.doc),
            self.selection,
            self.stored_marks.clone(),
        )
    }

    pub fn apply(&self, tr: &Transaction) -> EditorState {
        let selection = tr.selection();
        let stored_marks = if selection.cursor().is_some() {
            tr.stored_marks().map(<[Mark]>::to_vec)
        } else {
            None
        };

        let mut next = Self {
            schema: Arc::clone(&self.schema),
            doc: Arc::clone(tr.doc()),
            selection,
            stored_marks,
            plugins: Rc::clone(&self.plugins),
            fields: Vec::with_capacity(self.fields.len()),
        };

        for (plugin, value) in self.plugins.iter().zip(&self.fields) {
            let field = plugin.apply_field(tr, value, self, &next);
            next.fields.push(field);
        }

        next
    }

    /// Field of the plugin with `key`, once computed
    pub fn field<T: 'static>(&self, key: &PluginKey) -> Option<&T> {
        let index = self.plugins.iter().position(|plugin| plugin.key() == key)?;
        self.fields.get(index)?.downcast_ref::<T>()
    }

    /// The first plugin with an opinion decides; editable otherwise
    pub fn is_editable(&self) -> bool {
        self.plugins
            .iter()
            .find_map(|plugin| plugin.editable(self))
            .unwrap_or(true)
    }
}

impl fmt::Debug for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorState")
            .field("doc", &self.doc)
            .field("selection", &self.selection)
            .field("stored_marks", &self.stored_marks)
            .field("plugins", &self.plugins.iter().map(|plugin| plugin.key().to_string()).collect::<Vec<_>>())
            .finish()
    }
}
