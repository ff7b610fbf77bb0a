use std::rc::Rc;

use regex::Regex;
use scribe_model::{EditorState, Mark, Node, Selection};

use crate::commands::{condition, toggle_block, toggle_mark, toggle_wrapping, CommandFamily, Condition, Predicate};
use crate::equality::Value;

/// Computes a capability's metadata from the live state
pub type MetaGetter = Rc<dyn Fn(&EditorState) -> Value>;

/// First mark named `name` found in the selection
pub fn find_mark(state: &EditorState, name: &str) -> Option<Mark> {
    let mark_type = state.schema().mark_type(name)?;
    let selection = state.selection();
    let mut found = None;

    state.doc().nodes_between(selection.from(), selection.to(), &mut |node: &Node, _pos: usize| {
        if found.is_none() {
            found = mark_type.is_in_set(node.marks()).cloned();
        }
        found.is_none()
    });

    found
}

pub fn mark_is_applied() -> Condition {
    condition(|name, state| find_mark(state, name).is_some())
}

/// Block relative to the selection. `depth` 0 is the block holding the
/// selection, negative values walk outward. A node selection yields the
/// selected node whatever the depth.
pub fn get_block(state: &EditorState, depth: isize) -> Option<&Node> {
    let selection = state.selection();
    if let Selection::Node { from, .. } = selection {
        return state.doc().node_at(from);
    }

    let from = state.doc().resolve(selection.from()).ok()?;
    if from.depth() == 0 || selection.to() > from.end(from.depth()) {
        return None;
    }

    let absolute = usize::try_from(from.depth() as isize + depth).ok()?;
    (absolute <= from.depth()).then(|| from.node(absolute))
}

pub fn current_block(state: &EditorState) -> Option<&Node> {
    get_block(state, 0)
}

pub fn parent_block(state: &EditorState) -> Option<&Node> {
    get_block(state, -1)
}

pub fn current_block_is() -> Condition {
    condition(|name, state| current_block(state).map_or(false, |block| block.type_name() == name))
}

pub fn wrapped_in() -> Condition {
    condition(|name, state| parent_block(state).map_or(false, |block| block.type_name() == name))
}

/// The current block is a textblock with nothing in it
pub fn empty_textblock(state: &EditorState) -> bool {
    current_block(state).map_or(false, |block| block.is_textblock() && block.content_size() == 0)
}

/// Probe a family's toggle without dispatching. No options are passed, so
/// applicability does not depend on the attributes a caller supplies.
fn probe(toggle: CommandFamily) -> Condition {
    Rc::new(move |name: &str| -> Predicate {
        let command = toggle(name)(None);
        Rc::new(move |state: &EditorState| command(state, None))
    })
}

pub fn can_toggle_mark() -> Condition {
    probe(toggle_mark())
}

pub fn can_toggle_block() -> Condition {
    probe(toggle_block())
}

pub fn can_toggle_wrapping() -> Condition {
    probe(toggle_wrapping())
}

/// Selection sits directly in an empty top level block and some ancestor
/// accepts the node at the selection index
pub fn can_embed() -> Condition {
    condition(|name, state| {
        let Some(node_type) = state.schema().node_type(name) else {
            return false;
        };
        let Ok(from) = state.doc().resolve(state.selection().from()) else {
            return false;
        };
        if from.depth() != 1 || current_block(state).map_or(true, |block| block.content_size() != 0) {
            return false;
        }

        (0..=from.depth()).rev().any(|depth| {
            let index = from.index(depth);
            from.node(depth).can_replace_with(index, index, node_type)
        })
    })
}

pub fn attrs_for(node: Option<&Node>) -> Value {
    node.map_or(Value::Null, |node| Value::from(node.attrs()))
}

pub fn mark_attrs(name: &str) -> MetaGetter {
    let name = name.to_string();
    Rc::new(move |state: &EditorState| {
        find_mark(state, &name).map_or(Value::Null, |mark| Value::from(mark.attrs()))
    })
}

pub fn block_attrs() -> MetaGetter {
    Rc::new(|state: &EditorState| attrs_for(current_block(state)))
}

/// Let the first literal space of `pattern` match a non-breaking space too
pub fn accept_nbsp(pattern: &Regex) -> Result<Regex, regex::Error> {
    Regex::new(&pattern.as_str().replacen(' ', "(?: |\u{a0})", 1))
}
