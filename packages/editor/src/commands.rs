//! # Command Algebra
//!
//! Capability operations are curried: a [`CommandFamily`] takes the name of a
//! schema type and yields an [`Operation`], which takes optional attributes
//! and yields a model [`Command`]. Families compose with [`if_then_else`],
//! which picks a branch from a [`Condition`] evaluated on the live state.
//!
//! ```text
//! toggle_block = if_then_else(current_block_is, reset_block, set_block_to)
//!
//! toggle_block()("heading")(attrs)(&state, dispatch)
//! ```
//!
//! Engine commands that work on resolved `MarkType`/`NodeType` values are
//! lifted into the name based form with [`convert_mark_command`] and
//! [`convert_node_command`].

use std::rc::Rc;
use std::sync::Arc;

use scribe_model::commands as engine;
use scribe_model::{Attrs, Command, Dispatch, EditorState, MarkType, NodeType, Selection};
use tracing::error;

use crate::predicates::{current_block_is, empty_textblock, mark_is_applied, wrapped_in};

/// Block type blocks are reset to
pub const DEFAULT_BLOCK_TYPE: &str = "paragraph";

pub type Operation = Rc<dyn Fn(Option<Attrs>) -> Command>;
pub type CommandFamily = Rc<dyn Fn(&str) -> Operation>;
pub type Predicate = Rc<dyn Fn(&EditorState) -> bool>;
pub type Condition = Rc<dyn Fn(&str) -> Predicate>;

/// Build a family from a body receiving every curried argument at once
pub fn family<F>(body: F) -> CommandFamily
where
    F: Fn(&str, Option<&Attrs>, &EditorState, Option<Dispatch<'_>>) -> bool + 'static,
{
    let body = Rc::new(body);
    Rc::new(move |name: &str| -> Operation {
        let body = Rc::clone(&body);
        let name: Rc<str> = Rc::from(name);
        Rc::new(move |attrs: Option<Attrs>| -> Command {
            let body = Rc::clone(&body);
            let name = Rc::clone(&name);
            Rc::new(move |state: &EditorState, dispatch: Option<Dispatch<'_>>| {
                body(&name, attrs.as_ref(), state, dispatch)
            })
        })
    })
}

pub fn condition<F>(test: F) -> Condition
where
    F: Fn(&str, &EditorState) -> bool + 'static,
{
    let test = Rc::new(test);
    Rc::new(move |name: &str| -> Predicate {
        let test = Rc::clone(&test);
        let name = name.to_string();
        Rc::new(move |state: &EditorState| test(&name, state))
    })
}

/// Delegate wholesale to `when_true` or `when_false`, depending on the
/// condition at call time
pub fn if_then_else(when: Condition, when_true: CommandFamily, when_false: CommandFamily) -> CommandFamily {
    Rc::new(move |name: &str| -> Operation {
        let test = when(name);
        let (on_true, on_false) = (when_true(name), when_false(name));
        Rc::new(move |attrs: Option<Attrs>| -> Command {
            let test = Rc::clone(&test);
            let (on_true, on_false) = (on_true(attrs.clone()), on_false(attrs));
            Rc::new(move |state: &EditorState, dispatch: Option<Dispatch<'_>>| {
                if test(state) {
                    on_true(state, dispatch)
                } else {
                    on_false(state, dispatch)
                }
            })
        })
    })
}

/// A family that ignores its arguments and returns `value`
pub fn respond_with(value: bool) -> CommandFamily {
    family(move |_, _, _, _| value)
}

pub fn noop() -> CommandFamily {
    respond_with(false)
}

pub fn convert_mark_command<F>(command: F) -> CommandFamily
where
    F: Fn(Arc<MarkType>, Option<Attrs>) -> Command + 'static,
{
    family(move |name, attrs, state, dispatch| match state.schema().mark_type(name) {
        Some(mark_type) => command(Arc::clone(mark_type), attrs.cloned())(state, dispatch),
        None => {
            error!(mark = name, "mark type is not part of the schema");
            false
        }
    })
}

pub fn convert_node_command<F>(command: F) -> CommandFamily
where
    F: Fn(Arc<NodeType>, Option<Attrs>) -> Command + 'static,
{
    family(move |name, attrs, state, dispatch| match state.schema().node_type(name) {
        Some(node_type) => command(Arc::clone(node_type), attrs.cloned())(state, dispatch),
        None => {
            error!(node = name, "node type is not part of the schema");
            false
        }
    })
}

pub fn toggle_mark() -> CommandFamily {
    convert_mark_command(engine::toggle_mark)
}

/// Add the mark unless some of the selection already carries it
pub fn apply_mark() -> CommandFamily {
    if_then_else(mark_is_applied(), noop(), toggle_mark())
}

pub fn remove_mark() -> CommandFamily {
    if_then_else(mark_is_applied(), toggle_mark(), noop())
}

pub fn set_block_to() -> CommandFamily {
    convert_node_command(engine::set_block_type)
}

/// Turn the current block back into a paragraph, whatever name it is given
pub fn reset_block() -> CommandFamily {
    let set_block_to = set_block_to();
    Rc::new(move |_name: &str| set_block_to(DEFAULT_BLOCK_TYPE))
}

pub fn toggle_block() -> CommandFamily {
    if_then_else(current_block_is(), reset_block(), set_block_to())
}

pub fn wrap_in() -> CommandFamily {
    if_then_else(wrapped_in(), noop(), convert_node_command(engine::wrap_in))
}

pub fn unwrap_from() -> CommandFamily {
    let lift = engine::lift();
    if_then_else(wrapped_in(), family(move |_, _, state, dispatch| lift(state, dispatch)), noop())
}

pub fn toggle_wrapping() -> CommandFamily {
    if_then_else(wrapped_in(), unwrap_from(), wrap_in())
}

pub fn split_list_item() -> CommandFamily {
    convert_node_command(|item_type, _| engine::split_list_item(item_type))
}

/// Replace the selection with a `hard_break`
pub fn insert_hard_break() -> Command {
    Rc::new(|state: &EditorState, dispatch: Option<Dispatch<'_>>| {
        let Some(hard_break) = state.schema().node_type("hard_break") else {
            error!(node = "hard_break", "node type is not part of the schema");
            return false;
        };
        let hard_break = Arc::clone(hard_break);

        engine::dispatch_with(state, dispatch, |tr| {
            tr.replace_selection_with(hard_break.create(None, Vec::new())?)?;
            Ok(())
        })
    })
}

/// Range of the block the selection is in: the selected node itself, or the
/// textblock around a text selection
fn current_block_range(state: &EditorState) -> Option<(usize, usize)> {
    let selection = state.selection();
    if let Selection::Node { from, to } = selection {
        return Some((from, to));
    }
    let resolved = state.doc().resolve(selection.from()).ok()?;
    let depth = resolved.depth();
    if depth == 0 {
        return None;
    }
    Some((resolved.before(depth).ok()?, resolved.after(depth).ok()?))
}

/// Swap the current block for a fresh node and select it
fn replace_current_block() -> CommandFamily {
    family(|name, attrs, state, dispatch| {
        let Some(node_type) = state.schema().node_type(name) else {
            error!(node = name, "node type is not part of the schema");
            return false;
        };
        let Some((start, end)) = current_block_range(state) else {
            return false;
        };

        engine::dispatch_with(state, dispatch, |tr| {
            let node = node_type.create_and_fill(state.schema(), attrs)?;
            tr.replace(start, end, node)?;
            let selection = Selection::node(tr.doc(), start)?;
            tr.set_selection(selection)?;
            Ok(())
        })
    })
}

/// Put a fresh node right before the current block, leaving it untouched
fn insert_block_before() -> CommandFamily {
    family(|name, attrs, state, dispatch| {
        let Some(node_type) = state.schema().node_type(name) else {
            error!(node = name, "node type is not part of the schema");
            return false;
        };
        let Some((start, _)) = current_block_range(state) else {
            return false;
        };

        engine::dispatch_with(state, dispatch, |tr| {
            let node = node_type.create_and_fill(state.schema(), attrs)?;
            tr.insert(start, node)?;
            Ok(())
        })
    })
}

/// The current block holds an instance of the node, or nothing worth keeping
fn occupies() -> Condition {
    let is_current = current_block_is();
    Rc::new(move |name: &str| -> Predicate {
        let is_current = is_current(name);
        Rc::new(move |state: &EditorState| is_current(state) || empty_textblock(state))
    })
}

pub fn embed() -> CommandFamily {
    if_then_else(occupies(), replace_current_block(), insert_block_before())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{paragraph, state_with};
    use scribe_model::Transaction;
    use serde_json::json;
    use std::cell::Cell;

    fn run(state: &EditorState, command: Command) -> Option<EditorState> {
        let mut next = None;
        let mut capture = |tr: Transaction| next = Some(state.apply(&tr));
        command(state, Some(&mut capture as Dispatch<'_>));
        next
    }

    #[test]
    fn test_if_then_else_picks_branch_per_call() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let when = condition(|name, _| name == "yes");
        let counting = family(move |_, _, _, _| {
            seen.set(seen.get() + 1);
            true
        });
        let choose = if_then_else(when, counting, noop());

        let state = state_with(json!({ "type": "doc", "content": [paragraph("x")] }), Selection::cursor_at(1));
        assert!(choose("yes")(None)(&state, None));
        assert!(!choose("no")(None)(&state, None));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_missing_type_returns_false() {
        let state = state_with(json!({ "type": "doc", "content": [paragraph("x")] }), Selection::text(1, 2));
        assert!(!toggle_mark()("strike")(None)(&state, None));
        assert!(!set_block_to()("code_block")(None)(&state, None));
    }

    #[test]
    fn test_apply_mark_is_idempotent() {
        let state = state_with(json!({ "type": "doc", "content": [paragraph("bold")] }), Selection::text(1, 5));

        let applied = run(&state, apply_mark()("bold")(None)).unwrap();
        assert!(run(&applied, apply_mark()("bold")(None)).is_none());
        assert!(!apply_mark()("bold")(None)(&applied, None));

        let removed = run(&applied, remove_mark()("bold")(None)).unwrap();
        assert_eq!(removed.doc(), state.doc());
        assert!(run(&removed, remove_mark()("bold")(None)).is_none());
    }

    #[test]
    fn test_toggle_block_round_trip() {
        let state = state_with(json!({ "type": "doc", "content": [paragraph("title")] }), Selection::cursor_at(2));
        let attrs = json!({ "level": 2 }).as_object().cloned();

        let heading = run(&state, toggle_block()("heading")(attrs.clone())).unwrap();
        assert_eq!(heading.doc().child(0).type_name(), "heading");

        let reset = run(&heading, toggle_block()("heading")(attrs)).unwrap();
        assert_eq!(reset.doc(), state.doc());
    }

    #[test]
    fn test_wrap_lifecycle() {
        let state = state_with(json!({ "type": "doc", "content": [paragraph("quote")] }), Selection::cursor_at(2));

        assert!(!unwrap_from()("blockquote")(None)(&state, None));
        let wrapped = run(&state, toggle_wrapping()("blockquote")(None)).unwrap();
        assert_eq!(wrapped.doc().child(0).type_name(), "blockquote");
        assert!(!wrap_in()("blockquote")(None)(&wrapped, None));

        let unwrapped = run(&wrapped, toggle_wrapping()("blockquote")(None)).unwrap();
        assert_eq!(unwrapped.doc(), state.doc());
    }

    #[test]
    fn test_embed_replaces_empty_block() {
        let state = state_with(json!({ "type": "doc", "content": [{ "type": "paragraph" }] }), Selection::cursor_at(1));
        let attrs = json!({ "src": "cat.png" }).as_object().cloned();

        let next = run(&state, embed()("image")(attrs)).unwrap();
        assert_eq!(next.doc().child_count(), 1);
        assert_eq!(next.doc().child(0).type_name(), "image");
        assert_eq!(next.selection(), Selection::Node { from: 0, to: 1 });
    }

    #[test]
    fn test_embed_inserts_before_text() {
        let state = state_with(json!({ "type": "doc", "content": [paragraph("keep")] }), Selection::cursor_at(3));
        let attrs = json!({ "src": "cat.png" }).as_object().cloned();

        let next = run(&state, embed()("image")(attrs)).unwrap();
        assert_eq!(next.doc().child_count(), 2);
        assert_eq!(next.doc().child(0).type_name(), "image");
        assert_eq!(next.doc().child(1), state.doc().child(0));
        assert_eq!(next.selection(), Selection::cursor_at(4));
    }

    #[test]
    fn test_embed_without_required_attrs_fails() {
        let state = state_with(json!({ "type": "doc", "content": [{ "type": "paragraph" }] }), Selection::cursor_at(1));
        assert!(run(&state, embed()("image")(None)).is_none());
    }

    #[test]
    fn test_insert_hard_break() {
        let state = state_with(json!({ "type": "doc", "content": [paragraph("ab")] }), Selection::cursor_at(2));
        let next = run(&state, insert_hard_break()).unwrap();
        assert_eq!(next.doc().child(0).child(1).type_name(), "hard_break");
    }
}
