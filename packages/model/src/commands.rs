//! Built-in commands working on resolved schema types.
//!
//! Each constructor returns a [`Command`]: called without a dispatch it only
//! reports whether it would apply.

use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ModelResult;
use crate::node::{Attrs, Node};
use crate::resolved::NodeRange;
use crate::schema::{MarkType, NodeType, Schema};
use crate::state::{Command, Dispatch, EditorState};
use crate::transaction::Transaction;

/// Build and dispatch a transaction, only when a dispatch is given
pub fn dispatch_with<F>(state: &EditorState, dispatch: Option<Dispatch<'_>>, build: F) -> bool
where
    F: FnOnce(&mut Transaction) -> ModelResult<()>,
{
    let Some(dispatch) = dispatch else {
        return true;
    };

    let mut tr = state.tr();
    match build(&mut tr) {
        Ok(()) => {
            dispatch(tr);
            true
        }
        Err(err) => {
            warn!(error = %err, "command could not build its transaction");
            false
        }
    }
}

/// Build the transaction up front, so that probing also catches steps that
/// would fail
pub fn try_dispatch<F>(state: &EditorState, dispatch: Option<Dispatch<'_>>, build: F) -> bool
where
    F: FnOnce(&mut Transaction) -> ModelResult<()>,
{
    let mut tr = state.tr();
    if let Err(err) = build(&mut tr) {
        debug!(error = %err, "command does not apply");
        return false;
    }
    if let Some(dispatch) = dispatch {
        dispatch(tr);
    }
    true
}

/// Whether some inline content in `from..to` could carry a mark
fn mark_applies(doc: &Node, from: usize, to: usize) -> bool {
    if doc.inline_content() {
        return true;
    }
    let mut applies = false;
    doc.nodes_between(from, to, &mut |node, _| {
        if applies {
            return false;
        }
        applies = node.inline_content();
        true
    });
    applies
}

/// Add the mark when the selection lacks it, remove it otherwise. With a
/// cursor the stored marks are toggled instead.
pub fn toggle_mark(mark_type: Arc<MarkType>, attrs: Option<Attrs>) -> Command {
    Rc::new(move |state: &EditorState, dispatch: Option<Dispatch<'_>>| {
        let selection = state.selection();
        let (from, to) = (selection.from(), selection.to());

        if !mark_applies(state.doc(), from, to) {
            return false;
        }

        dispatch_with(state, dispatch, |tr| {
            if selection.cursor().is_some() {
                let current = match state.stored_marks() {
                    Some(marks) => marks.to_vec(),
                    None => state.doc().resolve(from)?.marks(),
                };
                if mark_type.is_in_set(&current).is_some() {
                    tr.remove_stored_mark(&mark_type)?;
                } else {
                    tr.add_stored_mark(mark_type.create(attrs.as_ref())?)?;
                }
            } else if state.doc().range_has_mark(from, to, &mark_type) {
                tr.remove_mark(from, to, &mark_type)?;
            } else {
                tr.add_mark(from, to, mark_type.create(attrs.as_ref())?)?;
            }
            Ok(())
        })
    })
}

/// Turn the selected textblocks into `node_type`
pub fn set_block_type(node_type: Arc<NodeType>, attrs: Option<Attrs>) -> Command {
    Rc::new(move |state: &EditorState, dispatch: Option<Dispatch<'_>>| {
        let selection = state.selection();
        let (from, to) = (selection.from(), selection.to());
        let doc = state.doc();

        let mut applicable = false;
        doc.nodes_between(from, to, &mut |node, pos| {
            if applicable {
                return false;
            }
            if !node.is_textblock() || node.has_markup(&node_type, attrs.as_ref()) {
                return true;
            }
            if node.node_type() == &node_type {
                applicable = true;
            } else if let Ok(resolved) = doc.resolve(pos) {
                let index = resolved.index(resolved.depth());
                applicable = resolved.parent().can_replace_with(index, index + 1, &node_type);
            }
            true
        });

        if !applicable {
            return false;
        }

        dispatch_with(state, dispatch, |tr| {
            tr.set_block_type(from, to, &node_type, attrs.as_ref())?;
            Ok(())
        })
    })
}

/// Wrappers needed to put the children of `range` inside `node_type`,
/// outermost first. Allows one intermediate wrapper, such as a list item
/// between a list and its paragraphs.
pub fn find_wrapping(
    schema: &Schema,
    parent: &Node,
    range: &NodeRange,
    node_type: &Arc<NodeType>,
    attrs: Option<&Attrs>,
) -> Option<Vec<(Arc<NodeType>, Attrs)>> {
    if !parent.can_replace_with(range.start_index, range.end_index, node_type) {
        return None;
    }
    let attrs = node_type.compute_attrs(attrs).ok()?;
    let children = parent.children().get(range.start_index..range.end_index)?;

    if node_type.valid_content(children) {
        return Some(vec![(Arc::clone(node_type), attrs)]);
    }

    schema
        .node_types()
        .iter()
        .filter(|inner| !inner.is_inline() && !inner.has_required_attrs())
        .find(|inner| {
            let candidate: &NodeType = inner;
            node_type.content_expr().matches(&[candidate]) && candidate.valid_content(children)
        })
        .map(|inner| {
            vec![
                (Arc::clone(node_type), attrs),
                (Arc::clone(inner), Attrs::new()),
            ]
        })
}

/// Wrap the selected blocks in `node_type`
pub fn wrap_in(node_type: Arc<NodeType>, attrs: Option<Attrs>) -> Command {
    Rc::new(move |state: &EditorState, dispatch: Option<Dispatch<'_>>| {
        let doc = state.doc();
        let selection = state.selection();
        let (Ok(from), Ok(to)) = (doc.resolve(selection.from()), doc.resolve(selection.to())) else {
            return false;
        };
        let Some(range) = from.block_range(&to) else {
            return false;
        };
        let parent = from.node(range.depth);
        let Some(wrappers) = find_wrapping(state.schema(), parent, &range, &node_type, attrs.as_ref()) else {
            return false;
        };

        dispatch_with(state, dispatch, |tr| {
            tr.wrap(range, wrappers)?;
            Ok(())
        })
    })
}

/// Move the selected blocks out of their parent
pub fn lift() -> Command {
    Rc::new(|state: &EditorState, dispatch: Option<Dispatch<'_>>| {
        let doc = state.doc();
        let selection = state.selection();
        let (Ok(from), Ok(to)) = (doc.resolve(selection.from()), doc.resolve(selection.to())) else {
            return false;
        };
        let Some(range) = from.block_range(&to) else {
            return false;
        };
        if range.depth == 0 {
            return false;
        }

        try_dispatch(state, dispatch, |tr| {
            tr.lift(range)?;
            Ok(())
        })
    })
}

/// Split the list item around the cursor into two items
pub fn split_list_item(item_type: Arc<NodeType>) -> Command {
    Rc::new(move |state: &EditorState, dispatch: Option<Dispatch<'_>>| {
        let doc = state.doc();
        let selection = state.selection();
        if selection.is_node() {
            return false;
        }
        let (Ok(from), Ok(to)) = (doc.resolve(selection.from()), doc.resolve(selection.to())) else {
            return false;
        };
        if from.depth() < 2 || !from.same_parent(&to) {
            return false;
        }

        let depth = from.depth();
        let item = from.node(depth - 1);
        if item.node_type() != &item_type {
            return false;
        }
        // Empty trailing block: leave it to other commands
        if from.parent().content_size() == 0 && item.child_count() == from.index_after(depth - 1) {
            return false;
        }

        let pos = from.pos();
        try_dispatch(state, dispatch, |tr| {
            tr.delete_selection()?;
            tr.split(pos, 2)?;
            Ok(())
        })
    })
}
