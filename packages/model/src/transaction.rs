//! # Transactions
//!
//! A transaction starts from a state snapshot and accumulates steps. Each
//! builder applies its step immediately, so `doc()` always reflects the
//! changes made so far and the selection is mapped as steps are added.
//!
//! Stored marks follow the usual rules: adding a step or setting the
//! selection clears them, and they only survive into the next state when the
//! resulting selection is a cursor.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::error::ModelResult;
use crate::node::{Attrs, Mark, Node};
use crate::resolved::NodeRange;
use crate::schema::{MarkType, NodeType, Schema};
use crate::selection::Selection;
use crate::transform::{Mapping, Step};

#[derive(Debug, Clone)]
pub struct Transaction {
    schema: Arc<Schema>,
    before: Arc<Node>,
    doc: Arc<Node>,
    steps: Vec<Step>,
    mapping: Mapping,
    selection: Selection,
    selection_set: bool,
    stored_marks: Option<Vec<Mark>>,
    meta: HashMap<String, Value>,
}

impl Transaction {
    pub(crate) fn new(
        schema: Arc<Schema>,
        doc: Arc<Node>,
        selection: Selection,
        stored_marks: Option<Vec<Mark>>,
    ) -> Self {
        Self {
            schema,
            before: Arc::clone(&doc),
            doc,
            steps: Vec::new(),
            mapping: Mapping::new(),
            selection,
            selection_set: false,
            stored_marks,
            meta: HashMap::new(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Document the transaction started from
    pub fn before(&self) -> &Arc<Node> {
        &self.before
    }

    pub fn doc(&self) -> &Arc<Node> {
        &self.doc
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selection_set(&self) -> bool {
        self.selection_set
    }

    pub fn stored_marks(&self) -> Option<&[Mark]> {
        self.stored_marks.as_deref()
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn step(&mut self, step: Step) -> ModelResult<&mut Self> {
        let (doc, map) = step.apply(&self.doc)?;
        trace!(?step, "applied step");

        // The selection is already in terms of the previous document
        let mut latest = Mapping::new();
        latest.push(map.clone());

        self.doc = Arc::new(doc);
        self.selection = self.selection.map(&self.doc, &latest);
        self.mapping.push(map);
        self.steps.push(step);
        self.stored_marks = None;
        Ok(self)
    }

    pub fn replace_with(&mut self, from: usize, to: usize, content: Vec<Node>) -> ModelResult<&mut Self> {
        self.step(Step::Replace { from, to, content })
    }

    pub fn replace(&mut self, from: usize, to: usize, node: Node) -> ModelResult<&mut Self> {
        self.replace_with(from, to, vec![node])
    }

    pub fn insert(&mut self, pos: usize, node: Node) -> ModelResult<&mut Self> {
        self.replace_with(pos, pos, vec![node])
    }

    pub fn delete(&mut self, from: usize, to: usize) -> ModelResult<&mut Self> {
        self.replace_with(from, to, Vec::new())
    }

    pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> ModelResult<&mut Self> {
        self.step(Step::AddMark { from, to, mark })
    }

    pub fn remove_mark(&mut self, from: usize, to: usize, mark_type: &Arc<MarkType>) -> ModelResult<&mut Self> {
        self.step(Step::RemoveMark {
            from,
            to,
            mark_type: Arc::clone(mark_type),
        })
    }

    /// Change every textblock in `from..to` that does not already have the
    /// given markup
    pub fn set_block_type(
        &mut self,
        from: usize,
        to: usize,
        node_type: &Arc<NodeType>,
        attrs: Option<&Attrs>,
    ) -> ModelResult<&mut Self> {
        let attrs = node_type.compute_attrs(attrs)?;
        let mut targets = Vec::new();
        self.doc.nodes_between(from, to, &mut |node, pos| {
            if node.is_textblock() {
                if !node.has_markup(node_type, Some(&attrs)) {
                    targets.push(pos);
                }
                return false;
            }
            true
        });

        for pos in targets {
            self.step(Step::SetNodeMarkup {
                pos,
                node_type: Arc::clone(node_type),
                attrs: attrs.clone(),
            })?;
        }
        Ok(self)
    }

    pub fn set_node_markup(&mut self, pos: usize, node_type: &Arc<NodeType>, attrs: Attrs) -> ModelResult<&mut Self> {
        self.step(Step::SetNodeMarkup {
            pos,
            node_type: Arc::clone(node_type),
            attrs,
        })
    }

    pub fn wrap(&mut self, range: NodeRange, wrappers: Vec<(Arc<NodeType>, Attrs)>) -> ModelResult<&mut Self> {
        self.step(Step::Wrap {
            from: range.start,
            to: range.end,
            wrappers,
        })
    }

    pub fn lift(&mut self, range: NodeRange) -> ModelResult<&mut Self> {
        self.step(Step::Lift {
            from: range.start,
            to: range.end,
        })
    }

    pub fn split(&mut self, pos: usize, depth: usize) -> ModelResult<&mut Self> {
        self.step(Step::Split { pos, depth })
    }

    pub fn delete_selection(&mut self) -> ModelResult<&mut Self> {
        let (from, to) = (self.selection.from(), self.selection.to());
        if from == to {
            return Ok(self);
        }
        self.delete(from, to)
    }

    /// Replace the selection with `node`.
    ///
    /// Inline nodes take the marks at the selection start. Block nodes
    /// replace an empty textblock outright, otherwise they go before or after
    /// the surrounding textblock, splitting it when the selection sits in the
    /// middle. The selection ends up right after the inserted node.
    pub fn replace_selection_with(&mut self, node: Node) -> ModelResult<&mut Self> {
        let (from, to) = (self.selection.from(), self.selection.to());

        if node.is_inline() {
            let marks = match &self.stored_marks {
                Some(marks) => marks.clone(),
                None => self.doc.resolve(from)?.marks(),
            };
            let node = node.with_marks(marks);
            let size = node.node_size();
            self.replace(from, to, node)?;
            return self.set_selection(Selection::near(&self.doc, from + size));
        }

        self.delete_selection()?;
        let from = self.selection.from();
        let resolved = self.doc.resolve(from)?;
        let depth = resolved.depth();

        let insert_at = if depth == 0 {
            from
        } else if resolved.parent().is_textblock() && resolved.parent().content_size() == 0 {
            let (start, end) = (resolved.before(depth)?, resolved.after(depth)?);
            self.replace(start, end, node)?;
            return self.set_selection(Selection::near(&self.doc, start + self.size_at(start)));
        } else if resolved.parent_offset() == 0 {
            resolved.before(depth)?
        } else if resolved.parent_offset() == resolved.parent().content_size() {
            resolved.after(depth)?
        } else {
            self.split(from, 1)?;
            from + 1
        };

        self.insert(insert_at, node)?;
        let end = insert_at + self.size_at(insert_at);
        self.set_selection(Selection::near(&self.doc, end))
    }

    fn size_at(&self, pos: usize) -> usize {
        self.doc.node_at(pos).map_or(0, Node::node_size)
    }

    /// Insert text at the selection, replacing it. Takes the stored marks, or
    /// the marks at the selection start.
    pub fn insert_text(&mut self, text: &str) -> ModelResult<&mut Self> {
        if text.is_empty() {
            return self.delete_selection();
        }

        let (from, to) = (self.selection.from(), self.selection.to());
        let marks = match &self.stored_marks {
            Some(marks) => marks.clone(),
            None => self.doc.resolve(from)?.marks(),
        };
        let node = self.schema.text(text, marks);
        self.replace(from, to, node)?;

        if !self.selection.empty() {
            let end = self.selection.to();
            self.set_selection(Selection::near(&self.doc, end))?;
        }
        Ok(self)
    }

    pub fn set_selection(&mut self, selection: Selection) -> ModelResult<&mut Self> {
        selection.validate(&self.doc)?;
        self.selection = selection;
        self.selection_set = true;
        self.stored_marks = None;
        Ok(self)
    }

    pub fn set_stored_marks(&mut self, marks: Option<Vec<Mark>>) -> &mut Self {
        self.stored_marks = marks;
        self
    }

    pub fn add_stored_mark(&mut self, mark: Mark) -> ModelResult<&mut Self> {
        let current = self.current_marks()?;
        self.stored_marks = Some(mark.add_to_set(&current));
        Ok(self)
    }

    pub fn remove_stored_mark(&mut self, mark_type: &MarkType) -> ModelResult<&mut Self> {
        let current = self.current_marks()?;
        self.stored_marks = Some(
            current
                .into_iter()
                .filter(|mark| mark.mark_type().as_ref() != mark_type)
                .collect(),
        );
        Ok(self)
    }

    fn current_marks(&self) -> ModelResult<Vec<Mark>> {
        match &self.stored_marks {
            Some(marks) => Ok(marks.clone()),
            None => Ok(self.doc.resolve(self.selection.head())?.marks()),
        }
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn get_meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }
}
