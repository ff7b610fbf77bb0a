//! # Steps
//!
//! A [`Step`] is one atomic document change. Applying it yields the new
//! document and a [`StepMap`] describing how positions moved, so selections
//! and later positions can be mapped through a whole transaction.

use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::node::{split_children, Attrs, Mark, Node};
use crate::schema::{MarkType, NodeType};

/// Replaced ranges of one step as `(start, old_size, new_size)`, sorted by
/// start in the pre-step document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
    ranges: Vec<(usize, usize, usize)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    /// Whether the content around the position was deleted
    pub deleted: bool,
}

impl StepMap {
    pub fn new(ranges: Vec<(usize, usize, usize)>) -> Self {
        Self { ranges }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Map a position. `assoc < 0` keeps it before content inserted at the
    /// position, `assoc > 0` moves it after.
    pub fn map_result(&self, pos: usize, assoc: i8) -> MapResult {
        let mut diff: isize = 0;

        for &(start, old_size, new_size) in &self.ranges {
            if start > pos {
                break;
            }
            let end = start + old_size;
            if pos <= end {
                let side = if old_size == 0 {
                    assoc
                } else if pos == start {
                    -1
                } else if pos == end {
                    1
                } else {
                    assoc
                };
                let mapped = start as isize + diff + if side < 0 { 0 } else { new_size as isize };
                let deleted = old_size > 0 && pos != if assoc < 0 { start } else { end };
                return MapResult {
                    pos: mapped.max(0) as usize,
                    deleted,
                };
            }
            diff += new_size as isize - old_size as isize;
        }

        MapResult {
            pos: (pos as isize + diff).max(0) as usize,
            deleted: false,
        }
    }

    pub fn map(&self, pos: usize, assoc: i8) -> usize {
        self.map_result(pos, assoc).pos
    }
}

/// Maps of every step of a transaction, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn map_result(&self, pos: usize, assoc: i8) -> MapResult {
        self.maps.iter().fold(MapResult { pos, deleted: false }, |acc, map| {
            let next = map.map_result(acc.pos, assoc);
            MapResult {
                pos: next.pos,
                deleted: acc.deleted || next.deleted,
            }
        })
    }

    pub fn map(&self, pos: usize, assoc: i8) -> usize {
        self.map_result(pos, assoc).pos
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Replace `from..to` with `content`; both ends share a parent
    Replace { from: usize, to: usize, content: Vec<Node> },
    AddMark { from: usize, to: usize, mark: Mark },
    /// Remove every mark of the type from inline content in range
    RemoveMark { from: usize, to: usize, mark_type: Arc<MarkType> },
    /// Change type and attributes of the node at `pos`
    SetNodeMarkup { pos: usize, node_type: Arc<NodeType>, attrs: Attrs },
    /// Wrap the sibling blocks `from..to` in a chain of wrappers, outermost first
    Wrap { from: usize, to: usize, wrappers: Vec<(Arc<NodeType>, Attrs)> },
    /// Move the blocks `from..to` out of their parent, one level up
    Lift { from: usize, to: usize },
    /// Split the nodes around `pos`, `depth` levels deep
    Split { pos: usize, depth: usize },
}

impl Step {
    pub fn apply(&self, doc: &Node) -> ModelResult<(Node, StepMap)> {
        match self {
            Step::Replace { from, to, content } => apply_replace(doc, *from, *to, content),
            Step::AddMark { from, to, mark } => {
                check_range(doc, *from, *to)?;
                let doc = doc.map_inline_marks(*from, *to, &|marks| mark.add_to_set(marks));
                Ok((doc, StepMap::empty()))
            }
            Step::RemoveMark { from, to, mark_type } => {
                check_range(doc, *from, *to)?;
                let doc = doc.map_inline_marks(*from, *to, &|marks| {
                    marks.iter().filter(|mark| mark.mark_type() != mark_type).cloned().collect()
                });
                Ok((doc, StepMap::empty()))
            }
            Step::SetNodeMarkup { pos, node_type, attrs } => apply_set_markup(doc, *pos, node_type, attrs),
            Step::Wrap { from, to, wrappers } => apply_wrap(doc, *from, *to, wrappers),
            Step::Lift { from, to } => apply_lift(doc, *from, *to),
            Step::Split { pos, depth } => apply_split(doc, *pos, *depth),
        }
    }
}

fn check_range(doc: &Node, from: usize, to: usize) -> ModelResult<()> {
    let size = doc.content_size();
    if from > to || to > size {
        return Err(ModelError::PositionOutOfRange { pos: to.max(from), size });
    }
    Ok(())
}

fn apply_replace(doc: &Node, from: usize, to: usize, content: &[Node]) -> ModelResult<(Node, StepMap)> {
    check_range(doc, from, to)?;
    let start = doc.resolve(from)?;
    let end = doc.resolve(to)?;
    if !start.same_parent(&end) {
        return Err(ModelError::invalid_step(format!("{from}..{to} crosses node boundaries")));
    }

    let depth = start.depth();
    let (from_offset, to_offset) = (start.parent_offset(), end.parent_offset());
    let doc = doc.replace_children(&start.path_to(depth), |parent| {
        let (before, _) = split_children(parent.children(), from_offset)?;
        let (_, after) = split_children(parent.children(), to_offset)?;
        Ok(before.into_iter().chain(content.iter().cloned()).chain(after).collect())
    })?;

    let inserted = content.iter().map(Node::node_size).sum();
    Ok((doc, StepMap::new(vec![(from, to - from, inserted)])))
}

fn apply_set_markup(doc: &Node, pos: usize, node_type: &Arc<NodeType>, attrs: &Attrs) -> ModelResult<(Node, StepMap)> {
    let resolved = doc.resolve(pos)?;
    let depth = resolved.depth();
    let index = resolved.index(depth);
    let target = match resolved.node_after() {
        Some(node) if resolved.text_offset() == 0 && !node.is_text() => node,
        _ => return Err(ModelError::invalid_step(format!("no node at {pos}"))),
    };
    if !node_type.valid_content(target.children()) {
        return Err(ModelError::InvalidContent(node_type.name().to_string()));
    }

    let replacement = target.with_markup(Arc::clone(node_type), node_type.compute_attrs(Some(attrs))?);
    let doc = doc.replace_children(&resolved.path_to(depth), |parent| {
        let mut children = parent.children().to_vec();
        children[index] = replacement;
        Ok(children)
    })?;

    Ok((doc, StepMap::empty()))
}

/// Resolve a range of whole siblings: the parent depth and child indices
fn sibling_range(doc: &Node, from: usize, to: usize) -> ModelResult<(Vec<usize>, usize, usize, usize)> {
    check_range(doc, from, to)?;
    let start = doc.resolve(from)?;
    let end = doc.resolve(to)?;
    if !start.same_parent(&end) || start.text_offset() != 0 || end.text_offset() != 0 {
        return Err(ModelError::invalid_step(format!("{from}..{to} is not a range of sibling nodes")));
    }
    let depth = start.depth();
    Ok((start.path_to(depth), depth, start.index(depth), end.index(depth)))
}

fn apply_wrap(
    doc: &Node,
    from: usize,
    to: usize,
    wrappers: &[(Arc<NodeType>, Attrs)],
) -> ModelResult<(Node, StepMap)> {
    if wrappers.is_empty() {
        return Err(ModelError::invalid_step("wrap needs at least one wrapper"));
    }
    let (path, _, start_index, end_index) = sibling_range(doc, from, to)?;

    let doc = doc.replace_children(&path, |parent| {
        let children = parent.children();
        let mut wrapped = children[start_index..end_index].to_vec();
        for (node_type, attrs) in wrappers.iter().rev() {
            wrapped = vec![node_type.create_checked(Some(attrs), wrapped)?];
        }

        let mut content = children[..start_index].to_vec();
        content.extend(wrapped);
        content.extend_from_slice(&children[end_index..]);
        Ok(content)
    })?;

    let depth = wrappers.len();
    Ok((doc, StepMap::new(vec![(from, 0, depth), (to, 0, depth)])))
}

fn apply_lift(doc: &Node, from: usize, to: usize) -> ModelResult<(Node, StepMap)> {
    let (path, depth, start_index, end_index) = sibling_range(doc, from, to)?;
    if depth == 0 {
        return Err(ModelError::invalid_step("cannot lift out of the top level node"));
    }

    let resolved = doc.resolve(from)?;
    let wrapper_before = resolved.before(depth)?;
    let wrapper_after = resolved.after(depth)?;
    let wrapper_index = path[depth - 1];

    let mut head_empty = false;
    let mut tail_empty = false;
    let doc = doc.replace_children(&path[..depth - 1], |grandparent| {
        let wrapper = grandparent.child(wrapper_index);
        let children = wrapper.children();
        let head = &children[..start_index];
        let tail = &children[end_index..];
        head_empty = head.is_empty();
        tail_empty = tail.is_empty();

        let mut content = grandparent.children()[..wrapper_index].to_vec();
        if !head.is_empty() {
            content.push(checked_copy(wrapper, head.to_vec())?);
        }
        content.extend_from_slice(&children[start_index..end_index]);
        if !tail.is_empty() {
            content.push(checked_copy(wrapper, tail.to_vec())?);
        }
        content.extend_from_slice(&grandparent.children()[wrapper_index + 1..]);
        Ok(content)
    })?;

    let opening = if head_empty { (wrapper_before, 1, 0) } else { (from, 0, 1) };
    let closing = if tail_empty { (wrapper_after - 1, 1, 0) } else { (to, 0, 1) };
    Ok((doc, StepMap::new(vec![opening, closing])))
}

fn checked_copy(node: &Node, content: Vec<Node>) -> ModelResult<Node> {
    if !node.node_type().valid_content(&content) {
        return Err(ModelError::InvalidContent(node.type_name().to_string()));
    }
    Ok(node.with_content(content))
}

fn apply_split(doc: &Node, pos: usize, depth: usize) -> ModelResult<(Node, StepMap)> {
    let resolved = doc.resolve(pos)?;
    if depth == 0 || depth > resolved.depth() {
        return Err(ModelError::invalid_step(format!("cannot split {depth} levels at {pos}")));
    }

    let innermost = resolved.parent();
    let (left, right) = split_children(innermost.children(), resolved.parent_offset())?;
    let mut left = checked_copy(innermost, left)?;
    let mut right = checked_copy(innermost, right)?;

    let base = resolved.depth() - depth;
    for level in (base + 1..resolved.depth()).rev() {
        let node = resolved.node(level);
        let index = resolved.index(level);
        let mut head = node.children()[..index].to_vec();
        head.push(left);
        let mut tail = vec![right];
        tail.extend_from_slice(&node.children()[index + 1..]);
        left = checked_copy(node, head)?;
        right = checked_copy(node, tail)?;
    }

    let index = resolved.index(base);
    let doc = doc.replace_children(&resolved.path_to(base), |parent| {
        let mut content = parent.children()[..index].to_vec();
        content.push(left);
        content.push(right);
        content.extend_from_slice(&parent.children()[index + 1..]);
        Ok(content)
    })?;

    Ok((doc, StepMap::new(vec![(pos, 0, 2 * depth)])))
}
