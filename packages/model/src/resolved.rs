//! Resolved positions: a flat document position annotated with the path of
//! ancestors that contain it.

use crate::error::{ModelError, ModelResult};
use crate::node::{Mark, Node};

#[derive(Debug, Clone, Copy)]
struct PathEntry<'a> {
    node: &'a Node,
    index: usize,
    offset: usize,
}

#[derive(Debug, Clone)]
pub struct ResolvedPos<'a> {
    pos: usize,
    path: Vec<PathEntry<'a>>,
    parent_offset: usize,
}

impl<'a> ResolvedPos<'a> {
    pub(crate) fn resolve(doc: &'a Node, pos: usize) -> ModelResult<Self> {
        let size = doc.content_size();
        if pos > size {
            return Err(ModelError::PositionOutOfRange { pos, size });
        }

        let mut path = Vec::new();
        let mut start = 0;
        let mut parent_offset = pos;
        let mut node = doc;

        loop {
            let (index, offset) = node.find_index(parent_offset);
            let rem = parent_offset - offset;
            path.push(PathEntry {
                node,
                index,
                offset: start + offset,
            });
            if rem == 0 {
                break;
            }
            node = node.child(index);
            if node.is_text() {
                break;
            }
            parent_offset = rem - 1;
            start += offset + 1;
        }

        Ok(Self {
            pos,
            path,
            parent_offset,
        })
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    /// Ancestor at depth `depth`; depth 0 is the document
    pub fn node(&self, depth: usize) -> &'a Node {
        self.path[depth].node
    }

    pub fn parent(&self) -> &'a Node {
        self.node(self.depth())
    }

    pub fn doc(&self) -> &'a Node {
        self.node(0)
    }

    /// Index of the child of `node(depth)` that contains or follows the position
    pub fn index(&self, depth: usize) -> usize {
        self.path[depth].index
    }

    pub fn index_after(&self, depth: usize) -> usize {
        let index = self.index(depth);
        if depth == self.depth() && self.text_offset() == 0 {
            index
        } else {
            index + 1
        }
    }

    /// Start of the content of `node(depth)`
    pub fn start(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.path[depth - 1].offset + 1
        }
    }

    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content_size()
    }

    /// Position directly before `node(depth)`. `depth == self.depth() + 1`
    /// yields the position itself.
    pub fn before(&self, depth: usize) -> ModelResult<usize> {
        if depth == 0 {
            return Err(ModelError::invalid_selection("no position before the top level node"));
        }
        if depth == self.depth() + 1 {
            return Ok(self.pos);
        }
        Ok(self.path[depth - 1].offset)
    }

    pub fn after(&self, depth: usize) -> ModelResult<usize> {
        if depth == 0 {
            return Err(ModelError::invalid_selection("no position after the top level node"));
        }
        if depth == self.depth() + 1 {
            return Ok(self.pos);
        }
        Ok(self.path[depth - 1].offset + self.path[depth].node.node_size())
    }

    /// Offset into the text node the position points into, 0 between nodes
    pub fn text_offset(&self) -> usize {
        self.pos - self.path[self.path.len() - 1].offset
    }

    pub fn node_after(&self) -> Option<&'a Node> {
        self.parent().maybe_child(self.index(self.depth()))
    }

    pub fn node_before(&self) -> Option<&'a Node> {
        let index = self.index(self.depth());
        if self.text_offset() > 0 {
            return Some(self.parent().child(index));
        }
        if index == 0 {
            None
        } else {
            Some(self.parent().child(index - 1))
        }
    }

    /// Marks a character inserted here would get. Non-inclusive marks only
    /// carry over when they continue after the position.
    pub fn marks(&self) -> Vec<Mark> {
        let parent = self.parent();
        let index = self.index(self.depth());

        if parent.content_size() == 0 {
            return Vec::new();
        }
        if self.text_offset() > 0 {
            return parent.child(index).marks().to_vec();
        }

        let (main, other) = match (
            index.checked_sub(1).and_then(|before| parent.maybe_child(before)),
            parent.maybe_child(index),
        ) {
            (Some(main), other) => (main, other),
            (None, Some(after)) => (after, None),
            (None, None) => return Vec::new(),
        };

        main.marks()
            .iter()
            .filter(|mark| {
                mark.mark_type().is_inclusive()
                    || other.map_or(false, |other| mark.is_in_set(other.marks()))
            })
            .cloned()
            .collect()
    }

    pub fn same_parent(&self, other: &ResolvedPos<'_>) -> bool {
        self.depth() == other.depth() && self.start(self.depth()) == other.start(other.depth())
    }

    /// Deepest depth whose node contains both this position and `pos`
    pub fn shared_depth(&self, pos: usize) -> usize {
        (1..=self.depth())
            .rev()
            .find(|&depth| self.start(depth) <= pos && self.end(depth) >= pos)
            .unwrap_or(0)
    }

    /// Child indices leading from the document to `node(depth)`
    pub fn path_to(&self, depth: usize) -> Vec<usize> {
        (0..depth).map(|d| self.index(d)).collect()
    }

    /// Range of sibling blocks covering this position and `other`
    pub fn block_range(&self, other: &ResolvedPos<'_>) -> Option<NodeRange> {
        if other.pos < self.pos {
            return other.block_range_to(self);
        }
        self.block_range_to(other)
    }

    fn block_range_to(&self, other: &ResolvedPos<'_>) -> Option<NodeRange> {
        let skip = usize::from(self.parent().inline_content() || self.pos == other.pos);
        let top = self.depth().checked_sub(skip)?;

        (0..=top)
            .rev()
            .find(|&depth| other.pos <= self.end(depth))
            .and_then(|depth| {
                Some(NodeRange {
                    depth,
                    start: self.before(depth + 1).ok()?,
                    end: other.after(depth + 1).ok()?,
                    start_index: self.index(depth),
                    end_index: other.index_after(depth),
                })
            })
    }
}

/// Contiguous run of children of the node at `depth`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRange {
    pub depth: usize,
    pub start: usize,
    pub end: usize,
    pub start_index: usize,
    pub end_index: usize,
}
