use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::node::Node;
use crate::transform::Mapping;

/// A text range or a selected node.
///
/// Text selections keep their direction: `head` moves while extending.
/// A node selection covers exactly one node, `from..to` being its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Selection {
    Text { anchor: usize, head: usize },
    Node { from: usize, to: usize },
}

impl Selection {
    pub fn cursor_at(pos: usize) -> Self {
        Self::Text { anchor: pos, head: pos }
    }

    pub fn text(anchor: usize, head: usize) -> Self {
        Self::Text { anchor, head }
    }

    /// Select the node starting at `pos`
    pub fn node(doc: &Node, pos: usize) -> ModelResult<Self> {
        let resolved = doc.resolve(pos)?;
        match resolved.node_after() {
            Some(node) if resolved.text_offset() == 0 && !node.is_text() => Ok(Self::Node {
                from: pos,
                to: pos + node.node_size(),
            }),
            _ => Err(ModelError::invalid_selection(format!("no selectable node at {pos}"))),
        }
    }

    pub fn from(&self) -> usize {
        match *self {
            Self::Text { anchor, head } => anchor.min(head),
            Self::Node { from, .. } => from,
        }
    }

    pub fn to(&self) -> usize {
        match *self {
            Self::Text { anchor, head } => anchor.max(head),
            Self::Node { to, .. } => to,
        }
    }

    pub fn anchor(&self) -> usize {
        match *self {
            Self::Text { anchor, .. } => anchor,
            Self::Node { from, .. } => from,
        }
    }

    pub fn head(&self) -> usize {
        match *self {
            Self::Text { head, .. } => head,
            Self::Node { to, .. } => to,
        }
    }

    pub fn empty(&self) -> bool {
        self.from() == self.to()
    }

    /// Position of an empty text selection
    pub fn cursor(&self) -> Option<usize> {
        match *self {
            Self::Text { anchor, head } if anchor == head => Some(head),
            _ => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Self::Node { .. })
    }

    /// First valid selection in the document
    pub fn at_start(doc: &Node) -> Self {
        Self::near(doc, 0)
    }

    /// Closest valid selection to `pos`, searching forward first
    pub fn near(doc: &Node, pos: usize) -> Self {
        let pos = pos.min(doc.content_size());
        if doc.resolve(pos).map_or(false, |resolved| resolved.parent().inline_content()) {
            return Self::cursor_at(pos);
        }

        let mut textblocks = Vec::new();
        let mut atoms = Vec::new();
        doc.descendants(&mut |node, node_pos| {
            if node.is_textblock() {
                textblocks.push((node_pos + 1, node_pos + 1 + node.content_size()));
                return false;
            }
            if node.is_block() && node.is_atom() {
                atoms.push((node_pos, node_pos + node.node_size()));
            }
            true
        });

        let forward = textblocks.iter().find(|(_, end)| *end >= pos);
        if let Some(&(start, _)) = forward {
            return Self::cursor_at(start.max(pos));
        }
        if let Some(&(_, end)) = textblocks.last() {
            return Self::cursor_at(end);
        }

        let atom = atoms.iter().find(|(from, _)| *from >= pos).or(atoms.last());
        match atom {
            Some(&(from, to)) => Self::Node { from, to },
            None => Self::cursor_at(pos),
        }
    }

    /// Map through a transaction's changes into `doc`
    pub fn map(&self, doc: &Node, mapping: &Mapping) -> Self {
        match *self {
            Self::Text { anchor, head } => {
                let anchor = mapping.map(anchor, 1);
                let head = mapping.map(head, 1);
                let inline = doc
                    .resolve(head)
                    .map_or(false, |resolved| resolved.parent().inline_content());
                if inline && doc.resolve(anchor).is_ok() {
                    Self::Text { anchor, head }
                } else {
                    Self::near(doc, head)
                }
            }
            Self::Node { from, .. } => {
                let result = mapping.map_result(from, 1);
                if result.deleted {
                    return Self::near(doc, result.pos);
                }
                Self::node(doc, result.pos).unwrap_or_else(|_| Self::near(doc, result.pos))
            }
        }
    }

    /// Check that the selection fits in `doc`
    pub fn validate(&self, doc: &Node) -> ModelResult<()> {
        match *self {
            Self::Text { anchor, head } => {
                for pos in [anchor, head] {
                    let resolved = doc.resolve(pos)?;
                    if !resolved.parent().inline_content() {
                        return Err(ModelError::invalid_selection(format!(
                            "position {pos} is not inside a textblock"
                        )));
                    }
                }
                Ok(())
            }
            Self::Node { from, to } => match Self::node(doc, from)? {
                Self::Node { to: end, .. } if end == to => Ok(()),
                _ => Err(ModelError::invalid_selection(format!("{from}..{to} does not cover one node"))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::doc_from;
    use serde_json::json;

    #[test]
    fn test_text_selection_bounds() {
        let selection = Selection::text(5, 2);
        assert_eq!((selection.from(), selection.to()), (2, 5));
        assert!(!selection.empty());
        assert_eq!(selection.cursor(), None);
        assert_eq!(Selection::cursor_at(3).cursor(), Some(3));
    }

    #[test]
    fn test_near_skips_into_textblock() {
        let doc = doc_from(json!({
            "type": "doc",
            "content": [
                { "type": "image", "attrs": { "src": "a.png" } },
                { "type": "paragraph", "content": [{ "type": "text", "text": "hi" }] }
            ]
        }));

        assert_eq!(Selection::at_start(&doc), Selection::cursor_at(2));
        assert_eq!(Selection::near(&doc, 3), Selection::cursor_at(3));
    }

    #[test]
    fn test_near_falls_back_to_node() {
        let doc = doc_from(json!({
            "type": "doc",
            "content": [{ "type": "image", "attrs": { "src": "a.png" } }]
        }));

        assert_eq!(Selection::at_start(&doc), Selection::Node { from: 0, to: 1 });
    }

    #[test]
    fn test_validate() {
        let doc = doc_from(json!({
            "type": "doc",
            "content": [
                { "type": "paragraph", "content": [{ "type": "text", "text": "hi" }] },
                { "type": "image", "attrs": { "src": "a.png" } }
            ]
        }));

        assert!(Selection::text(1, 3).validate(&doc).is_ok());
        assert!(Selection::cursor_at(0).validate(&doc).is_err());
        assert!(Selection::Node { from: 4, to: 5 }.validate(&doc).is_ok());
        assert!(Selection::Node { from: 0, to: 2 }.validate(&doc).is_err());
    }

    #[test]
    fn test_serializes_tagged() {
        let value = serde_json::to_value(Selection::text(1, 4)).unwrap();
        assert_eq!(value, json!({ "type": "text", "anchor": 1, "head": 4 }));
    }
}
