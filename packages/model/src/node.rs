//! # Document Nodes
//!
//! Nodes are immutable values: every edit produces a new tree. Positions
//! follow the usual token counting scheme:
//!
//! - a text node counts one token per character
//! - a leaf node counts as a single token
//! - any other node counts its content plus an opening and a closing token
//!
//! Inline content is kept normalized: adjacent text nodes with the same marks
//! are merged and empty text nodes are dropped.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ModelError, ModelResult};
use crate::resolved::ResolvedPos;
use crate::schema::{MarkType, NodeType, Schema};

pub type Attrs = Map<String, Value>;

#[derive(Clone, PartialEq)]
pub struct Mark {
    mark_type: Arc<MarkType>,
    attrs: Attrs,
}

impl Mark {
    pub(crate) fn from_parts(mark_type: Arc<MarkType>, attrs: Attrs) -> Self {
        Self { mark_type, attrs }
    }

    pub fn mark_type(&self) -> &Arc<MarkType> {
        &self.mark_type
    }

    pub fn name(&self) -> &str {
        self.mark_type.name()
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn is_in_set(&self, set: &[Mark]) -> bool {
        set.contains(self)
    }

    /// Add to a sorted set, replacing any mark of the same type
    pub fn add_to_set(&self, set: &[Mark]) -> Vec<Mark> {
        let mut marks: Vec<Mark> = set
            .iter()
            .filter(|mark| mark.mark_type != self.mark_type)
            .cloned()
            .collect();
        let at = marks
            .iter()
            .position(|mark| mark.mark_type.rank() > self.mark_type.rank())
            .unwrap_or(marks.len());
        marks.insert(at, self.clone());
        marks
    }

    pub fn remove_from_set(&self, set: &[Mark]) -> Vec<Mark> {
        set.iter().filter(|mark| *mark != self).cloned().collect()
    }

    pub fn to_json(&self) -> MarkJson {
        MarkJson {
            mark_type: self.name().to_string(),
            attrs: self.attrs.clone(),
        }
    }
}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attrs.is_empty() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{}{}", self.name(), Value::Object(self.attrs.clone()))
        }
    }
}

/// JSON shape of a mark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkJson {
    #[serde(rename = "type")]
    pub mark_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Attrs,
}

/// JSON shape of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeJson {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Attrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<NodeJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<MarkJson>,
}

#[derive(Clone, PartialEq)]
pub struct Node {
    node_type: Arc<NodeType>,
    attrs: Attrs,
    content: Vec<Node>,
    text: Option<String>,
    marks: Vec<Mark>,
}

impl Node {
    pub(crate) fn from_parts(node_type: Arc<NodeType>, attrs: Attrs, content: Vec<Node>, marks: Vec<Mark>) -> Self {
        let content = if node_type.inline_content() {
            normalize_inline(content)
        } else {
            content
        };

        Self {
            node_type,
            attrs,
            content,
            text: None,
            marks,
        }
    }

    pub(crate) fn text_node(node_type: Arc<NodeType>, text: String, marks: Vec<Mark>) -> Self {
        Self {
            node_type,
            attrs: Attrs::new(),
            content: Vec::new(),
            text: Some(text),
            marks,
        }
    }

    pub fn node_type(&self) -> &Arc<NodeType> {
        &self.node_type
    }

    pub fn type_name(&self) -> &str {
        self.node_type.name()
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn children(&self) -> &[Node] {
        &self.content
    }

    /// Panics when out of range, like slice indexing
    pub fn child(&self, index: usize) -> &Node {
        &self.content[index]
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.content.get(index)
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.content.first()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }

    pub fn is_inline(&self) -> bool {
        self.node_type.is_inline()
    }

    pub fn is_block(&self) -> bool {
        self.node_type.is_block()
    }

    pub fn is_textblock(&self) -> bool {
        self.node_type.is_textblock()
    }

    pub fn inline_content(&self) -> bool {
        self.node_type.inline_content()
    }

    pub fn is_leaf(&self) -> bool {
        self.node_type.is_leaf()
    }

    pub fn is_atom(&self) -> bool {
        self.node_type.is_atom()
    }

    pub fn node_size(&self) -> usize {
        match &self.text {
            Some(text) => text.chars().count(),
            None if self.is_leaf() => 1,
            None => self.content_size() + 2,
        }
    }

    pub fn content_size(&self) -> usize {
        self.content.iter().map(Node::node_size).sum()
    }

    pub fn text_content(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => self.content.iter().map(Node::text_content).collect(),
        }
    }

    pub fn has_markup(&self, node_type: &NodeType, attrs: Option<&Attrs>) -> bool {
        if self.node_type.as_ref() != node_type {
            return false;
        }
        match attrs {
            Some(attrs) => node_type
                .compute_attrs(Some(attrs))
                .map_or(false, |attrs| attrs == self.attrs),
            None => node_type.compute_attrs(None).map_or(true, |attrs| attrs == self.attrs),
        }
    }

    pub fn same_markup(&self, other: &Node) -> bool {
        self.node_type == other.node_type && self.attrs == other.attrs && self.marks == other.marks
    }

    /// Whether replacing children `from..to` with nodes of the given types
    /// keeps the content valid
    pub fn can_replace(&self, from: usize, to: usize, replacement: &[&NodeType]) -> bool {
        if from > to || to > self.content.len() {
            return false;
        }
        let types: Vec<&NodeType> = self.content[..from]
            .iter()
            .map(|child| child.node_type.as_ref())
            .chain(replacement.iter().copied())
            .chain(self.content[to..].iter().map(|child| child.node_type.as_ref()))
            .collect();
        self.node_type.content_expr().matches(&types)
    }

    pub fn can_replace_with(&self, from: usize, to: usize, node_type: &NodeType) -> bool {
        self.can_replace(from, to, &[node_type])
    }

    pub fn with_content(&self, content: Vec<Node>) -> Node {
        Node::from_parts(Arc::clone(&self.node_type), self.attrs.clone(), content, self.marks.clone())
    }

    pub fn with_marks(&self, marks: Vec<Mark>) -> Node {
        Node {
            marks,
            ..self.clone()
        }
    }

    pub fn with_markup(&self, node_type: Arc<NodeType>, attrs: Attrs) -> Node {
        Node::from_parts(node_type, attrs, self.content.clone(), self.marks.clone())
    }

    /// Slice of a text node by character offsets
    pub(crate) fn cut_text(&self, from: usize, to: usize) -> Node {
        let text = self.text.as_deref().unwrap_or_default();
        let sliced: String = text.chars().skip(from).take(to.saturating_sub(from)).collect();
        Node {
            text: Some(sliced),
            ..self.clone()
        }
    }

    /// Index of the child at `pos` and the offset where that child starts
    pub(crate) fn find_index(&self, pos: usize) -> (usize, usize) {
        if pos == 0 {
            return (0, 0);
        }

        let mut cursor = 0;
        for (index, child) in self.content.iter().enumerate() {
            let end = cursor + child.node_size();
            if end >= pos {
                return if end == pos { (index + 1, end) } else { (index, cursor) };
            }
            cursor = end;
        }

        (self.content.len(), cursor)
    }

    pub fn resolve(&self, pos: usize) -> ModelResult<ResolvedPos<'_>> {
        ResolvedPos::resolve(self, pos)
    }

    /// Node starting at `pos`, if any
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        let mut node = self;
        let mut pos = pos;

        loop {
            let (index, offset) = node.find_index(pos);
            let child = node.maybe_child(index)?;
            if offset == pos || child.is_text() {
                return Some(child);
            }
            node = child;
            pos -= offset + 1;
        }
    }

    /// Visit every descendant overlapping `from..to`. Returning `false` from
    /// the callback skips the node's children.
    pub fn nodes_between<F>(&self, from: usize, to: usize, f: &mut F)
    where
        F: FnMut(&Node, usize) -> bool,
    {
        self.visit_between(from, to, 0, f);
    }

    fn visit_between<F>(&self, from: usize, to: usize, start: usize, f: &mut F)
    where
        F: FnMut(&Node, usize) -> bool,
    {
        let mut pos = 0;
        for child in &self.content {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from && f(child, start + pos) && child.content_size() > 0 {
                let inner = pos + 1;
                child.visit_between(
                    from.saturating_sub(inner),
                    child.content_size().min(to - inner),
                    start + inner,
                    f,
                );
            }
            pos = end;
        }
    }

    pub fn descendants<F>(&self, f: &mut F)
    where
        F: FnMut(&Node, usize) -> bool,
    {
        self.nodes_between(0, self.content_size(), f);
    }

    pub fn range_has_mark(&self, from: usize, to: usize, mark_type: &MarkType) -> bool {
        let mut found = false;
        if to > from {
            self.nodes_between(from, to, &mut |node, _| {
                if mark_type.is_in_set(node.marks()).is_some() {
                    found = true;
                }
                !found
            });
        }
        found
    }

    /// Rebuild the child list of the node reached through `path`
    pub(crate) fn replace_children<F>(&self, path: &[usize], edit: F) -> ModelResult<Node>
    where
        F: FnOnce(&Node) -> ModelResult<Vec<Node>>,
    {
        match path.split_first() {
            None => {
                let content = edit(self)?;
                if !self.node_type.valid_content(&content) {
                    return Err(ModelError::InvalidContent(self.type_name().to_string()));
                }
                Ok(self.with_content(content))
            }
            Some((&index, rest)) => {
                let child = self
                    .maybe_child(index)
                    .ok_or_else(|| ModelError::invalid_step(format!("no child at index {index}")))?;
                let replaced = child.replace_children(rest, edit)?;
                let mut content = self.content.clone();
                content[index] = replaced;
                Ok(self.with_content(content))
            }
        }
    }

    /// Rewrite the marks of every inline node overlapping `from..to`
    pub(crate) fn map_inline_marks<F>(&self, from: usize, to: usize, f: &F) -> Node
    where
        F: Fn(&[Mark]) -> Vec<Mark>,
    {
        let mut content = Vec::with_capacity(self.content.len());
        let mut pos = 0;

        for child in &self.content {
            let size = child.node_size();
            let end = pos + size;

            if end <= from || pos >= to {
                content.push(child.clone());
            } else if child.is_text() {
                let start = from.saturating_sub(pos);
                let stop = (to - pos).min(size);
                if start > 0 {
                    content.push(child.cut_text(0, start));
                }
                let middle = child.cut_text(start, stop);
                content.push(middle.with_marks(f(child.marks())));
                if stop < size {
                    content.push(child.cut_text(stop, size));
                }
            } else if child.is_inline() {
                content.push(child.with_marks(f(child.marks())));
            } else {
                let inner = pos + 1;
                content.push(child.map_inline_marks(from.saturating_sub(inner), to - inner, f));
            }

            pos = end;
        }

        self.with_content(content)
    }

    pub fn to_json(&self) -> NodeJson {
        NodeJson {
            node_type: self.type_name().to_string(),
            attrs: self.attrs.clone(),
            content: self.content.iter().map(Node::to_json).collect(),
            text: self.text.clone(),
            marks: self.marks.iter().map(Mark::to_json).collect(),
        }
    }

    /// Strict deserialization: unknown types, missing attributes and invalid
    /// content are errors.
    pub fn from_json(schema: &Schema, json: &NodeJson) -> ModelResult<Node> {
        let node_type = schema
            .node_type(&json.node_type)
            .ok_or_else(|| ModelError::UnknownNodeType(json.node_type.clone()))?;

        let marks = json
            .marks
            .iter()
            .map(|mark| schema.mark(&mark.mark_type, Some(&mark.attrs)))
            .collect::<ModelResult<Vec<_>>>()?;

        if node_type.is_text() {
            let text = json.text.clone().unwrap_or_default();
            if text.is_empty() {
                return Err(ModelError::InvalidContent("text".to_string()));
            }
            return Ok(Node::text_node(Arc::clone(node_type), text, marks));
        }

        let content = json
            .content
            .iter()
            .map(|child| Node::from_json(schema, child))
            .collect::<ModelResult<Vec<_>>>()?;

        let attrs = node_type.compute_attrs(Some(&json.attrs))?;
        if !node_type.valid_content(&content) {
            return Err(ModelError::InvalidContent(node_type.name().to_string()));
        }

        Ok(Node::from_parts(Arc::clone(node_type), attrs, content, marks))
    }

    /// Lossy deserialization used when the schema changes under an existing
    /// document: unknown marks are dropped, unknown nodes are replaced by
    /// their content, and content that no longer fits is rearranged.
    pub fn coerce_json(schema: &Schema, json: &NodeJson) -> ModelResult<Node> {
        let top = schema.top_node_type();
        let children = json.content.iter().flat_map(|child| coerce_nodes(schema, child)).collect();
        let content = fit_content(schema, top, children)?;
        top.create(Some(&json.attrs), content)
    }

    /// Consistency check of the whole tree
    pub fn check(&self) -> ModelResult<()> {
        if !self.is_text() && !self.node_type.valid_content(&self.content) {
            return Err(ModelError::InvalidContent(self.type_name().to_string()));
        }
        self.content.iter().try_for_each(Node::check)
    }
}

fn coerce_nodes(schema: &Schema, json: &NodeJson) -> Vec<Node> {
    let marks: Vec<Mark> = json
        .marks
        .iter()
        .filter_map(|mark| schema.mark(&mark.mark_type, Some(&mark.attrs)).ok())
        .collect();

    match schema.node_type(&json.node_type) {
        Some(node_type) if node_type.is_text() => match json.text.as_deref() {
            Some(text) if !text.is_empty() => {
                vec![Node::text_node(Arc::clone(node_type), text.to_string(), marks)]
            }
            _ => Vec::new(),
        },
        Some(node_type) => {
            let children = json.content.iter().flat_map(|child| coerce_nodes(schema, child)).collect();
            let built = node_type
                .compute_attrs(Some(&json.attrs))
                .and_then(|attrs| Ok((attrs, fit_content(schema, node_type, children)?)));
            match built {
                Ok((attrs, content)) => vec![Node::from_parts(Arc::clone(node_type), attrs, content, marks)],
                Err(_) => Vec::new(),
            }
        }
        None => json
            .content
            .iter()
            .flat_map(|child| coerce_nodes(schema, child))
            .collect(),
    }
}

fn fit_content(schema: &Schema, node_type: &Arc<NodeType>, children: Vec<Node>) -> ModelResult<Vec<Node>> {
    if node_type.valid_content(&children) {
        return Ok(children);
    }

    let fitted = if node_type.inline_content() {
        children
            .into_iter()
            .flat_map(|child| if child.is_inline() { vec![child] } else { inline_descendants(&child) })
            .collect()
    } else {
        let mut fitted = Vec::new();
        let mut run = Vec::new();
        for child in children {
            if child.is_inline() {
                run.push(child);
                continue;
            }
            flush_inline_run(schema, &mut run, &mut fitted);
            fitted.push(child);
        }
        flush_inline_run(schema, &mut run, &mut fitted);
        fitted
    };

    if node_type.valid_content(&fitted) {
        Ok(fitted)
    } else {
        schema.fill(node_type)
    }
}

fn inline_descendants(node: &Node) -> Vec<Node> {
    let mut inline = Vec::new();
    node.descendants(&mut |child, _| {
        if child.is_inline() {
            inline.push(child.clone());
            return false;
        }
        true
    });
    inline
}

fn flush_inline_run(schema: &Schema, run: &mut Vec<Node>, out: &mut Vec<Node>) {
    if run.is_empty() {
        return;
    }
    if let Some(textblock) = schema.default_textblock() {
        out.push(Node::from_parts(Arc::clone(textblock), Attrs::new(), std::mem::take(run), Vec::new()));
    } else {
        run.clear();
    }
}

/// Merge adjacent text nodes with equal marks and drop empty ones
pub(crate) fn normalize_inline(content: Vec<Node>) -> Vec<Node> {
    let mut normalized: Vec<Node> = Vec::with_capacity(content.len());

    for node in content {
        if node.text.as_deref() == Some("") {
            continue;
        }
        if let (Some(last), Some(text)) = (normalized.last_mut(), node.text.as_deref()) {
            if let Some(last_text) = last.text.as_mut() {
                if last.marks == node.marks {
                    last_text.push_str(text);
                    continue;
                }
            }
        }
        normalized.push(node);
    }

    normalized
}

/// Split a child list at a content offset, cutting a text node if needed
pub(crate) fn split_children(content: &[Node], offset: usize) -> ModelResult<(Vec<Node>, Vec<Node>)> {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut pos = 0;

    for child in content {
        let size = child.node_size();
        let end = pos + size;
        if end <= offset {
            before.push(child.clone());
        } else if pos >= offset {
            after.push(child.clone());
        } else if child.is_text() {
            before.push(child.cut_text(0, offset - pos));
            after.push(child.cut_text(offset - pos, size));
        } else {
            return Err(ModelError::invalid_step(format!(
                "offset {offset} falls inside a {} node",
                child.type_name()
            )));
        }
        pos = end;
    }

    Ok((before, after))
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marks = if self.marks.is_empty() {
            String::new()
        } else {
            format!("{:?}", self.marks)
        };

        match &self.text {
            Some(text) => write!(f, "{marks}{text:?}"),
            None if self.content.is_empty() => write!(f, "{}{marks}", self.type_name()),
            None => {
                write!(f, "{}{marks}(", self.type_name())?;
                for (index, child) in self.content.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{child:?}")?;
                }
                write!(f, ")")
            }
        }
    }
}
