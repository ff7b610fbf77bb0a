//! # Schema
//!
//! A schema is compiled once from a [`SchemaSpec`] and then shared by every
//! state snapshot through an `Arc`. Node and mark types live in one
//! name-indexed table of [`SchemaType`] entries, so resolving a capability
//! name is a single lookup that also tells whether it is a node or a mark.
//!
//! Spec merging follows "later wins": redefining a name replaces the earlier
//! definition in place, new names are appended. Order matters, because the
//! first type of a group is the default used when content has to be filled.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::content::{ContentExpr, Target};
use crate::error::{ModelError, ModelResult};
use crate::node::{Attrs, Mark, Node};

/// Attribute declaration. `default: None` makes the attribute required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSpec {
    pub default: Option<Value>,
}

impl AttributeSpec {
    pub fn required() -> Self {
        Self { default: None }
    }

    pub fn with_default(value: impl Into<Value>) -> Self {
        Self {
            default: Some(value.into()),
        }
    }
}

/// Declarative description of a node type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSpec {
    pub content: String,
    pub groups: Vec<String>,
    pub inline: bool,
    pub atom: bool,
    pub attrs: Vec<(String, AttributeSpec)>,
}

impl NodeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Space separated group names
    pub fn group(mut self, groups: &str) -> Self {
        self.groups = groups.split_whitespace().map(str::to_string).collect();
        self
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn atom(mut self) -> Self {
        self.atom = true;
        self
    }

    pub fn attr(mut self, name: impl Into<String>, spec: AttributeSpec) -> Self {
        self.attrs.push((name.into(), spec));
        self
    }
}

/// Declarative description of a mark type
#[derive(Debug, Clone, PartialEq)]
pub struct MarkSpec {
    pub attrs: Vec<(String, AttributeSpec)>,
    /// Whether typing at the edge of the mark extends it
    pub inclusive: bool,
}

impl Default for MarkSpec {
    fn default() -> Self {
        Self {
            attrs: Vec::new(),
            inclusive: true,
        }
    }
}

impl MarkSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: impl Into<String>, spec: AttributeSpec) -> Self {
        self.attrs.push((name.into(), spec));
        self
    }

    pub fn exclusive(mut self) -> Self {
        self.inclusive = false;
        self
    }
}

/// Ordered collection of node and mark specs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaSpec {
    pub nodes: Vec<(String, NodeSpec)>,
    pub marks: Vec<(String, MarkSpec)>,
}

impl SchemaSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, name: impl Into<String>, spec: NodeSpec) -> Self {
        upsert(&mut self.nodes, name.into(), spec);
        self
    }

    pub fn mark(mut self, name: impl Into<String>, spec: MarkSpec) -> Self {
        upsert(&mut self.marks, name.into(), spec);
        self
    }

    /// Merge `other` on top of `self`
    pub fn merge(mut self, other: SchemaSpec) -> Self {
        for (name, spec) in other.nodes {
            upsert(&mut self.nodes, name, spec);
        }
        for (name, spec) in other.marks {
            upsert(&mut self.marks, name, spec);
        }
        self
    }
}

fn upsert<T>(entries: &mut Vec<(String, T)>, name: String, value: T) {
    match entries.iter_mut().find(|(existing, _)| *existing == name) {
        Some(entry) => entry.1 = value,
        None => entries.push((name, value)),
    }
}

#[derive(Debug)]
pub struct NodeType {
    name: String,
    groups: Vec<String>,
    inline: bool,
    atom: bool,
    content: ContentExpr,
    inline_content: bool,
    attrs: Vec<(String, AttributeSpec)>,
}

impl PartialEq for NodeType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl NodeType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    pub fn is_text(&self) -> bool {
        self.name == "text"
    }

    pub fn is_inline(&self) -> bool {
        self.inline
    }

    pub fn is_block(&self) -> bool {
        !self.inline
    }

    /// Block whose children are inline
    pub fn is_textblock(&self) -> bool {
        self.is_block() && self.inline_content
    }

    pub fn inline_content(&self) -> bool {
        self.inline_content
    }

    pub fn is_leaf(&self) -> bool {
        self.content.is_empty()
    }

    pub fn is_atom(&self) -> bool {
        self.is_leaf() || self.atom
    }

    pub fn content_expr(&self) -> &ContentExpr {
        &self.content
    }

    /// Check a sequence of children against the content expression
    pub fn valid_content(&self, children: &[Node]) -> bool {
        let types: Vec<&NodeType> = children.iter().map(|child| child.node_type().as_ref()).collect();
        self.content.matches(&types)
    }

    pub fn has_required_attrs(&self) -> bool {
        self.attrs.iter().any(|(_, spec)| spec.default.is_none())
    }

    /// Fill in defaults and reject missing required attributes. Unknown
    /// attributes are dropped.
    pub fn compute_attrs(&self, given: Option<&Attrs>) -> ModelResult<Attrs> {
        compute_attrs(&self.name, &self.attrs, given)
    }

    /// Create a node without validating its content
    pub fn create(self: &Arc<Self>, attrs: Option<&Attrs>, content: Vec<Node>) -> ModelResult<Node> {
        let attrs = self.compute_attrs(attrs)?;
        Ok(Node::from_parts(Arc::clone(self), attrs, content, Vec::new()))
    }

    /// Create a node, checking its content against the content expression
    pub fn create_checked(self: &Arc<Self>, attrs: Option<&Attrs>, content: Vec<Node>) -> ModelResult<Node> {
        if !self.valid_content(&content) {
            return Err(ModelError::InvalidContent(self.name.clone()));
        }
        self.create(attrs, content)
    }

    /// Create a node with the minimal content its expression requires
    pub fn create_and_fill(self: &Arc<Self>, schema: &Schema, attrs: Option<&Attrs>) -> ModelResult<Node> {
        let content = schema.fill(self)?;
        self.create(attrs, content)
    }
}

#[derive(Debug)]
pub struct MarkType {
    name: String,
    rank: usize,
    inclusive: bool,
    attrs: Vec<(String, AttributeSpec)>,
}

impl PartialEq for MarkType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl MarkType {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in the schema, used to keep mark sets sorted
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn is_inclusive(&self) -> bool {
        self.inclusive
    }

    pub fn create(self: &Arc<Self>, attrs: Option<&Attrs>) -> ModelResult<Mark> {
        let attrs = compute_attrs(&self.name, &self.attrs, attrs)?;
        Ok(Mark::from_parts(Arc::clone(self), attrs))
    }

    /// First mark of this type in the set
    pub fn is_in_set<'a>(&self, marks: &'a [Mark]) -> Option<&'a Mark> {
        marks.iter().find(|mark| mark.mark_type().as_ref() == self)
    }
}

fn compute_attrs(type_name: &str, specs: &[(String, AttributeSpec)], given: Option<&Attrs>) -> ModelResult<Attrs> {
    let mut attrs = Attrs::new();

    for (name, spec) in specs {
        let value = match given.and_then(|given| given.get(name)) {
            Some(value) => value.clone(),
            None => spec
                .default
                .clone()
                .ok_or_else(|| ModelError::missing_attribute(type_name, name.as_str()))?,
        };
        attrs.insert(name.clone(), value);
    }

    Ok(attrs)
}

/// Resolved schema entry
#[derive(Debug, Clone)]
pub enum SchemaType {
    Node(Arc<NodeType>),
    Mark(Arc<MarkType>),
}

#[derive(Debug)]
pub struct Schema {
    nodes: Vec<Arc<NodeType>>,
    marks: Vec<Arc<MarkType>>,
    types: HashMap<String, SchemaType>,
}

impl Schema {
    /// Compile a spec. Requires a `doc` and a `text` node type.
    pub fn new(spec: SchemaSpec) -> ModelResult<Self> {
        let is_node_name = |name: &str| spec.nodes.iter().any(|(node, _)| node == name);

        let mut nodes = Vec::with_capacity(spec.nodes.len());
        for (name, node_spec) in &spec.nodes {
            nodes.push(NodeType {
                name: name.clone(),
                groups: node_spec.groups.clone(),
                inline: node_spec.inline,
                atom: node_spec.atom,
                content: ContentExpr::parse(&node_spec.content, is_node_name)?,
                inline_content: false,
                attrs: node_spec.attrs.clone(),
            });
        }

        for index in 0..nodes.len() {
            for term in nodes[index].content.terms() {
                if !nodes.iter().any(|candidate| term.accepts(candidate)) {
                    return Err(ModelError::Schema(format!(
                        "content of '{}' references nothing: {:?}",
                        nodes[index].name, term.target
                    )));
                }
            }
            let inline_content = nodes
                .iter()
                .any(|candidate| candidate.inline && nodes[index].content.allows(candidate));
            nodes[index].inline_content = inline_content;
        }

        let nodes: Vec<Arc<NodeType>> = nodes.into_iter().map(Arc::new).collect();
        let marks: Vec<Arc<MarkType>> = spec
            .marks
            .iter()
            .enumerate()
            .map(|(rank, (name, mark_spec))| {
                Arc::new(MarkType {
                    name: name.clone(),
                    rank,
                    inclusive: mark_spec.inclusive,
                    attrs: mark_spec.attrs.clone(),
                })
            })
            .collect();

        let mut types = HashMap::new();
        for node_type in &nodes {
            types.insert(node_type.name.clone(), SchemaType::Node(Arc::clone(node_type)));
        }
        for mark_type in &marks {
            if types.contains_key(&mark_type.name) {
                return Err(ModelError::Schema(format!(
                    "'{}' is defined as both a node and a mark",
                    mark_type.name
                )));
            }
            types.insert(mark_type.name.clone(), SchemaType::Mark(Arc::clone(mark_type)));
        }

        for required in ["doc", "text"] {
            if !matches!(types.get(required), Some(SchemaType::Node(_))) {
                return Err(ModelError::Schema(format!("schema is missing the '{required}' node type")));
            }
        }

        Ok(Self { nodes, marks, types })
    }

    pub fn lookup(&self, name: &str) -> Option<&SchemaType> {
        self.types.get(name)
    }

    pub fn node_type(&self, name: &str) -> Option<&Arc<NodeType>> {
        match self.types.get(name) {
            Some(SchemaType::Node(node_type)) => Some(node_type),
            _ => None,
        }
    }

    pub fn mark_type(&self, name: &str) -> Option<&Arc<MarkType>> {
        match self.types.get(name) {
            Some(SchemaType::Mark(mark_type)) => Some(mark_type),
            _ => None,
        }
    }

    pub fn node_types(&self) -> &[Arc<NodeType>] {
        &self.nodes
    }

    pub fn mark_types(&self) -> &[Arc<MarkType>] {
        &self.marks
    }

    pub fn top_node_type(&self) -> &Arc<NodeType> {
        // Presence checked in `Schema::new`
        &self.nodes[self.position("doc")]
    }

    fn position(&self, name: &str) -> usize {
        self.nodes.iter().position(|node_type| node_type.name == name).unwrap_or_default()
    }

    /// First block textblock type, usually `paragraph`
    pub fn default_textblock(&self) -> Option<&Arc<NodeType>> {
        self.nodes
            .iter()
            .find(|node_type| node_type.is_textblock() && node_type.name != "doc")
    }

    pub fn text(&self, text: impl Into<String>, marks: Vec<Mark>) -> Node {
        let text_type = &self.nodes[self.position("text")];
        Node::text_node(Arc::clone(text_type), text.into(), marks)
    }

    pub fn node(&self, name: &str, attrs: Option<&Attrs>, content: Vec<Node>) -> ModelResult<Node> {
        self.node_type(name)
            .ok_or_else(|| ModelError::UnknownNodeType(name.to_string()))?
            .create_checked(attrs, content)
    }

    pub fn mark(&self, name: &str, attrs: Option<&Attrs>) -> ModelResult<Mark> {
        self.mark_type(name)
            .ok_or_else(|| ModelError::UnknownMarkType(name.to_string()))?
            .create(attrs)
    }

    /// Empty document: the top node filled with its minimal content
    pub fn empty_doc(&self) -> ModelResult<Node> {
        self.top_node_type().create_and_fill(self, None)
    }

    /// Minimal valid content for a node type
    pub(crate) fn fill(&self, node_type: &NodeType) -> ModelResult<Vec<Node>> {
        let mut content = Vec::new();

        for term in node_type.content_expr().terms() {
            if term.min == 0 {
                continue;
            }

            let candidate = match &term.target {
                Target::Node(name) => self.node_type(name),
                Target::Group(_) => self
                    .nodes
                    .iter()
                    .find(|candidate| term.accepts(candidate) && !candidate.is_text() && !candidate.has_required_attrs()),
            }
            .ok_or_else(|| ModelError::InvalidContent(node_type.name().to_string()))?;

            for _ in 0..term.min {
                content.push(candidate.create_and_fill(self, None)?);
            }
        }

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec() -> SchemaSpec {
        SchemaSpec::new()
            .node("doc", NodeSpec::new().content("block+"))
            .node("paragraph", NodeSpec::new().content("inline*").group("block"))
            .node("blockquote", NodeSpec::new().content("block+").group("block"))
            .node(
                "image",
                NodeSpec::new()
                    .group("block")
                    .attr("src", AttributeSpec::required())
                    .attr("alignment", AttributeSpec::with_default("center")),
            )
            .node("text", NodeSpec::new().group("inline").inline())
            .mark("bold", MarkSpec::new())
    }

    #[test]
    fn test_compile_flags() {
        let schema = Schema::new(spec()).unwrap();

        let paragraph = schema.node_type("paragraph").unwrap();
        assert!(paragraph.is_textblock());
        assert!(!paragraph.is_leaf());

        let blockquote = schema.node_type("blockquote").unwrap();
        assert!(!blockquote.is_textblock());

        let image = schema.node_type("image").unwrap();
        assert!(image.is_leaf());
        assert!(image.is_atom());

        assert!(matches!(schema.lookup("bold"), Some(SchemaType::Mark(_))));
        assert!(matches!(schema.lookup("image"), Some(SchemaType::Node(_))));
        assert!(schema.lookup("italic").is_none());
    }

    #[test]
    fn test_merge_replaces_in_place() {
        let merged = spec().merge(
            SchemaSpec::new()
                .node("paragraph", NodeSpec::new().content("text*").group("block"))
                .node("heading", NodeSpec::new().content("inline*").group("block")),
        );

        let names: Vec<&str> = merged.nodes.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["doc", "paragraph", "blockquote", "image", "text", "heading"]);
        assert_eq!(merged.nodes[1].1.content, "text*");
    }

    #[test]
    fn test_missing_required_types() {
        let result = Schema::new(SchemaSpec::new().node("doc", NodeSpec::new().content("text*")));
        assert!(matches!(result, Err(ModelError::Schema(_))));
    }

    #[test]
    fn test_compute_attrs() {
        let schema = Schema::new(spec()).unwrap();
        let image = schema.node_type("image").unwrap();

        let missing = image.compute_attrs(None);
        assert_eq!(missing, Err(ModelError::missing_attribute("image", "src")));

        let given = json!({ "src": "cat.png", "unknown": 1 });
        let attrs = image.compute_attrs(given.as_object()).unwrap();
        assert_eq!(attrs.get("src"), Some(&json!("cat.png")));
        assert_eq!(attrs.get("alignment"), Some(&json!("center")));
        assert!(attrs.get("unknown").is_none());
    }

    #[test]
    fn test_create_and_fill() {
        let schema = Schema::new(spec()).unwrap();

        let quote = schema
            .node_type("blockquote")
            .unwrap()
            .create_and_fill(&schema, None)
            .unwrap();
        assert_eq!(quote.child_count(), 1);
        assert_eq!(quote.child(0).type_name(), "paragraph");

        let doc = schema.empty_doc().unwrap();
        assert_eq!(doc.child_count(), 1);
        assert_eq!(doc.content_size(), 2);
    }
}
