//! # Scribe Model
//!
//! Immutable document model underneath the editor:
//!
//! ```text
//! SchemaSpec ─compile─> Schema ─┐
//!                               ├─> EditorState ─tr()─> Transaction ─apply─> EditorState
//! NodeJson ───from_json──> Node ┘        │                   │
//!                                   plugin fields         Steps + Mapping
//! ```
//!
//! - [`schema`]: node and mark types, content expressions, attributes
//! - [`node`]: document tree, positions, JSON conversion
//! - [`resolved`]: positions resolved against the tree
//! - [`selection`]: text and node selections
//! - [`transform`]: steps and position mapping
//! - [`transaction`]: step builders used by commands
//! - [`state`]: snapshots, plugins, dispatch
//! - [`commands`]: built-in commands over resolved types

pub mod commands;
pub mod content;
pub mod error;
pub mod node;
pub mod resolved;
pub mod schema;
pub mod selection;
pub mod state;
pub mod transaction;
pub mod transform;

pub use error::{ModelError, ModelResult};
pub use node::{Attrs, Mark, MarkJson, Node, NodeJson};
pub use resolved::{NodeRange, ResolvedPos};
pub use schema::{AttributeSpec, MarkSpec, MarkType, NodeSpec, NodeType, Schema, SchemaSpec, SchemaType};
pub use selection::Selection;
pub use state::{reborrow, AnyPlugin, Command, Dispatch, EditorState, Plugin, PluginKey, StateConfig};
pub use transaction::Transaction;
pub use transform::{MapResult, Mapping, Step, StepMap};

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn schema() -> Schema {
        Schema::new(
            SchemaSpec::new()
                .node("doc", NodeSpec::new().content("block+"))
                .node("paragraph", NodeSpec::new().content("inline*").group("block"))
                .node(
                    "heading",
                    NodeSpec::new()
                        .content("inline*")
                        .group("block")
                        .attr("level", AttributeSpec::with_default(1)),
                )
                .node("blockquote", NodeSpec::new().content("block+").group("block"))
                .node(
                    "image",
                    NodeSpec::new()
                        .group("block")
                        .attr("src", AttributeSpec::required())
                        .attr("alt", AttributeSpec::with_default(serde_json::Value::Null)),
                )
                .node("unordered_list", NodeSpec::new().content("list_item+").group("block"))
                .node("list_item", NodeSpec::new().content("paragraph block*"))
                .node("text", NodeSpec::new().group("inline").inline())
                .node("hard_break", NodeSpec::new().group("inline").inline())
                .mark("bold", MarkSpec::new())
                .mark("italic", MarkSpec::new())
                .mark(
                    "link",
                    MarkSpec::new()
                        .attr("href", AttributeSpec::required())
                        .attr("title", AttributeSpec::with_default(serde_json::Value::Null))
                        .exclusive(),
                ),
        )
        .unwrap()
    }

    pub fn doc_from(json: serde_json::Value) -> Node {
        let json: NodeJson = serde_json::from_value(json).unwrap();
        Node::from_json(&schema(), &json).unwrap()
    }
}
