//! Schema fragments contributed by each capability, plus the two base schemas.

use scribe_model::{AttributeSpec, MarkSpec, NodeSpec, Schema, SchemaSpec};
use serde_json::Value;

use crate::errors::EditorResult;

/// `doc` holds blocks, starting with paragraphs
pub fn block() -> SchemaSpec {
    SchemaSpec::new()
        .node("doc", NodeSpec::new().content("block+"))
        .node("paragraph", NodeSpec::new().content("inline*").group("block"))
        .node("text", NodeSpec::new().group("inline").inline())
        .node("hard_break", NodeSpec::new().group("inline").inline())
}

/// `doc` holds inline content directly
pub fn inline() -> SchemaSpec {
    SchemaSpec::new()
        .node("doc", NodeSpec::new().content("inline*"))
        .node("text", NodeSpec::new().group("inline").inline())
        .node("hard_break", NodeSpec::new().group("inline").inline())
}

/// Fragment for a capability, `None` for unknown names
pub fn fragment(name: &str) -> Option<SchemaSpec> {
    let spec = SchemaSpec::new();
    let spec = match name {
        "bold" | "italic" | "underline" => spec.mark(name, MarkSpec::new()),
        "link" => spec.mark(
            "link",
            MarkSpec::new()
                .attr("href", AttributeSpec::required())
                .attr("title", AttributeSpec::with_default(Value::Null))
                .exclusive(),
        ),
        "heading" => spec.node(
            "heading",
            NodeSpec::new()
                .content("inline*")
                .group("block")
                .attr("level", AttributeSpec::with_default(1)),
        ),
        "blockquote" => spec.node("blockquote", NodeSpec::new().content("block+").group("block")),
        "image" => spec.node(
            "image",
            NodeSpec::new()
                .group("block")
                .attr("src", AttributeSpec::required())
                .attr("alt", AttributeSpec::with_default(Value::Null))
                .attr("title", AttributeSpec::with_default(Value::Null))
                .attr("alignment", AttributeSpec::with_default("center")),
        ),
        "list" => spec
            .node(
                "ordered_list",
                NodeSpec::new()
                    .content("list_item+")
                    .group("block")
                    .attr("order", AttributeSpec::with_default(1)),
            )
            .node("unordered_list", NodeSpec::new().content("list_item+").group("block"))
            .node("list_item", NodeSpec::new().content("paragraph block*")),
        _ => return None,
    };
    Some(spec)
}

/// Base schema with the fragments of `capabilities` merged on top, in order
pub fn build_schema(inline_mode: bool, capabilities: &[String]) -> EditorResult<Schema> {
    let base = if inline_mode { inline() } else { block() };
    let spec = capabilities
        .iter()
        .filter_map(|name| fragment(name))
        .fold(base, SchemaSpec::merge);

    Ok(Schema::new(spec)?)
}
