use std::sync::Arc;

use scribe_model::{
    AttributeSpec, EditorState, MarkSpec, Node, NodeJson, NodeSpec, Schema, SchemaSpec, Selection, StateConfig,
};
use serde_json::json;

fn base_spec() -> SchemaSpec {
    SchemaSpec::new()
        .node("doc", NodeSpec::new().content("block+"))
        .node("paragraph", NodeSpec::new().content("inline*").group("block"))
        .node("text", NodeSpec::new().group("inline").inline())
        .node("hard_break", NodeSpec::new().group("inline").inline())
}

fn full_spec() -> SchemaSpec {
    base_spec()
        .node(
            "image",
            NodeSpec::new().group("block").attr("src", AttributeSpec::required()),
        )
        .mark("bold", MarkSpec::new())
        .mark("link", MarkSpec::new().attr("href", AttributeSpec::required()).exclusive())
}

fn state(schema: Schema, doc: serde_json::Value, selection: Selection) -> EditorState {
    let json: NodeJson = serde_json::from_value(doc).unwrap();
    let doc = Node::from_json(&schema, &json).unwrap();
    EditorState::create(StateConfig {
        schema: Arc::new(schema),
        doc: Some(doc),
        selection: Some(selection),
        plugins: Vec::new(),
    })
    .unwrap()
}

fn paragraph(text: &str) -> serde_json::Value {
    json!({ "type": "paragraph", "content": [{ "type": "text", "text": text }] })
}

#[test]
fn test_insert_text_replaces_range() {
    let schema = Schema::new(full_spec()).unwrap();
    let state = state(schema, json!({ "type": "doc", "content": [paragraph("hello world")] }), Selection::text(7, 12));

    let mut tr = state.tr();
    tr.insert_text("there").unwrap();
    let next = state.apply(&tr);

    assert_eq!(next.doc().text_content(), "hello there");
    assert_eq!(next.selection(), Selection::cursor_at(12));
    assert!(tr.doc_changed());
}

#[test]
fn test_typing_inside_link_keeps_link() {
    let schema = Schema::new(full_spec()).unwrap();
    let doc = json!({
        "type": "doc",
        "content": [{
            "type": "paragraph",
            "content": [
                { "type": "text", "text": "ab" },
                { "type": "text", "text": "cd", "marks": [{ "type": "link", "attrs": { "href": "x" } }] }
            ]
        }]
    });

    let inside = state(Schema::new(full_spec()).unwrap(), doc.clone(), Selection::cursor_at(4));
    let mut tr = inside.tr();
    tr.insert_text("!").unwrap();
    let next = inside.apply(&tr);
    assert_eq!(next.doc().child(0).child_count(), 2);

    // Links are not inclusive: typing at their end leaves them alone
    let after = state(schema, doc, Selection::cursor_at(5));
    let mut tr = after.tr();
    tr.insert_text("!").unwrap();
    let next = after.apply(&tr);
    assert_eq!(next.doc().child(0).child_count(), 3);
    assert!(next.doc().child(0).child(2).marks().is_empty());
}

#[test]
fn test_replace_selection_with_inline_node() {
    let schema = Schema::new(full_spec()).unwrap();
    let hard_break = schema.node("hard_break", None, Vec::new()).unwrap();
    let state = state(schema, json!({ "type": "doc", "content": [paragraph("ab")] }), Selection::cursor_at(2));

    let mut tr = state.tr();
    tr.replace_selection_with(hard_break).unwrap();
    let next = state.apply(&tr);

    let paragraph = next.doc().child(0);
    assert_eq!(paragraph.child_count(), 3);
    assert_eq!(paragraph.child(1).type_name(), "hard_break");
    assert_eq!(next.selection(), Selection::cursor_at(3));
}

#[test]
fn test_replace_selection_with_block_splits_textblock() {
    let schema = Schema::new(full_spec()).unwrap();
    let image = schema
        .node("image", json!({ "src": "a.png" }).as_object(), Vec::new())
        .unwrap();
    let state = state(schema, json!({ "type": "doc", "content": [paragraph("abcd")] }), Selection::cursor_at(3));

    let mut tr = state.tr();
    tr.replace_selection_with(image).unwrap();
    let next = state.apply(&tr);

    let names: Vec<&str> = next.doc().children().iter().map(Node::type_name).collect();
    assert_eq!(names, vec!["paragraph", "image", "paragraph"]);
    assert_eq!(next.doc().child(0).text_content(), "ab");
    assert_eq!(next.doc().child(2).text_content(), "cd");
    assert_eq!(next.selection(), Selection::cursor_at(6));
}

#[test]
fn test_selection_maps_through_insertions() {
    let schema = Schema::new(full_spec()).unwrap();
    let image = schema
        .node("image", json!({ "src": "a.png" }).as_object(), Vec::new())
        .unwrap();
    let state = state(schema, json!({ "type": "doc", "content": [paragraph("text")] }), Selection::text(2, 4));

    let mut tr = state.tr();
    tr.insert(0, image).unwrap();
    let next = state.apply(&tr);

    assert_eq!(next.selection(), Selection::text(3, 5));
    assert_eq!(tr.mapping().map(6, 1), 7);
}

#[test]
fn test_rejects_invalid_content() {
    let schema = Schema::new(full_spec()).unwrap();
    let text = schema.text("loose", Vec::new());
    let state = state(schema, json!({ "type": "doc", "content": [paragraph("x")] }), Selection::cursor_at(1));

    let mut tr = state.tr();
    assert!(tr.insert(0, text).is_err());
    assert!(!tr.doc_changed());
}

#[test]
fn test_coerce_into_smaller_schema() {
    let full = Schema::new(full_spec()).unwrap();
    let json: NodeJson = serde_json::from_value(json!({
        "type": "doc",
        "content": [
            { "type": "image", "attrs": { "src": "a.png" } },
            { "type": "paragraph", "content": [{ "type": "text", "text": "bold", "marks": [{ "type": "bold" }] }] }
        ]
    }))
    .unwrap();
    let doc = Node::from_json(&full, &json).unwrap();

    let base = Schema::new(base_spec()).unwrap();
    let coerced = Node::coerce_json(&base, &doc.to_json()).unwrap();

    assert_eq!(coerced.child_count(), 1);
    assert_eq!(coerced.text_content(), "bold");
    assert!(coerced.child(0).child(0).marks().is_empty());
}
