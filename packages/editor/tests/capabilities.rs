use scribe_editor::commands::embed;
use scribe_editor::{Editor, EditorConfig, EditorError, NodeJson, Selection};
use scribe_model::Transaction;
use serde_json::json;

fn editor(plugins: &[&str], doc: serde_json::Value) -> Editor {
    let mut editor = Editor::new(EditorConfig::new(plugins).editable(true)).unwrap();
    let json: NodeJson = serde_json::from_value(doc).unwrap();
    editor.set_content(&json).unwrap();
    editor
}

fn paragraph(text: &str) -> serde_json::Value {
    json!({ "type": "paragraph", "content": [{ "type": "text", "text": text }] })
}

fn attrs(value: serde_json::Value) -> Option<scribe_editor::Attrs> {
    value.as_object().cloned()
}

#[test]
fn test_format_twice_is_a_no_op() {
    let mut editor = editor(&["bold"], json!({ "type": "doc", "content": [paragraph("hello world")] }));
    editor.set_selection(Selection::text(1, 6)).unwrap();

    assert!(editor.format("bold", None).unwrap());
    let once = editor.content();
    assert!(editor.capability("bold").unwrap().applied);

    assert!(!editor.format("bold", None).unwrap());
    assert_eq!(editor.content(), once);
}

#[test]
fn test_toggle_twice_restores_document() {
    let mut editor = editor(&["italic", "heading"], json!({ "type": "doc", "content": [paragraph("title")] }));
    let original = editor.content();
    editor.set_selection(Selection::text(1, 4)).unwrap();

    assert!(editor.toggle_format("italic", None).unwrap());
    assert_ne!(editor.content(), original);
    assert!(editor.toggle_format("italic", None).unwrap());
    assert_eq!(editor.content(), original);

    assert!(editor.toggle_format("heading", attrs(json!({ "level": 2 }))).unwrap());
    assert!(editor.capability("heading").unwrap().applied);
    assert!(editor.toggle_format("heading", None).unwrap());
    assert_eq!(editor.content(), original);
}

#[test]
fn test_remove_format_resets_heading() {
    let mut editor = editor(
        &["heading"],
        json!({ "type": "doc", "content": [{ "type": "heading", "attrs": { "level": 3 }, "content": [{ "type": "text", "text": "t" }] }] }),
    );
    editor.set_selection(Selection::cursor_at(1)).unwrap();
    let meta = editor.capability("heading").unwrap().meta.clone();
    assert_eq!(meta.get("level").map(|level| level.to_json()), Some(json!(3.0)));

    assert!(editor.remove_format("heading").unwrap());
    assert_eq!(editor.state().doc().child(0).type_name(), "paragraph");
}

#[test]
fn test_link_requires_href() {
    let mut editor = editor(&["link"], json!({ "type": "doc", "content": [paragraph("docs")] }));
    editor.set_selection(Selection::text(1, 5)).unwrap();

    // Applicable to the selection, but nothing to build without an href
    assert!(editor.capability("link").unwrap().applicable);
    assert!(!editor.format("link", None).unwrap());
    assert!(editor.format("link", attrs(json!({ "href": "https://example.com" }))).unwrap());

    let meta = editor.capability("link").unwrap().meta.to_json();
    assert_eq!(meta, json!({ "href": "https://example.com", "title": null }));
}

#[test]
fn test_blockquote_not_applicable_leaves_state() {
    // A list item must start with a paragraph, so its first one cannot be wrapped
    let mut editor = editor(
        &["blockquote", "list"],
        json!({
            "type": "doc",
            "content": [{
                "type": "unordered_list",
                "content": [{ "type": "list_item", "content": [paragraph("item")] }]
            }]
        }),
    );
    editor.set_selection(Selection::cursor_at(4)).unwrap();
    assert!(!editor.capability("blockquote").unwrap().applicable);

    let before = editor.state().doc().clone();
    let selection = editor.state().selection();
    let err = editor.format("blockquote", None).unwrap_err();

    assert!(matches!(err, EditorError::NotApplicable(name) if name == "blockquote"));
    assert_eq!(editor.state().doc(), &before);
    assert_eq!(editor.state().selection(), selection);
}

#[test]
fn test_blockquote_wrap_and_unwrap() {
    let mut editor = editor(&["blockquote"], json!({ "type": "doc", "content": [paragraph("quote")] }));
    editor.set_selection(Selection::cursor_at(2)).unwrap();

    assert!(editor.format("blockquote", None).unwrap());
    assert!(editor.capability("blockquote").unwrap().applied);
    assert!(!editor.format("blockquote", None).unwrap());

    assert!(editor.remove_format("blockquote").unwrap());
    assert_eq!(editor.state().doc().child(0).type_name(), "paragraph");
}

#[test]
fn test_embed_replaces_empty_paragraph() {
    let mut editor = editor(&["image"], json!({ "type": "doc", "content": [{ "type": "paragraph" }] }));
    assert!(editor.capability("image").unwrap().applicable);

    assert!(editor.embed("image", attrs(json!({ "src": "cat.png" }))).unwrap());
    let doc = editor.state().doc();
    assert_eq!(doc.child_count(), 1);
    assert_eq!(doc.child(0).type_name(), "image");
    assert_eq!(editor.state().selection(), Selection::Node { from: 0, to: 1 });

    let image = editor.capability("image").unwrap();
    assert!(image.applied);
    assert_eq!(image.meta.get("src").map(|src| src.to_json()), Some(json!("cat.png")));
}

#[test]
fn test_embed_before_text_keeps_it() {
    let editor = editor(&["image"], json!({ "type": "doc", "content": [paragraph("keep me")] }));
    let state = editor.state().clone();
    assert!(!editor.capability("image").unwrap().applicable);

    let mut next = None;
    let mut capture = |tr: Transaction| next = Some(state.apply(&tr));
    let embed_image = embed()("image")(attrs(json!({ "src": "cat.png" })));
    assert!(embed_image(&state, Some(&mut capture)));

    let next = next.unwrap();
    assert_eq!(next.doc().child_count(), 2);
    assert_eq!(next.doc().child(0).type_name(), "image");
    assert_eq!(next.doc().child(1), state.doc().child(0));
}

#[test]
fn test_errors_by_name_and_kind() {
    let mut editor = editor(&["bold", "list"], json!({ "type": "doc", "content": [paragraph("x")] }));
    editor.set_selection(Selection::text(1, 2)).unwrap();

    assert!(matches!(editor.format("italic", None), Err(EditorError::NotFound(name)) if name == "italic"));
    assert!(matches!(
        editor.embed("bold", None),
        Err(EditorError::UnsupportedOperation { name, operation }) if name == "bold" && operation == "embed"
    ));
    assert!(matches!(editor.toggle_format("list", None), Err(EditorError::UnsupportedOperation { .. })));
}

#[test]
fn test_unknown_capability_in_config() {
    let result = Editor::new(EditorConfig::new(&["bold", "strike"]));
    assert!(matches!(result, Err(EditorError::UnknownCapability(name)) if name == "strike"));
}

#[test]
fn test_enable_and_disable() {
    let mut editor = editor(&["bold"], json!({ "type": "doc", "content": [paragraph("text")] }));

    editor.enable_capabilities(&["italic", "bold", "image"]).unwrap();
    assert_eq!(editor.plugins(), &["italic", "image", "bold"]);
    assert!(editor.capability("image").is_some());
    assert_eq!(editor.state().doc().text_content(), "text");

    editor.disable_capabilities(&["bold", "image"]).unwrap();
    assert_eq!(editor.plugins(), &["italic"]);
    assert!(editor.capability("bold").is_none());
    assert!(matches!(editor.format("bold", None), Err(EditorError::NotFound(_))));
}

#[test]
fn test_disable_coerces_document() {
    let mut editor = editor(
        &["bold", "image"],
        json!({
            "type": "doc",
            "content": [
                { "type": "image", "attrs": { "src": "a.png" } },
                { "type": "paragraph", "content": [{ "type": "text", "text": "b", "marks": [{ "type": "bold" }] }] }
            ]
        }),
    );

    editor.disable_capabilities(&["image", "bold"]).unwrap();
    let doc = editor.state().doc();
    assert_eq!(doc.child_count(), 1);
    assert!(doc.child(0).child(0).marks().is_empty());
}

#[test]
fn test_editable_gates_user_input() {
    let mut editor = Editor::new(EditorConfig::new(&["bold"])).unwrap();
    assert!(!editor.is_editable());
    assert!(matches!(editor.insert_text("a"), Err(EditorError::ReadOnly)));
    assert!(matches!(editor.handle_key("Mod-b"), Err(EditorError::ReadOnly)));

    editor.set_editable(true);
    assert!(editor.is_editable());
    editor.insert_text("ab").unwrap();
    assert_eq!(editor.state().doc().text_content(), "ab");

    // Editability survives a rebuild
    editor.enable_capabilities(&["italic"]).unwrap();
    assert!(editor.is_editable());
}

#[test]
fn test_keymaps() {
    let mut editor = editor(&["bold", "list"], json!({ "type": "doc", "content": [paragraph("word")] }));
    editor.set_selection(Selection::text(1, 5)).unwrap();

    assert!(editor.handle_key("Mod-b").unwrap());
    assert!(editor.capability("bold").unwrap().applied);

    editor.set_selection(Selection::cursor_at(3)).unwrap();
    assert!(editor.handle_key("Mod-Enter").unwrap());
    assert_eq!(editor.state().doc().child(0).child_count(), 3);

    // Enter outside a list item is left alone
    assert!(!editor.handle_key("Enter").unwrap());
}

#[test]
fn test_enter_splits_list_item() {
    let mut editor = editor(
        &["list"],
        json!({
            "type": "doc",
            "content": [{
                "type": "unordered_list",
                "content": [{ "type": "list_item", "content": [paragraph("onetwo")] }]
            }]
        }),
    );
    editor.set_selection(Selection::cursor_at(6)).unwrap();

    assert!(editor.handle_key("Enter").unwrap());
    let list = editor.state().doc().child(0);
    assert_eq!(list.child_count(), 2);
    assert_eq!(list.child(0).text_content(), "one");
    assert_eq!(list.child(1).text_content(), "two");
}

#[test]
fn test_inline_editor_breaks_on_enter() {
    let mut editor = Editor::new(EditorConfig::new(&["bold"]).inline(true).editable(true)).unwrap();
    editor.insert_text("ab").unwrap();

    assert!(editor.handle_key("Enter").unwrap());
    assert_eq!(editor.state().doc().child_count(), 2);
    assert_eq!(editor.state().doc().child(1).type_name(), "hard_break");
    assert_eq!(editor.input_rules().len(), 0);
}

#[test]
fn test_list_input_rules() {
    let editor = Editor::new(EditorConfig::new(&["list"])).unwrap();
    let rules = editor.input_rules();
    assert_eq!(rules.len(), 2);
    assert!(rules.iter().any(|rule| rule.node_type == "unordered_list"));
}
