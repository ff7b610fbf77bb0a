use std::cell::RefCell;
use std::rc::Rc;

use scribe_editor::emitter::Listener;
use scribe_editor::{Editor, EditorConfig, EditorEvent, EventKind, NodeJson, PluginState, Selection};
use serde_json::json;

type Log = Rc<RefCell<Vec<String>>>;

/// "hello " plain, "world" bold
fn editor() -> Editor {
    let mut editor = Editor::new(EditorConfig::new(&["bold"]).editable(true)).unwrap();
    let json: NodeJson = serde_json::from_value(json!({
        "type": "doc",
        "content": [{
            "type": "paragraph",
            "content": [
                { "type": "text", "text": "hello " },
                { "type": "text", "text": "world", "marks": [{ "type": "bold" }] }
            ]
        }]
    }))
    .unwrap();
    editor.set_content(&json).unwrap();
    editor.set_selection(Selection::text(1, 3)).unwrap();
    editor
}

fn describe(event: &EditorEvent) -> String {
    match event {
        EditorEvent::Plugin(state) => format!("plugin:{}:{}", state.name, state.applied),
        EditorEvent::Select(Some(selection)) => format!("select:{}-{}", selection.from(), selection.to()),
        EditorEvent::Select(None) => "select:none".to_string(),
        EditorEvent::Blur => "blur".to_string(),
        EditorEvent::Focus => "focus".to_string(),
        EditorEvent::Input => "input".to_string(),
    }
}

fn record(editor: &mut Editor, kinds: &[EventKind]) -> Log {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    for kind in kinds {
        let sink = Rc::clone(&log);
        editor.on(*kind, move |event| sink.borrow_mut().push(describe(event)));
    }
    log
}

#[test]
fn test_only_changes_are_announced() {
    let mut editor = editor();
    let seen: Rc<RefCell<Vec<Rc<PluginState>>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    editor.on(EventKind::Plugin, move |event| {
        if let EditorEvent::Plugin(state) = event {
            sink.borrow_mut().push(Rc::clone(state));
        }
    });

    let transitions = [
        Selection::text(2, 5),
        Selection::text(8, 10),
        Selection::text(9, 11),
        Selection::text(8, 11),
        Selection::text(1, 4),
        Selection::text(2, 3),
    ];
    for selection in transitions {
        editor.set_selection(selection).unwrap();
    }

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].applied);
    assert_eq!(seen[0].meta.to_json(), json!({}));
    assert!(!seen[1].applied);
    assert_eq!(seen[1].meta.to_json(), json!(null));
}

#[test]
fn test_unchanged_state_keeps_identity() {
    let mut editor = editor();
    let before = editor.capability("bold").unwrap();
    editor.set_selection(Selection::text(2, 5)).unwrap();
    assert!(Rc::ptr_eq(&before, &editor.capability("bold").unwrap()));
}

#[test]
fn test_select_follows_plugin_notifications() {
    let mut editor = editor();
    let log = record(&mut editor, &[EventKind::Select, EventKind::Plugin, EventKind::Input]);

    editor.set_selection(Selection::text(5, 9)).unwrap();
    assert_eq!(*log.borrow(), vec!["plugin:bold:true", "select:5-9"]);
    assert_eq!(editor.selection(), Some(Selection::text(5, 9)));

    // Typed text takes the plain marks at the start of the selection
    log.borrow_mut().clear();
    editor.insert_text("X").unwrap();
    assert_eq!(*log.borrow(), vec!["plugin:bold:false", "select:none", "input"]);
    assert_eq!(editor.selection(), None);
}

#[test]
fn test_one_input_per_transition() {
    let mut editor = editor();
    editor.set_selection(Selection::cursor_at(3)).unwrap();
    let log = record(&mut editor, &[EventKind::Input]);

    editor.insert_text("a").unwrap();
    editor.insert_text("b").unwrap();
    editor.set_selection(Selection::cursor_at(1)).unwrap();

    assert_eq!(*log.borrow(), vec!["input", "input"]);
    assert_eq!(editor.state().doc().text_content(), "heabllo world");
}

#[test]
fn test_initial_notifications_reach_listeners() {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let listener: Listener = Box::new(move |event| sink.borrow_mut().push(describe(event)));

    let editor = Editor::with_listeners(EditorConfig::new(&["bold", "italic", "list"]), vec![(EventKind::Plugin, listener)]).unwrap();

    assert_eq!(
        *log.borrow(),
        vec!["plugin:bold:false", "plugin:italic:false", "plugin:list:false"]
    );
    assert_eq!(editor.capabilities().len(), 3);
}

#[test]
fn test_enable_announces_new_capabilities() {
    let mut editor = editor();
    let log = record(&mut editor, &[EventKind::Plugin]);

    editor.enable_capabilities(&["italic"]).unwrap();
    assert_eq!(*log.borrow(), vec!["plugin:italic:false", "plugin:bold:false"]);
}

#[test]
fn test_rebuild_keeps_selection_quiet() {
    let mut editor = editor();
    editor.set_selection(Selection::text(1, 4)).unwrap();
    editor.enable_capabilities(&["italic"]).unwrap();
    let log = record(&mut editor, &[EventKind::Select]);

    editor.set_editable(false);
    editor.set_editable(true);
    assert!(log.borrow().is_empty());
    assert_eq!(editor.state().selection(), Selection::text(1, 4));

    editor.disable_capabilities(&["italic"]).unwrap();
    editor.set_selection(Selection::text(1, 5)).unwrap();
    assert_eq!(*log.borrow(), vec!["select:1-5"]);
}

#[test]
fn test_focus_blur_and_off() {
    let mut editor = editor();
    let log = record(&mut editor, &[EventKind::Focus]);
    let sink = Rc::clone(&log);
    let blur = editor.on(EventKind::Blur, move |event| sink.borrow_mut().push(describe(event)));

    editor.focus();
    editor.blur();
    assert!(editor.off(EventKind::Blur, blur));
    editor.blur();
    assert!(!editor.off(EventKind::Blur, blur));

    assert_eq!(*log.borrow(), vec!["focus", "blur"]);
}
