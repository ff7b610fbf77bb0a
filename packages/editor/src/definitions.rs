//! Built-in capabilities.
//!
//! | name       | kind   | keys   |
//! |------------|--------|--------|
//! | bold       | Format | Mod-b  |
//! | italic     | Format | Mod-i  |
//! | underline  | Format | Mod-u  |
//! | link       | Format |        |
//! | heading    | Format |        |
//! | blockquote | Format |        |
//! | image      | Embed  |        |
//! | list       | Input  | Enter  |

use std::rc::Rc;

use regex::Regex;
use scribe_model::Schema;
use tracing::warn;

use crate::capability::{Capability, EmbedCapability, FormatCapability, InputCapability, InputRule};
use crate::commands::{
    apply_mark, embed, remove_mark, reset_block, set_block_to, split_list_item, toggle_block, toggle_mark,
    toggle_wrapping, unwrap_from, wrap_in, DEFAULT_BLOCK_TYPE,
};
use crate::predicates::{
    accept_nbsp, block_attrs, can_embed, can_toggle_block, can_toggle_mark, can_toggle_wrapping, current_block_is,
    mark_attrs, mark_is_applied, wrapped_in,
};

pub const ALL: &[&str] = &[
    "bold",
    "italic",
    "underline",
    "link",
    "heading",
    "blockquote",
    "image",
    "list",
];

pub fn by_name(name: &str) -> Option<Capability> {
    let capability = match name {
        "bold" => mark_capability("bold", Some("Mod-b")),
        "italic" => mark_capability("italic", Some("Mod-i")),
        "underline" => mark_capability("underline", Some("Mod-u")),
        "link" => mark_capability("link", None),
        "heading" => heading(),
        "blockquote" => blockquote(),
        "image" => image(),
        "list" => list(),
        _ => return None,
    };
    Some(capability)
}

fn mark_capability(name: &str, keys: Option<&str>) -> Capability {
    Capability::Format(FormatCapability {
        name: name.to_string(),
        apply: apply_mark()(name),
        remove: remove_mark()(name),
        toggle: toggle_mark()(name),
        is_applied: mark_is_applied()(name),
        is_applicable: can_toggle_mark()(name),
        get_meta: Some(mark_attrs(name)),
        keymap: keys
            .map(|keys| vec![(keys.to_string(), toggle_mark()(name)(None))])
            .unwrap_or_default(),
        requires: vec![name.to_string()],
    })
}

fn heading() -> Capability {
    Capability::Format(FormatCapability {
        name: "heading".to_string(),
        apply: set_block_to()("heading"),
        remove: reset_block()("heading"),
        toggle: toggle_block()("heading"),
        is_applied: current_block_is()("heading"),
        is_applicable: can_toggle_block()("heading"),
        get_meta: Some(block_attrs()),
        keymap: Vec::new(),
        requires: vec!["heading".to_string(), DEFAULT_BLOCK_TYPE.to_string()],
    })
}

fn blockquote() -> Capability {
    Capability::Format(FormatCapability {
        name: "blockquote".to_string(),
        apply: wrap_in()("blockquote"),
        remove: unwrap_from()("blockquote"),
        toggle: toggle_wrapping()("blockquote"),
        is_applied: wrapped_in()("blockquote"),
        is_applicable: can_toggle_wrapping()("blockquote"),
        get_meta: None,
        keymap: Vec::new(),
        requires: vec!["blockquote".to_string()],
    })
}

fn image() -> Capability {
    Capability::Embed(EmbedCapability {
        name: "image".to_string(),
        embed: embed()("image"),
        is_applied: current_block_is()("image"),
        is_applicable: can_embed()("image"),
        get_meta: Some(block_attrs()),
        keymap: Vec::new(),
        requires: vec!["image".to_string()],
    })
}

fn list() -> Capability {
    Capability::Input(InputCapability {
        name: "list".to_string(),
        keymap: vec![("Enter".to_string(), split_list_item()("list_item")(None))],
        input_rules: Some(Rc::new(list_rules)),
        requires: vec![
            "ordered_list".to_string(),
            "unordered_list".to_string(),
            "list_item".to_string(),
        ],
    })
}

fn list_rules(schema: &Schema) -> Vec<InputRule> {
    [
        (r"^(\d+)\. $", "ordered_list", Some("order")),
        (r"^\s*([-+*]) $", "unordered_list", None),
    ]
    .into_iter()
    .filter(|(_, node_type, _)| schema.node_type(node_type).is_some())
    .filter_map(|(pattern, node_type, attr)| {
        let compiled = Regex::new(pattern).and_then(|pattern| accept_nbsp(&pattern));
        match compiled {
            Ok(pattern) => Some(InputRule {
                pattern,
                node_type: node_type.to_string(),
                attr: attr.map(str::to_string),
            }),
            Err(err) => {
                warn!(pattern, error = %err, "skipping input rule");
                None
            }
        }
    })
    .collect()
}
