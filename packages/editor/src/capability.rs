//! # Capabilities
//!
//! A capability is a named bundle of predicates and operations describing one
//! formatting feature. The three kinds carry exactly the fields they need:
//!
//! - **Format**: apply / remove / toggle, applied + applicable predicates,
//!   optional metadata
//! - **Embed**: embed, applied + applicable predicates, optional metadata
//! - **Input**: keymap and autoformat rules only; always applicable, never
//!   applied
//!
//! Every capability also lists the schema types it needs; the facade checks
//! them once when it builds its schema.

use std::fmt;
use std::rc::Rc;

use regex::Regex;
use scribe_model::{Command, EditorState, Schema};
use serde::Serialize;

use crate::commands::{Operation, Predicate};
use crate::equality::Value;
use crate::predicates::MetaGetter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CapabilityKind {
    Format,
    Embed,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Apply,
    Remove,
    Toggle,
    Embed,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Apply => "apply",
            OperationKind::Remove => "remove",
            OperationKind::Toggle => "toggle",
            OperationKind::Embed => "embed",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Autoformat rule: text matching `pattern` at the start of a textblock turns
/// it into `node_type`, with `attr` taken from the first capture group
#[derive(Debug, Clone)]
pub struct InputRule {
    pub pattern: Regex,
    pub node_type: String,
    pub attr: Option<String>,
}

pub type InputRules = Rc<dyn Fn(&Schema) -> Vec<InputRule>>;

#[derive(Clone)]
pub struct FormatCapability {
    pub name: String,
    pub apply: Operation,
    pub remove: Operation,
    pub toggle: Operation,
    pub is_applied: Predicate,
    pub is_applicable: Predicate,
    pub get_meta: Option<MetaGetter>,
    pub keymap: Vec<(String, Command)>,
    pub requires: Vec<String>,
}

#[derive(Clone)]
pub struct EmbedCapability {
    pub name: String,
    pub embed: Operation,
    pub is_applied: Predicate,
    pub is_applicable: Predicate,
    pub get_meta: Option<MetaGetter>,
    pub keymap: Vec<(String, Command)>,
    pub requires: Vec<String>,
}

#[derive(Clone)]
pub struct InputCapability {
    pub name: String,
    pub keymap: Vec<(String, Command)>,
    pub input_rules: Option<InputRules>,
    pub requires: Vec<String>,
}

#[derive(Clone)]
pub enum Capability {
    Format(FormatCapability),
    Embed(EmbedCapability),
    Input(InputCapability),
}

impl Capability {
    pub fn name(&self) -> &str {
        match self {
            Capability::Format(format) => &format.name,
            Capability::Embed(embed) => &embed.name,
            Capability::Input(input) => &input.name,
        }
    }

    pub fn kind(&self) -> CapabilityKind {
        match self {
            Capability::Format(_) => CapabilityKind::Format,
            Capability::Embed(_) => CapabilityKind::Embed,
            Capability::Input(_) => CapabilityKind::Input,
        }
    }

    pub fn keymap(&self) -> &[(String, Command)] {
        match self {
            Capability::Format(format) => &format.keymap,
            Capability::Embed(embed) => &embed.keymap,
            Capability::Input(input) => &input.keymap,
        }
    }

    /// Schema node and mark names the capability cannot work without
    pub fn required_types(&self) -> &[String] {
        match self {
            Capability::Format(format) => &format.requires,
            Capability::Embed(embed) => &embed.requires,
            Capability::Input(input) => &input.requires,
        }
    }

    pub fn is_applicable(&self, state: &EditorState) -> bool {
        match self {
            Capability::Format(format) => (format.is_applicable)(state),
            Capability::Embed(embed) => (embed.is_applicable)(state),
            Capability::Input(_) => true,
        }
    }

    pub fn is_applied(&self, state: &EditorState) -> bool {
        match self {
            Capability::Format(format) => (format.is_applied)(state),
            Capability::Embed(embed) => (embed.is_applied)(state),
            Capability::Input(_) => false,
        }
    }

    pub fn meta(&self, state: &EditorState) -> Value {
        let getter = match self {
            Capability::Format(format) => format.get_meta.as_ref(),
            Capability::Embed(embed) => embed.get_meta.as_ref(),
            Capability::Input(_) => None,
        };
        getter.map_or(Value::Null, |get_meta| get_meta(state))
    }

    /// The operation of this kind, if the capability supports it
    pub fn operation(&self, kind: OperationKind) -> Option<&Operation> {
        match (self, kind) {
            (Capability::Format(format), OperationKind::Apply) => Some(&format.apply),
            (Capability::Format(format), OperationKind::Remove) => Some(&format.remove),
            (Capability::Format(format), OperationKind::Toggle) => Some(&format.toggle),
            (Capability::Embed(embed), OperationKind::Embed) => Some(&embed.embed),
            _ => None,
        }
    }

    pub fn input_rules(&self, schema: &Schema) -> Vec<InputRule> {
        match self {
            Capability::Input(InputCapability {
                input_rules: Some(rules),
                ..
            }) => rules(schema),
            _ => Vec::new(),
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("keys", &self.keymap().iter().map(|(chord, _)| chord.as_str()).collect::<Vec<_>>())
            .field("requires", &self.required_types())
            .finish()
    }
}
