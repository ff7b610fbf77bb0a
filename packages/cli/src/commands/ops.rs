//! Operation strings accepted by `scribe run --op`:
//!
//! ```text
//! format:bold                 toggle:heading:{"level":2}
//! remove:link                 embed:image:{"src":"cat.png"}
//! key:Mod-b                   text:hello world
//! select:3                    select:1-6
//! ```

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use scribe_editor::{Attrs, Editor, Selection};

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Format { name: String, options: Option<Attrs> },
    Remove { name: String },
    Toggle { name: String, options: Option<Attrs> },
    Embed { name: String, options: Option<Attrs> },
    Key(String),
    Text(String),
    Select(Selection),
}

impl Op {
    /// Run against `editor`; `Ok(false)` means the operation had nothing to do
    pub fn apply(&self, editor: &mut Editor) -> Result<bool> {
        let applied = match self {
            Op::Format { name, options } => editor.format(name, options.clone())?,
            Op::Remove { name } => editor.remove_format(name)?,
            Op::Toggle { name, options } => editor.toggle_format(name, options.clone())?,
            Op::Embed { name, options } => editor.embed(name, options.clone())?,
            Op::Key(chord) => editor.handle_key(chord)?,
            Op::Text(text) => {
                editor.insert_text(text)?;
                true
            }
            Op::Select(selection) => {
                editor.set_selection(*selection)?;
                true
            }
        };
        Ok(applied)
    }
}

impl FromStr for Op {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        let (verb, rest) = input
            .split_once(':')
            .ok_or_else(|| anyhow!("Expected <operation>:<argument>, got `{}`", input))?;

        let op = match verb {
            "format" => {
                let (name, options) = named(rest)?;
                Op::Format { name, options }
            }
            "toggle" => {
                let (name, options) = named(rest)?;
                Op::Toggle { name, options }
            }
            "embed" => {
                let (name, options) = named(rest)?;
                Op::Embed { name, options }
            }
            "remove" => match named(rest)? {
                (name, None) => Op::Remove { name },
                (name, Some(_)) => bail!("`remove:{}` takes no options", name),
            },
            "key" if !rest.is_empty() => Op::Key(rest.to_string()),
            "key" => bail!("Missing key chord"),
            "text" => Op::Text(rest.to_string()),
            "select" => Op::Select(selection(rest)?),
            other => bail!("Unknown operation `{}`", other),
        };
        Ok(op)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Format { name, .. } => write!(f, "format {}", name),
            Op::Remove { name } => write!(f, "remove {}", name),
            Op::Toggle { name, .. } => write!(f, "toggle {}", name),
            Op::Embed { name, .. } => write!(f, "embed {}", name),
            Op::Key(chord) => write!(f, "key {}", chord),
            Op::Text(text) => write!(f, "text {:?}", text),
            Op::Select(selection) => write!(f, "select {}-{}", selection.from(), selection.to()),
        }
    }
}

/// `name` or `name:{json object}`
fn named(rest: &str) -> Result<(String, Option<Attrs>)> {
    let (name, options) = match rest.split_once(':') {
        Some((name, json)) => (name, Some(json)),
        None => (rest, None),
    };
    if name.is_empty() {
        bail!("Missing capability name");
    }

    let options = match options {
        Some(json) => match serde_json::from_str(json)? {
            serde_json::Value::Object(attrs) => Some(attrs),
            _ => bail!("Options for `{}` must be a JSON object", name),
        },
        None => None,
    };
    Ok((name.to_string(), options))
}

/// `pos` for a cursor, `anchor-head` for a range
fn selection(rest: &str) -> Result<Selection> {
    let selection = match rest.split_once('-') {
        Some((anchor, head)) => Selection::text(anchor.trim().parse()?, head.trim().parse()?),
        None => Selection::cursor_at(rest.trim().parse()?),
    };
    Ok(selection)
}
