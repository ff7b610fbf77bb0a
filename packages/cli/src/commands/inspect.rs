use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use scribe_editor::{PluginState, DEFAULT_CONFIG_NAME};

use super::open_editor;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Document JSON to load
    pub document: Option<PathBuf>,

    /// Place the cursor (`pos`) or select a range (`anchor-head`) first
    #[arg(short, long)]
    pub select: Option<String>,

    /// Print the capability states as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn inspect(args: InspectArgs, cwd: &Path) -> Result<()> {
    let mut editor = open_editor(cwd, args.document.as_deref(), false)?;
    if let Some(select) = &args.select {
        format!("select:{}", select).parse::<super::ops::Op>()?.apply(&mut editor)?;
    }

    let capabilities = editor.capabilities();
    if args.json {
        let states: Vec<&PluginState> = capabilities.iter().map(|state| state.as_ref()).collect();
        println!("{}", serde_json::to_string_pretty(&states)?);
        return Ok(());
    }

    println!("🔍 {} {}", "Inspecting".green().bold(), cwd.join(DEFAULT_CONFIG_NAME).display());
    println!(
        "   Mode: {}, {}",
        if editor.is_inline() { "inline" } else { "block" },
        if editor.is_editable() { "editable" } else { "read-only" }
    );
    let selection = editor.state().selection();
    println!("   Selection: {}-{}", selection.from(), selection.to());
    println!();

    println!("{}", "Capabilities".bright_white().bold());
    for state in &capabilities {
        let applicable = if state.applicable { "applicable".green() } else { "inapplicable".dimmed() };
        let applied = if state.applied { "applied".cyan().bold() } else { "-".dimmed() };
        println!(
            "   {:<12} {:<8} {:<14} {:<8} {}",
            state.name,
            format!("{:?}", state.kind),
            applicable,
            applied,
            state.meta.to_json()
        );
    }

    let schema = editor.schema();
    println!();
    println!("{}", "Schema".bright_white().bold());
    let nodes: Vec<&str> = schema.node_types().iter().map(|node| node.name()).collect();
    let marks: Vec<&str> = schema.mark_types().iter().map(|mark| mark.name()).collect();
    println!("   Nodes: {}", nodes.join(", "));
    println!("   Marks: {}", if marks.is_empty() { "-".to_string() } else { marks.join(", ") });

    let rules = editor.input_rules();
    if !rules.is_empty() {
        println!();
        println!("{}", "Input rules".bright_white().bold());
        for rule in rules {
            println!("   {} → {}", rule.pattern.as_str().yellow(), rule.node_type);
        }
    }

    Ok(())
}
