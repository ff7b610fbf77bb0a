use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use scribe_editor::{EditorEvent, EventKind};

use super::ops::Op;
use super::open_editor;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Document JSON to load
    pub document: Option<PathBuf>,

    /// Operation to run, repeatable (format:bold, toggle:heading:{"level":2},
    /// embed:image:{"src":"cat.png"}, remove:link, key:Mod-b, text:hi,
    /// select:1-4)
    #[arg(short = 'x', long = "op")]
    pub ops: Vec<Op>,

    /// Make the editor editable regardless of the config
    #[arg(short, long)]
    pub editable: bool,

    /// Write the resulting document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Editor events to print, comma separated (plugin, select, input,
    /// focus, blur)
    #[arg(long, value_delimiter = ',', default_value = "plugin,select,input", value_parser = parse_event_kind)]
    pub events: Vec<EventKind>,

    /// Don't print editor events
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run(args: RunArgs, cwd: &Path) -> Result<()> {
    let mut editor = open_editor(cwd, args.document.as_deref(), args.editable)?;

    if !args.quiet {
        for kind in &args.events {
            editor.on(*kind, print_event);
        }
    }

    for op in &args.ops {
        println!("{} {}", "▶".blue(), op.to_string().bright_white());
        match op.apply(&mut editor) {
            Ok(true) => println!("  {} applied", "✓".green()),
            Ok(false) => println!("  {} nothing to do", "-".dimmed()),
            Err(err) => return Err(err.context(format!("Operation `{}` failed", op))),
        }
    }

    let document = serde_json::to_string_pretty(&editor.content())?;
    match &args.output {
        Some(path) => {
            fs::write(path, document).with_context(|| format!("Cannot write {}", path.display()))?;
            println!();
            println!("✨ {} Wrote {}", "Done".green().bold(), path.display());
        }
        None => {
            println!();
            println!("{}", document);
        }
    }

    Ok(())
}

fn print_event(event: &EditorEvent) {
    match event {
        EditorEvent::Plugin(state) => println!(
            "  {} {} applicable={} applied={} meta={}",
            "plugin".magenta(),
            state.name,
            state.applicable,
            state.applied,
            state.meta.to_json()
        ),
        EditorEvent::Select(Some(selection)) => {
            println!("  {} {}-{}", "select".magenta(), selection.from(), selection.to())
        }
        EditorEvent::Select(None) => println!("  {} none", "select".magenta()),
        EditorEvent::Input => println!("  {}", "input".magenta()),
        EditorEvent::Blur => println!("  {}", "blur".magenta()),
        EditorEvent::Focus => println!("  {}", "focus".magenta()),
    }
}

fn parse_event_kind(name: &str) -> Result<EventKind, String> {
    EventKind::parse(name.trim()).ok_or_else(|| format!("Unknown event `{}`", name))
}
