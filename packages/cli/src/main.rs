mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{inspect, run, InspectArgs, RunArgs};
use tracing_subscriber::EnvFilter;

/// Scribe CLI - drive a headless rich-text editor from the terminal
#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the enabled capabilities and their state for a document
    Inspect(InspectArgs),

    /// Run editing operations against a document
    Run(RunArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Inspect(args) => inspect(args, &cwd),
            Command::Run(args) => run(args, &cwd),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
