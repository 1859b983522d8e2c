mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{copy, edit, tree, CopyArgs, EditArgs, TreeArgs};
use config::Config;
use tracing_subscriber::EnvFilter;

/// Tessera CLI - structural editing for markup documents
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log editor internals to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the node tree of a file
    Tree(TreeArgs),

    /// Apply a structural action to a file
    Edit(EditArgs),

    /// Print the source of the selected nodes
    Copy(CopyArgs),
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = Config::load(&cwd)?;

    match command {
        Command::Tree(args) => tree(args, &config),
        Command::Edit(args) => edit(args, &config),
        Command::Copy(args) => copy(args, &config),
    }
}
