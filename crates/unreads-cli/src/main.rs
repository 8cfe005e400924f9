use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use unreads_cli::cli::{init_tracing, load_config, run_aggregate, run_count, NarrowArg};

#[derive(Parser)]
#[command(name = "unreads-cli")]
#[command(about = "Compute unread counts from an unread-state snapshot")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, short)]
    pretty: bool,

    /// Path to JSON aggregator config file
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every unread aggregate
    Aggregate {
        /// Snapshot JSON file
        #[arg(long, short = 's')]
        snapshot: PathBuf,

        /// Include memo hit/miss counters
        #[arg(long)]
        stats: bool,
    },

    /// Print the unread count of one narrow
    Count {
        /// Snapshot JSON file
        #[arg(long, short = 's')]
        snapshot: PathBuf,

        #[command(subcommand)]
        narrow: NarrowArg,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    let output = match cli.command {
        Commands::Aggregate { snapshot, stats } => run_aggregate(&snapshot, config, stats)?,
        Commands::Count { snapshot, narrow } => run_count(&snapshot, config, narrow.into())?,
    };

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }
    .context("Failed to render output")?;
    println!("{}", rendered);
    Ok(())
}
