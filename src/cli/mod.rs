//! msgweave CLI - command-line interface for the translation pipeline

pub mod commands;
pub mod progress;

use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(name = "msgweave")]
#[command(about = "msgweave: machine-translate N64 dialogue data into EZTR calls", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Run the msgweave CLI
pub fn run_cli() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    cli.command.execute()?;

    Ok(())
}
