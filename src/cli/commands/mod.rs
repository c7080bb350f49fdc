//! CLI subcommands

use clap::Subcommand;
use std::path::PathBuf;

pub mod convert;
pub mod scan;

#[derive(Subcommand)]
pub enum Commands {
    /// Translate a message data header into an EZTR source file
    Convert {
        /// Source header containing DEFINE_MESSAGE blocks
        #[arg(short, long)]
        source: PathBuf,

        /// Output C file to generate
        #[arg(short, long)]
        destination: PathBuf,

        /// Checkpoint file for resuming an interrupted run
        #[arg(short, long, default_value = "checkpoint_data.c")]
        checkpoint: PathBuf,

        /// Ignore an existing checkpoint and start over
        #[arg(long)]
        fresh: bool,

        /// Concurrent translation workers
        #[arg(short, long, default_value_t = 3)]
        workers: usize,

        /// Translation backend chat endpoint
        #[arg(long, default_value = "http://localhost:11434/api/chat")]
        endpoint: String,

        /// Model name passed to the backend
        #[arg(long, default_value = "mistral:instruct")]
        model: String,

        /// File with the system instruction ({lineLength} is substituted)
        #[arg(long)]
        instructions: Option<PathBuf>,

        /// File with supplementary instructions, one per line, sampled
        /// randomly
        #[arg(long)]
        random_instructions: Option<PathBuf>,

        /// Suppress the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Parse and list messages without translating anything
    Scan {
        /// Source header containing DEFINE_MESSAGE blocks
        #[arg(short, long)]
        source: PathBuf,

        /// Show per-segment detail
        #[arg(short, long)]
        detailed: bool,
    },
}

impl Commands {
    /// Execute the selected subcommand
    pub fn execute(self) -> anyhow::Result<()> {
        match self {
            Commands::Convert {
                source,
                destination,
                checkpoint,
                fresh,
                workers,
                endpoint,
                model,
                instructions,
                random_instructions,
                quiet,
            } => convert::run(&convert::ConvertArgs {
                source,
                destination,
                checkpoint,
                fresh,
                workers,
                endpoint,
                model,
                instructions,
                random_instructions,
                quiet,
            }),
            Commands::Scan { source, detailed } => scan::run(&source, detailed),
        }
    }
}
