//! msgweave command-line binary

fn main() -> anyhow::Result<()> {
    msgweave::cli::run_cli()
}
