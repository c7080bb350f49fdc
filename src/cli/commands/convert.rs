//! Full conversion pipeline command

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;

use crate::checkpoint::{load_checkpoint, save_checkpoint};
use crate::cli::progress::{DISK, GEAR, LOOKING_GLASS, message_bar, print_done, print_step};
use crate::formats::define::extract_blocks;
use crate::pipeline::{CancelToken, PipelineConfig, run_pipeline, write_output};
use crate::translate::{Translator, TranslatorConfig};

/// Arguments for the convert command.
pub struct ConvertArgs {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub checkpoint: PathBuf,
    pub fresh: bool,
    pub workers: usize,
    pub endpoint: String,
    pub model: String,
    pub instructions: Option<PathBuf>,
    pub random_instructions: Option<PathBuf>,
    pub quiet: bool,
}

/// Run the full conversion pipeline.
pub fn run(args: &ConvertArgs) -> anyhow::Result<()> {
    let started = Instant::now();

    if !args.quiet {
        print_step(1, 3, LOOKING_GLASS, "Reading message data...");
    }
    let raw = std::fs::read_to_string(&args.source)
        .with_context(|| format!("reading {}", args.source.display()))?;
    let blocks = extract_blocks(&raw);
    if blocks.is_empty() {
        anyhow::bail!("no DEFINE_MESSAGE blocks found in {}", args.source.display());
    }

    let loaded = if args.fresh {
        crate::checkpoint::Checkpoint::default()
    } else {
        load_checkpoint(&args.checkpoint)
    };
    let start = loaded.index.min(blocks.len());
    let mut results = loaded.entries;
    results.truncate(start);
    results.resize(blocks.len(), String::new());

    if start > 0 && !args.quiet {
        println!("Resuming from message {start}");
    }

    let mut translator_config = TranslatorConfig {
        endpoint: args.endpoint.clone(),
        model: args.model.clone(),
        ..TranslatorConfig::default()
    };
    if let Some(path) = &args.instructions {
        translator_config.instructions = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
    }
    if let Some(path) = &args.random_instructions {
        translator_config.random_instructions = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(ToString::to_string)
            .collect();
    }
    let translator = Translator::new(translator_config)?;

    let pipeline_config = PipelineConfig {
        workers: args.workers,
        ..PipelineConfig::default()
    };
    let cancel = CancelToken::new();

    if !args.quiet {
        print_step(2, 3, GEAR, "Translating messages...");
    }
    let bar = if args.quiet {
        None
    } else {
        let bar = message_bar(blocks.len() as u64, "Translating");
        bar.set_position(start as u64);
        Some(bar)
    };

    run_pipeline(
        &blocks,
        &translator,
        &mut results,
        start,
        &pipeline_config,
        &cancel,
        |completed, _total| {
            if let Some(bar) = &bar {
                bar.set_position((start + completed) as u64);
            }
        },
    );
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    if results.iter().all(|entry| !entry.is_empty()) {
        if !args.quiet {
            print_step(3, 3, DISK, "Writing output...");
        }
        write_output(&args.destination, &results)?;
        if !args.quiet {
            println!("Output written to {}", args.destination.display());
            print_done(started.elapsed());
        }
    } else {
        // Incomplete run: persist the contiguous prefix for resume.
        save_checkpoint(&args.checkpoint, &results)?;
        let filled = results.iter().take_while(|e| !e.is_empty()).count();
        if !args.quiet {
            println!(
                "Run incomplete: {filled}/{} messages done, checkpoint saved to {}",
                results.len(),
                args.checkpoint.display()
            );
        }
    }

    Ok(())
}
