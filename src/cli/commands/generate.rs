//! Generate command: datastore collections to daily files

use super::shared::{print_summary, setup_logging};
use crate::cli::args::GenerateArgs;
use crate::models::ProcessingStats;
use crate::processor::BatchProcessor;
use crate::store::JsonLinesStore;
use anyhow::{Context, Result, bail};
use colored::*;
use tracing::info;

pub fn run_generate(args: &GenerateArgs) -> Result<ProcessingStats> {
    setup_logging(&args.log)?;
    let config = args.to_config().context("invalid configuration")?;
    let store_dir = config.store_dir();
    if !store_dir.is_dir() {
        bail!("datastore directory {} does not exist", store_dir.display());
    }

    if args.log.show_progress() {
        println!("{}", "Generating daily files".bright_green().bold());
        println!("  {} {}", "Datastore:".bright_cyan(), store_dir.display());
        println!("  {} {}", "Output:".bright_cyan(), config.output_dir.display());
        if let Some(limit) = config.batch_limit() {
            println!("  {} {} batches per instrument", "Sample mode:".bright_yellow(), limit);
        }
    }
    info!("Generating {} instruments", args.instruments.ids.len());

    let processor = BatchProcessor::new(config, Box::new(JsonLinesStore::new(store_dir)));
    let stats = processor.generate(&args.instruments.ids);

    if args.log.show_progress() {
        print_summary("Generation Summary", &stats);
    }
    if stats.instruments_processed == 0 && stats.instruments_failed > 0 {
        bail!("all {} instruments failed", stats.instruments_failed);
    }
    Ok(stats)
}
