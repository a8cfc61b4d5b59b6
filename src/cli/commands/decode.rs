//! Decode command: flat files back through the batcher and encoders

use super::shared::{discover_inputs, print_summary, setup_logging};
use crate::cli::args::DecodeArgs;
use crate::models::ProcessingStats;
use crate::naming::detect_instrument;
use crate::processor::BatchProcessor;
use crate::schema::{self, InstrumentSchema};
use crate::store::MemoryStore;
use anyhow::{Context, Result, bail};
use colored::*;
use std::path::PathBuf;
use tracing::warn;

/// Pair every input with its schema, skipping files whose instrument is unknown
fn resolve_inputs(
    files: Vec<PathBuf>,
    instrument: Option<&str>,
) -> Result<Vec<(PathBuf, &'static InstrumentSchema)>> {
    let fixed = instrument.map(schema::lookup).transpose()?;
    let mut resolved = Vec::with_capacity(files.len());
    for file in files {
        match fixed {
            Some(schema) => resolved.push((file, schema)),
            None => match detect_instrument(&file) {
                Ok(schema) => resolved.push((file, schema)),
                Err(e) => warn!("Skipping {}: {}", file.display(), e),
            },
        }
    }
    Ok(resolved)
}

pub fn run_decode(args: &DecodeArgs) -> Result<ProcessingStats> {
    setup_logging(&args.log)?;
    let config = args.output.to_config(&args.log).context("invalid configuration")?;
    let files = discover_inputs(&args.inputs)?;
    let inputs = resolve_inputs(files, args.instrument.as_deref())?;
    if inputs.is_empty() {
        bail!("no decodable input files");
    }

    if args.log.show_progress() {
        println!("{}", "Decoding flat files".bright_green().bold());
        println!(
            "  {} {}",
            "Inputs:".bright_cyan(),
            inputs.len().to_string().bright_white()
        );
        println!("  {} {}", "Output:".bright_cyan(), config.output_dir.display());
    }

    let processor = BatchProcessor::new(config, Box::new(MemoryStore::new()));
    let stats = processor.decode_files(&inputs);

    if args.log.show_progress() {
        print_summary("Decode Summary", &stats);
    }
    if stats.files_decoded == 0 {
        bail!("no file could be decoded");
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_file_name() {
        let files = vec![
            PathBuf::from("SURF_MODI_MOBS_SUOB_LSYW_VIS_VAIS_LX_20240101_000000_UFMT_QC.csv"),
            PathBuf::from("notes.csv"),
        ];
        let resolved = resolve_inputs(files, None).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].1.id, "VIS");
    }

    #[test]
    fn test_resolve_with_explicit_instrument() {
        let files = vec![PathBuf::from("notes.csv")];
        let resolved = resolve_inputs(files, Some("AWS")).unwrap();
        assert_eq!(resolved[0].1.id, "AWS");
        assert!(resolve_inputs(vec![], Some("SODAR")).is_err());
    }
}
