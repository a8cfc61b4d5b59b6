//! Shared components for CLI commands
//!
//! Logging setup, input discovery and the coloured run summary used by
//! several commands.

use crate::cli::args::LogArgs;
use crate::error::{CodecError, Result};
use crate::models::ProcessingStats;
use colored::*;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Set up structured logging
pub fn setup_logging(log: &LogArgs) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = log.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sensor_codec={}", log_level)));

    if log.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .map_err(|e| CodecError::Configuration {
                message: format!("logging already initialised: {}", e),
            })?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| CodecError::Configuration {
                message: format!("logging already initialised: {}", e),
            })?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

fn is_csv(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("csv")
}

/// Expand files, directories (walked recursively) and glob patterns into CSV paths
pub fn discover_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        let path = Path::new(input);
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if is_csv(entry.path()) {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else if path.is_file() {
            files.push(path.to_path_buf());
        } else {
            let matches = glob::glob(input).map_err(|e| CodecError::Configuration {
                message: format!("invalid input pattern {}: {}", input, e),
            })?;
            let before = files.len();
            files.extend(matches.filter_map(|m| m.ok()).filter(|p| p.is_file()));
            if files.len() == before {
                return Err(CodecError::Configuration {
                    message: format!("no input matches {}", input),
                });
            }
        }
    }

    files.sort();
    files.dedup();
    debug!("Discovered {} input files", files.len());
    Ok(files)
}

/// Print the coloured end-of-run summary
pub fn print_summary(title: &str, stats: &ProcessingStats) {
    println!("\n{}", title.bright_green().bold());
    println!(
        "  {} {:.2}s",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms as f64 / 1000.0
    );
    if stats.instruments_processed > 0 || stats.instruments_failed > 0 {
        println!(
            "  {} {}",
            "Instruments processed:".bright_cyan(),
            stats.instruments_processed.to_string().bright_white()
        );
    }
    if stats.instruments_failed > 0 {
        println!(
            "  {} {}",
            "Instruments failed:".bright_red(),
            stats.instruments_failed.to_string().bright_red().bold()
        );
    }
    if stats.files_decoded > 0 || stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files decoded:".bright_cyan(),
            stats.files_decoded.to_string().bright_white()
        );
    }
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
    }
    println!(
        "  {} {}",
        "Records read:".bright_cyan(),
        stats.records_read.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Daily batches:".bright_cyan(),
        stats.batches_written.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files written:".bright_cyan(),
        stats.outputs.len().to_string().bright_white()
    );
    if stats.files_overwritten > 0 {
        println!(
            "  {} {}",
            "Files overwritten:".bright_yellow(),
            stats.files_overwritten.to_string().bright_yellow().bold()
        );
    }
}
