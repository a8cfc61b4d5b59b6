//! Command implementations for the sensor codec CLI
//!
//! Each subcommand lives in its own module:
//! - `generate`: datastore collections to daily files
//! - `decode`: flat files back through the batcher and encoders
//! - `instruments`: registry listing

pub mod decode;
pub mod generate;
pub mod instruments;
pub mod shared;

use crate::cli::args::{Args, Commands};
use crate::models::ProcessingStats;
use anyhow::{Result, anyhow};

/// Dispatch to the selected subcommand
pub fn run(args: Args) -> Result<ProcessingStats> {
    match args.get_command() {
        Some(Commands::Generate(generate_args)) => generate::run_generate(generate_args),
        Some(Commands::Decode(decode_args)) => decode::run_decode(decode_args),
        Some(Commands::Instruments(instruments_args)) => {
            instruments::run_instruments(instruments_args)
        }
        None => Err(anyhow!("no command given")),
    }
}
