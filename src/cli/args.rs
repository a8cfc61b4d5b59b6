//! Command-line argument definitions for the sensor codec
//!
//! Defines the CLI interface using the clap derive API.

use crate::config::{CodecConfig, OutputFormat};
use crate::error::{CodecError, Result};
use crate::schema;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// CLI arguments for the sensor codec
///
/// Turns per-instrument sensor readings into daily hierarchical containers
/// and flat tagged CSV files.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sensor-codec",
    version,
    about = "Encode environmental sensor readings into daily container and flat files",
    long_about = "Reads per-instrument sensor observations from a document datastore or from flat \
                  tagged CSV files, splits them into calendar days and writes each day as a \
                  self-describing hierarchical container and/or a flat tagged CSV file."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Generate daily files from datastore collections
    Generate(GenerateArgs),
    /// Decode flat files and re-emit them as daily outputs
    Decode(DecodeArgs),
    /// List the supported instruments
    Instruments(InstrumentsArgs),
}

/// Comma-separated instrument ids, or `all`
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentList {
    pub ids: Vec<String>,
}

impl FromStr for InstrumentList {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self {
                ids: schema::instrument_ids().iter().map(|id| id.to_string()).collect(),
            });
        }
        let ids: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        if ids.is_empty() {
            return Err(CodecError::Configuration {
                message: "at least one instrument id is required".to_string(),
            });
        }
        for id in &ids {
            schema::lookup(id)?;
        }
        Ok(Self { ids })
    }
}

/// Logging flags shared by every command
#[derive(Debug, Clone, Default, clap::Args)]
pub struct LogArgs {
    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors. Overrides verbose settings.
    #[arg(short = 'q', long = "quiet", help = "Suppress all output except errors")]
    pub quiet: bool,
}

impl LogArgs {
    /// Get the logging level based on verbosity settings
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Options shared by commands that write outputs
#[derive(Debug, Clone, clap::Args)]
pub struct OutputArgs {
    /// Base directory for `<instrument>/<year>/<month>/` trees
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        help = "Base directory for generated files"
    )]
    pub output_dir: Option<PathBuf>,

    /// Output forms to write
    #[arg(
        short = 'f',
        long = "format",
        value_enum,
        value_name = "FORMAT",
        help = "Output forms to write (container, flat, both)"
    )]
    pub format: Option<OutputFormat>,

    /// Path to a JSON configuration file
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (JSON format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Stop after N day batches per instrument
    #[arg(
        long = "sample",
        value_name = "N",
        num_args = 0..=1,
        default_missing_value = "3",
        help = "Sample mode: write at most N daily batches per instrument (default 3)"
    )]
    pub sample: Option<usize>,
}

/// Arguments for the generate command
#[derive(Debug, Clone, Parser)]
pub struct GenerateArgs {
    /// Instruments to generate
    #[arg(
        short = 'i',
        long = "instruments",
        value_name = "LIST",
        default_value = "all",
        help = "Comma-separated instrument ids, or 'all'"
    )]
    pub instruments: InstrumentList,

    /// Directory of the JSON-lines collections
    #[arg(
        short = 's',
        long = "store",
        value_name = "PATH",
        help = "Datastore directory holding <collection>.jsonl files"
    )]
    pub store: Option<PathBuf>,

    /// Database name inside the datastore directory
    #[arg(long = "database", value_name = "NAME", help = "Database name")]
    pub database: Option<String>,

    /// Directory of header templates
    #[arg(
        long = "headers",
        value_name = "PATH",
        help = "Directory of <instrument>.csv header templates"
    )]
    pub header_dir: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

/// Arguments for the decode command
#[derive(Debug, Clone, Parser)]
pub struct DecodeArgs {
    /// Files, directories or glob patterns to decode
    #[arg(value_name = "INPUT", required = true, help = "Flat files, directories or glob patterns")]
    pub inputs: Vec<String>,

    /// Instrument id; detected from each file name when omitted
    #[arg(
        long = "instrument",
        value_name = "ID",
        help = "Instrument id (detected from file names when omitted)"
    )]
    pub instrument: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

/// Arguments for the instruments command
#[derive(Debug, Clone, Parser)]
pub struct InstrumentsArgs {
    /// Print the full schema of each instrument as JSON
    #[arg(long = "json", help = "Print schemas as JSON")]
    pub json: bool,

    #[command(flatten)]
    pub log: LogArgs,
}

impl Args {
    /// Selected subcommand, `None` when invoked bare
    pub fn get_command(&self) -> Option<&Commands> {
        self.command.as_ref()
    }
}

impl OutputArgs {
    /// Base configuration from the config file, with command-line overrides applied
    pub fn to_config(&self, log: &LogArgs) -> Result<CodecConfig> {
        let mut config = match &self.config_file {
            Some(path) => CodecConfig::load(path)?,
            None => CodecConfig::default(),
        };
        if let Some(dir) = &self.output_dir {
            config = config.with_output_dir(dir);
        }
        if let Some(format) = self.format {
            config = config.with_format(format);
        }
        if let Some(n) = self.sample {
            config = config.with_sample(n);
        }
        if !log.show_progress() {
            config = config.without_progress();
        }
        config.validate()?;
        Ok(config)
    }
}

impl GenerateArgs {
    pub fn to_config(&self) -> Result<CodecConfig> {
        let mut config = self.output.to_config(&self.log)?;
        if let Some(store) = &self.store {
            config = config.with_datastore_root(store);
        }
        if let Some(db) = &self.database {
            config = config.with_database(db);
        }
        if let Some(dir) = &self.header_dir {
            config = config.with_header_dir(dir);
        }
        Ok(config)
    }
}
