//! Instruments command: registry listing

use super::shared::setup_logging;
use crate::cli::args::InstrumentsArgs;
use crate::models::ProcessingStats;
use crate::schema::{self, FieldShape, InstrumentSchema};
use anyhow::Result;
use colored::*;

/// Non-time dimensions of an instrument as `name=len` pairs
fn dimension_summary(schema: &InstrumentSchema) -> String {
    let mut dims: Vec<String> = Vec::new();
    for field in schema.obs_fields.iter().filter(|f| f.shape != FieldShape::Scalar) {
        for (axis, len) in field.axes.iter().zip(field.container_dims()) {
            let entry = format!("{}={}", axis, len);
            if !dims.contains(&entry) {
                dims.push(entry);
            }
        }
    }
    for series in schema.sub_series() {
        dims.push(format!("{}=*", series.dimension));
    }
    if dims.is_empty() {
        "-".to_string()
    } else {
        dims.join(" ")
    }
}

pub fn run_instruments(args: &InstrumentsArgs) -> Result<ProcessingStats> {
    setup_logging(&args.log)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(schema::all())?);
        return Ok(ProcessingStats::default());
    }

    println!("{}", "Supported instruments".bright_green().bold());
    for schema in schema::all() {
        println!(
            "  {:<9} {:<11} {:<13} {}",
            schema.id.bright_white().bold(),
            schema.grouping.label().bright_cyan(),
            schema.primary_timestamp,
            dimension_summary(schema)
        );
        println!("            {}", schema.description.dimmed());
    }
    Ok(ProcessingStats::default())
}
