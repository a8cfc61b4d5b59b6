use clap::Parser;
use sensor_codec::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    match commands::run(args) {
        Ok(_stats) => {
            // Success - stats have already been reported by the command
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Sensor Codec - Environmental Sensor Data Encoder");
    println!("================================================");
    println!();
    println!("Split per-instrument sensor observations into calendar days and write each");
    println!("day as a hierarchical container and/or a flat tagged CSV file.");
    println!();
    println!("USAGE:");
    println!("    sensor-codec <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    generate      Generate daily files from datastore collections");
    println!("    decode        Decode flat files and re-emit them as daily outputs");
    println!("    instruments   List the supported instruments");
    println!("    help          Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Generate every instrument from a JSON-lines datastore:");
    println!("    sensor-codec generate --store /data/store --output /data/out");
    println!();
    println!("    # Write three sample days of two instruments as flat files only:");
    println!("    sensor-codec generate -i VIS,RSD --sample --format flat");
    println!();
    println!("    # Re-encode a directory of flat files:");
    println!("    sensor-codec decode /data/incoming --output /data/out");
    println!();
    println!("For detailed help on any command, use:");
    println!("    sensor-codec <COMMAND> --help");
}
