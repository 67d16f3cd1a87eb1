// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "depthtouch")]
#[command(about = "Turns a projected display surface into a touchscreen")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Replay stored depth frames from a directory of .bin dumps instead of
    /// opening a sensor. Useful for testing and offline debugging.
    #[arg(long, global = true, value_name = "DIR")]
    test_inputs: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the touch detection loop
    Detect {
        /// Run one detection cycle, then exit
        #[arg(long)]
        single_snapshot: bool,

        /// Write diagnostic PPM rasters to this directory every frame
        #[arg(long, value_name = "DIR")]
        dump_ppm: Option<PathBuf>,
    },

    /// Collect a calibration grid by touching the prompted dots
    Calibrate {
        /// Where to write the calibration file (default: config directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Capture one depth frame and write it with diagnostic rasters
    Dump {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; RUST_LOG controls the level
    // Examples: RUST_LOG=debug, RUST_LOG=depthtouch=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let args = Cli::parse();

    match args.command {
        Commands::Detect {
            single_snapshot,
            dump_ppm,
        } => cli::run_detect(args.test_inputs, single_snapshot, dump_ppm),
        Commands::Calibrate { output } => cli::run_calibrate(args.test_inputs, output),
        Commands::Dump { output } => cli::run_dump(args.test_inputs, output),
    }
}
