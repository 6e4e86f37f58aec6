use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LoggingMode;
use crate::tree::DEFAULT_TOLERANCE;

#[derive(Parser)]
#[command(name = "rollup")]
#[command(about = "Progress rollup over a work-breakdown tree", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        long,
        value_enum,
        default_value_t = LoggingMode::Stderr,
        hide = true
    )]
    pub logging_mode: LoggingMode,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply an operation script (JSON Lines) to an empty tree
    Run {
        /// Script file; reads stdin when omitted
        script: Option<PathBuf>,

        /// Print the final tree as JSON
        #[arg(long)]
        json: bool,

        /// Fail if any operation was ignored or rejected
        #[arg(long)]
        strict: bool,
    },
    /// Load a tree file, recompute every rollup, and print it
    Dump {
        /// Tree JSON file
        file: PathBuf,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Verify that every branch in a tree file carries the mean of its children
    Check {
        /// Tree JSON file
        file: PathBuf,

        /// Allowed absolute difference between stored and expected progress
        #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f64,
    },
    /// Print the JSON Schema of the script format
    Schema,
}
