use clap::{Parser, Subcommand, ValueEnum};
use simplelog::LevelFilter;
use std::path::PathBuf;

use crate::geoplot_core::extractor::{DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_PIXELS};

#[derive(Parser, Debug)]
#[command(author, version, about = "Collect geolocation and creation time from photos and camcorder sidecars")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable file logging to geoplot.log
    #[arg(long = "log", global = true)]
    pub log: bool,

    /// Log level for file logging (debug, info, warn, error)
    #[arg(long, default_value_t = LevelFilter::Debug, global = true)]
    pub log_level: LevelFilter,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract geodata from every supported file under one or more directories
    Scan {
        /// Root directories to search, comma-separated
        #[arg(short, long, default_value = ".")]
        media_path: String,

        /// Write the table to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Worker threads (0 = one per CPU)
        #[arg(short, long, default_value_t = 0)]
        jobs: usize,

        /// Reject files larger than this many bytes
        #[arg(long, default_value_t = DEFAULT_MAX_FILE_SIZE)]
        max_file_size: u64,

        /// Reject images declaring more pixels than this
        #[arg(long, default_value_t = DEFAULT_MAX_PIXELS)]
        max_pixels: u64,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show the record extracted from a single file
    Inspect {
        /// File to inspect
        #[arg(required = true)]
        file: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// One file path per line
    Paths,
    /// Aligned text table
    Table,
    /// Pretty-printed JSON array
    Json,
    /// Comma-separated values with a header row
    Csv,
}
