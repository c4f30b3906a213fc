//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for epiexport using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Exit code: success
pub const EXIT_OK: i32 = 0;
/// Exit code: the export run failed
pub const EXIT_EXPORT_FAILED: i32 = 1;
/// Exit code: configuration or argument error
pub const EXIT_CONFIG: i32 = 2;
/// Exit code: cancelled by a signal
pub const EXIT_CANCELLED: i32 = 3;
/// Exit code: unexpected fatal error
pub const EXIT_FATAL: i32 = 5;

/// epiexport - paginated CSV export from the epidemiological dashboard backend
#[derive(Parser, Debug)]
#[command(name = "epiexport")]
#[command(version, about, long_about = None)]
#[command(author = "epiexport Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "epiexport.toml", env = "EPIEXPORT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "EPIEXPORT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export every page of a dataset into a CSV file
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
