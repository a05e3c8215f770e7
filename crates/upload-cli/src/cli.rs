//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "upload-cli", version, about = "Upload files and follow their progress")]
pub(crate) struct Cli {
    /// Tracker configuration file (JSON).
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Probability in [0, 1] that a simulated upload fails.
    #[arg(long, value_name = "RATE", value_parser = parse_rate)]
    pub fail_rate: Option<f64>,

    /// Retry rounds for failed uploads once the batch settles.
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub retries: u32,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Emit logs as JSON.
    #[arg(long)]
    pub json_logs: bool,

    /// Files to upload.
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

fn parse_rate(value: &str) -> Result<f64, String> {
    let rate: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(format!("rate must be within [0, 1], got {rate}"));
    }
    Ok(rate)
}
