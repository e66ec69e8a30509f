use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "decom", author, version, about = "Unit decommitment with optimal power flow", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// Configuration file (defaults to ~/.decom/config.toml)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the staged decommitment search on a case
    Run {
        /// Case file (JSON or TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
        /// Write the JSON result to this file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
        /// Solve the trials of each stage one at a time
        #[arg(long)]
        serial: bool,
        /// Stop after this many generators have been shut down
        #[arg(long)]
        max_stages: Option<usize>,
        /// Worker threads for parallel trials ("auto" or a count)
        #[arg(long)]
        threads: Option<String>,
    },
    /// Print each generator's cost at Pmin and at its current output
    Cost {
        /// Case file (JSON or TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
    },
    /// Check a case for problems without solving it
    Validate {
        /// Case file (JSON or TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
    },
}
