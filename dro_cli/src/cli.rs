//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "dro", version, about = "Digital readout CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/dro_config.toml")]
    pub config: PathBuf,

    /// Print results and errors as JSON; logs become JSON lines on stderr
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides logging.level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the counter and track position until Ctrl-C or --iterations
    Run {
        /// Stop after this many loop iterations
        #[arg(long, value_name = "N")]
        iterations: Option<u64>,
        /// Replay remote writes from a CSV (tick,attribute,value)
        #[arg(long, value_name = "FILE")]
        script: Option<PathBuf>,
        /// Zero the hardware counter before the first sample
        #[arg(long, action = ArgAction::SetTrue)]
        clear_counter: bool,
        /// Print loop statistics on exit
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Print stored and active calibration
    Show,
    /// Apply one remote attribute write against the stored calibration
    Write {
        /// numerator | denominator | reverse | set_position
        #[arg(long, value_name = "NAME")]
        attribute: String,
        /// Value as the remote peer would send it
        #[arg(long, value_name = "VALUE", allow_hyphen_values = true)]
        value: String,
    },
    /// List the remote attribute table
    Attributes,
    /// Quick health check (counter and store reachable)
    SelfCheck,
}
