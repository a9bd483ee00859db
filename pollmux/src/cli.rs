//! CLI argument definitions

use std::path::PathBuf;

use clap::Parser;

/// Pollmux - staggered repeating poll scheduler
#[derive(Debug, Parser)]
#[command(
    name = "pollmux",
    about = "Poll a set of sources on a staggered schedule and print merged results",
    version
)]
pub struct Cli {
    /// Source ids to poll
    #[arg(value_name = "SOURCE", default_values_t = ["a", "b", "c", "d"].map(String::from))]
    pub sources: Vec<String>,

    /// Path to a YAML config file (overrides the timing flags)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Spacing between initial queries in milliseconds
    #[arg(long, default_value_t = 500)]
    pub padding_ms: u64,

    /// Steady-state polling interval in milliseconds (derived when omitted)
    #[arg(long)]
    pub repeat_after_ms: Option<u64>,

    /// Stop after N results instead of polling forever
    #[arg(short = 'n', long)]
    pub take: Option<usize>,

    /// Upper bound on the demo backend's simulated latency in milliseconds
    #[arg(long, default_value_t = 250)]
    pub max_latency_ms: u64,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}
