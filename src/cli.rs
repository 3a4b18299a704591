//! CLI argument parsing for schedprobe

use clap::{Parser, ValueEnum};

/// Output format for the run report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Progress lines on stdout, summary table on stderr (default)
    Text,
    /// JSON report on stdout, progress lines on stderr
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "schedprobe")]
#[command(version)]
#[command(about = "Spawn pinned FIFO/OTHER busy-wait threads and watch the scheduler pick", long_about = None)]
pub struct Cli {
    /// Number of worker threads
    #[arg(short = 'n', long = "num-threads", value_name = "N", allow_negative_numbers = true)]
    pub threads: i64,

    /// Busy-wait time per iteration, in seconds
    #[arg(short = 't', long = "time-wait", value_name = "SECONDS", allow_negative_numbers = true)]
    pub wait: f64,

    /// Comma-separated policies, one per thread (FIFO or NORMAL/OTHER)
    #[arg(short = 's', long = "policies", value_name = "POLICIES")]
    pub policies: String,

    /// Comma-separated priorities, one per thread (ignored for non-FIFO)
    #[arg(short = 'p', long = "priorities", value_name = "PRIORITIES", allow_hyphen_values = true)]
    pub priorities: String,

    /// CPU every worker is pinned to
    #[arg(long = "cpu", value_name = "CPU", default_value = "0")]
    pub cpu: usize,

    /// Stop creating threads after the first creation failure and exit non-zero
    #[arg(long = "strict")]
    pub strict: bool,

    /// Report format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
