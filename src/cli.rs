// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands share the same options:
// - watch: poll the targets forever on a fixed interval
// - scan:  run a single cycle and exit (handy for cron or CI)
//
// Every option can also come from an environment variable, so the monitor
// can be configured from a .env file (loaded in main.rs with dotenvy).
// =============================================================================

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "asset-sentinel",
    version = "0.1.0",
    about = "Watch remote JavaScript files for changes and newly exposed endpoints",
    long_about = "asset-sentinel re-fetches a list of script URLs on a fixed interval, \
                  records every new path-like string literal it finds, and posts an alert \
                  to a Discord-compatible webhook when a file changes or exposes new endpoints."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll all targets forever, sleeping the configured interval between cycles
    ///
    /// Example: asset-sentinel watch --targets targets.txt --interval 600
    Watch(MonitorArgs),

    /// Run exactly one cycle over all targets and exit
    ///
    /// Example: asset-sentinel scan --webhook-url https://discord.com/api/webhooks/...
    Scan(MonitorArgs),
}

/// Options shared by both subcommands.
#[derive(Args, Debug, Clone)]
pub struct MonitorArgs {
    /// File with one target URL per line (only http:// and https:// lines are used)
    #[arg(long, env = "SENTINEL_TARGETS", default_value = "targets.txt")]
    pub targets: PathBuf,

    /// Append-only log of every endpoint ever discovered
    #[arg(long, env = "SENTINEL_ENDPOINT_LOG", default_value = "discovered_endpoints.txt")]
    pub endpoint_log: PathBuf,

    /// Directory that receives one report file per detected change
    #[arg(long, env = "SENTINEL_OUTPUT_DIR", default_value = "js_changes")]
    pub output_dir: PathBuf,

    /// Discord-compatible webhook URL; alerts are skipped when unset
    #[arg(long, env = "SENTINEL_WEBHOOK_URL", default_value = "")]
    pub webhook_url: String,

    /// Seconds between two polling cycles
    #[arg(long, env = "SENTINEL_INTERVAL", default_value_t = 2600)]
    pub interval: u64,

    /// User-Agent header sent with every asset request
    #[arg(long, env = "SENTINEL_USER_AGENT", default_value = "JSChangeMonitor/1.0 (BugBounty)")]
    pub user_agent: String,

    /// Per-request timeout for asset fetches, in seconds
    #[arg(long, env = "SENTINEL_FETCH_TIMEOUT", default_value_t = 30)]
    pub fetch_timeout: u64,

    /// Seconds to wait before every webhook attempt
    #[arg(long, env = "SENTINEL_PROACTIVE_DELAY", default_value_t = 8.5)]
    pub proactive_delay: f64,

    /// How many times a rate-limited or failed webhook post is retried
    #[arg(long, env = "SENTINEL_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Extra seconds added on top of every server-requested wait
    #[arg(long, env = "SENTINEL_RETRY_BUFFER", default_value_t = 0.5)]
    pub retry_buffer: f64,
}
