// src/error.rs
// =============================================================================
// Typed errors for the monitor.
//
// Each failure the poll loop has to react to differently gets its own variant,
// so the loop can `match` on it instead of inspecting error strings.
// The binary entry point (main.rs) still uses anyhow for startup glue.
// =============================================================================

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures while fetching a target asset.
///
/// All of them are recovered by skipping the target for this cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
}

/// Errors that halt a cycle early or stop startup.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("target file '{}' not found", .0.display())]
    TargetListMissing(PathBuf),
    #[error("could not read {what} '{}': {source}", path.display())]
    Read {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not write {what} '{}': {source}", path.display())]
    Write {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
