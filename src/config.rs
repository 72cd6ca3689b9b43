// src/config.rs
// =============================================================================
// Typed runtime configuration.
//
// The CLI (cli.rs) deals in raw strings and floats; everything past startup
// works with this validated form: Durations instead of seconds, an Option<Url>
// instead of a possibly-placeholder string.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::cli::MonitorArgs;
use crate::error::{MonitorError, Result};

/// Marker left in sample configs; treated the same as "no webhook".
const WEBHOOK_PLACEHOLDER: &str = "YOUR_DISCORD_WEBHOOK_URL";

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub targets: PathBuf,
    pub endpoint_log: PathBuf,
    pub output_dir: PathBuf,
    pub interval: Duration,
    pub fetch: FetchConfig,
    pub delivery: DeliveryConfig,
    pub alerts: AlertLimits,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

/// Knobs of the webhook delivery state machine.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// `None` means alerts are logged and skipped.
    pub webhook_url: Option<Url>,
    /// Wait before every send attempt, including the first.
    pub proactive_delay: Duration,
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    /// Added to every server-requested wait and to every backoff.
    pub retry_buffer: Duration,
    /// Transport failures wait `backoff_base * 2^retry`.
    pub backoff_base: Duration,
    /// Used when a 429 body parses but has no `retry_after`.
    pub default_retry_after: Duration,
    /// Used when a 429 body cannot be parsed at all.
    pub fallback_retry_after: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            proactive_delay: Duration::from_millis(8500),
            max_retries: 3,
            retry_buffer: Duration::from_millis(500),
            backoff_base: Duration::from_secs(1),
            default_retry_after: Duration::from_secs(1),
            fallback_retry_after: Duration::from_secs(5),
        }
    }
}

/// Size bounds for what goes into a single embed.
#[derive(Debug, Clone, Copy)]
pub struct AlertLimits {
    pub max_diff_lines: usize,
    pub max_field_chars: usize,
    pub max_endpoints_shown: usize,
}

impl Default for AlertLimits {
    fn default() -> Self {
        Self {
            max_diff_lines: 15,
            max_field_chars: 1000,
            max_endpoints_shown: 10,
        }
    }
}

impl TryFrom<MonitorArgs> for MonitorConfig {
    type Error = MonitorError;

    fn try_from(args: MonitorArgs) -> Result<Self> {
        if args.interval == 0 {
            return Err(MonitorError::Config("interval must be at least one second".into()));
        }

        let delivery = DeliveryConfig {
            webhook_url: parse_webhook_url(&args.webhook_url),
            proactive_delay: seconds("proactive-delay", args.proactive_delay)?,
            max_retries: args.max_retries,
            retry_buffer: seconds("retry-buffer", args.retry_buffer)?,
            ..DeliveryConfig::default()
        };

        Ok(Self {
            targets: args.targets,
            endpoint_log: args.endpoint_log,
            output_dir: args.output_dir,
            interval: Duration::from_secs(args.interval),
            fetch: FetchConfig {
                user_agent: args.user_agent,
                timeout: Duration::from_secs(args.fetch_timeout),
            },
            delivery,
            alerts: AlertLimits::default(),
        })
    }
}

fn seconds(name: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| MonitorError::Config(format!("{name} must be a non-negative number of seconds: {e}")))
}

/// Returns the webhook URL if one is really configured.
///
/// Empty values and the sample placeholder mean "not configured"; a value that
/// does not parse as a URL is reported and also treated as not configured.
pub fn parse_webhook_url(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains(WEBHOOK_PLACEHOLDER) {
        return None;
    }
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        Ok(url) => {
            tracing::warn!(scheme = url.scheme(), "webhook URL must be http(s); alerts disabled");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "webhook URL does not parse; alerts disabled");
            None
        }
    }
}
