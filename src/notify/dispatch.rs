// src/notify/dispatch.rs
// =============================================================================
// This module delivers one webhook message under the channel's rate limit.
//
// Delivery is an explicit state machine:
//
//   Idle -> Sending -> Delivered                      (200 / 204)
//                   -> RateLimited  -> Sending ...    (429, wait retry_after)
//                   -> NetworkError -> Sending ...    (no response, backoff)
//                   -> RejectedFinal                  (any other status)
//
// Rules:
// - every attempt, the first one included, waits `proactive_delay` first
// - RateLimited / NetworkError go back to Sending at most `max_retries`
//   times; after that the delivery has Failed
// - the same message is re-sent on every attempt, untouched
//
// Rust concepts:
// - Enums with data: each state carries exactly what the next step needs
// - Generics: the dispatcher works with any WebhookTransport
// =============================================================================

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::time::sleep;

use super::alert::WebhookMessage;
use super::webhook::{WebhookResponse, WebhookTransport};
use crate::config::DeliveryConfig;

/// Final result of delivering one alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    /// No webhook configured; nothing was sent.
    Skipped,
    Failed(DeliveryFailure),
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryOutcome::Delivered { attempts } => write!(f, "delivered after {attempts} attempt(s)"),
            DeliveryOutcome::Skipped => f.write_str("skipped (no webhook configured)"),
            DeliveryOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryFailure {
    #[error("webhook rejected the message with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("still rate limited after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },
    #[error("network errors on all {attempts} attempts, last: {last_error}")]
    TransportExhausted { attempts: u32, last_error: String },
}

#[derive(Debug)]
enum DeliveryState {
    Idle,
    Sending,
    Delivered,
    RateLimited { wait: Duration },
    NetworkError { reason: String },
    RejectedFinal { status: u16, body: String },
}

/// Body Discord sends with a 429.
#[derive(Debug, Deserialize)]
struct RateLimitBody {
    retry_after: Option<RetryAfter>,
    #[serde(default)]
    global: bool,
    message: Option<String>,
}

/// Some proxies send `retry_after` as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RetryAfter {
    Seconds(f64),
    Text(String),
}

impl RetryAfter {
    fn seconds(&self) -> Option<f64> {
        match self {
            RetryAfter::Seconds(secs) => Some(*secs),
            RetryAfter::Text(text) => text.trim().parse().ok(),
        }
    }
}

pub struct NotificationDispatcher<T> {
    transport: Option<T>,
    config: DeliveryConfig,
}

impl<T: WebhookTransport> NotificationDispatcher<T> {
    pub fn new(transport: T, config: DeliveryConfig) -> Self {
        Self {
            transport: Some(transport),
            config,
        }
    }

    /// A dispatcher that skips every alert.
    pub fn disabled(config: DeliveryConfig) -> Self {
        Self {
            transport: None,
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Runs the delivery state machine for one message until it reaches a
    /// terminal state. `target_url` is only used for logging.
    pub async fn deliver(&self, message: &WebhookMessage, target_url: &str) -> DeliveryOutcome {
        let Some(transport) = &self.transport else {
            tracing::info!(url = %target_url, "webhook not configured, skipping notification");
            return DeliveryOutcome::Skipped;
        };

        let max_retries = self.config.max_retries;
        let mut retries = 0u32;
        let mut attempts = 0u32;
        let mut state = DeliveryState::Idle;

        loop {
            tracing::trace!(url = %target_url, ?state, attempts, retries, "delivery step");
            state = match state {
                DeliveryState::Idle => DeliveryState::Sending,

                DeliveryState::Sending => {
                    sleep(self.config.proactive_delay).await;
                    attempts += 1;
                    match transport.post(message).await {
                        Ok(response) => self.interpret(response, target_url),
                        Err(e) => DeliveryState::NetworkError { reason: e.to_string() },
                    }
                }

                DeliveryState::Delivered => {
                    tracing::info!(url = %target_url, attempts, "notification sent");
                    return DeliveryOutcome::Delivered { attempts };
                }

                DeliveryState::RejectedFinal { status, body } => {
                    tracing::error!(url = %target_url, status, body = %body, "webhook rejected notification, not retrying");
                    return DeliveryOutcome::Failed(DeliveryFailure::Rejected { status, body });
                }

                DeliveryState::RateLimited { wait } => {
                    if retries >= max_retries {
                        tracing::error!(url = %target_url, attempts, "giving up: still rate limited");
                        return DeliveryOutcome::Failed(DeliveryFailure::RateLimitExhausted { attempts });
                    }
                    let wait = wait + self.config.retry_buffer;
                    retries += 1;
                    tracing::warn!(
                        url = %target_url,
                        wait_ms = wait.as_millis() as u64,
                        retry = retries,
                        max_retries,
                        "rate limited by webhook, waiting before retry"
                    );
                    sleep(wait).await;
                    DeliveryState::Sending
                }

                DeliveryState::NetworkError { reason } => {
                    if retries >= max_retries {
                        tracing::error!(url = %target_url, attempts, error = %reason, "giving up after network errors");
                        return DeliveryOutcome::Failed(DeliveryFailure::TransportExhausted {
                            attempts,
                            last_error: reason,
                        });
                    }
                    retries += 1;
                    let wait = self.backoff(retries);
                    tracing::warn!(
                        url = %target_url,
                        error = %reason,
                        wait_ms = wait.as_millis() as u64,
                        retry = retries,
                        max_retries,
                        "network error sending notification, backing off"
                    );
                    sleep(wait).await;
                    DeliveryState::Sending
                }
            };
        }
    }

    #[cfg(test)]
    pub(crate) fn transport_for_tests(&self) -> &T {
        self.transport.as_ref().expect("dispatcher has a transport")
    }

    fn interpret(&self, response: WebhookResponse, target_url: &str) -> DeliveryState {
        match response.status {
            200 | 204 => DeliveryState::Delivered,
            429 => DeliveryState::RateLimited {
                wait: self.retry_after(&response.body, target_url),
            },
            status => DeliveryState::RejectedFinal {
                status,
                body: response.body,
            },
        }
    }

    /// Server-requested wait from a 429 body. A body without `retry_after`
    /// gets the default wait; a body that is not valid JSON gets the
    /// fallback wait.
    fn retry_after(&self, body: &str, target_url: &str) -> Duration {
        match serde_json::from_str::<RateLimitBody>(body) {
            Ok(parsed) => {
                tracing::debug!(
                    url = %target_url,
                    global = parsed.global,
                    message = parsed.message.as_deref().unwrap_or("N/A"),
                    "rate limit details"
                );
                match parsed.retry_after {
                    Some(value) => value
                        .seconds()
                        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                        .unwrap_or(self.config.fallback_retry_after),
                    None => self.config.default_retry_after,
                }
            }
            Err(e) => {
                tracing::warn!(url = %target_url, error = %e, "could not parse rate limit response, using fallback wait");
                self.config.fallback_retry_after
            }
        }
    }

    /// `backoff_base * 2^retry + retry_buffer`.
    fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.min(16);
        self.config.backoff_base.saturating_mul(factor) + self.config.retry_buffer
    }
}
