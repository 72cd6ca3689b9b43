// src/notify/mod.rs
// =============================================================================
// Alerting: what to say and how to get it through the webhook.
//
// Submodules:
// - alert:    AlertBuilder, the alert payload and its JSON embed form
// - webhook:  the raw HTTP POST (WebhookTransport trait + reqwest impl)
// - dispatch: the rate-limited retry state machine
// =============================================================================

mod alert;
mod dispatch;
mod webhook;

pub use alert::{AlertBuilder, AlertKind};
pub use dispatch::{DeliveryOutcome, NotificationDispatcher};
pub use webhook::{HttpWebhook, WebhookTransport};

// Test doubles build wire messages and transport replies directly
#[cfg(test)]
pub use alert::{Embed, EmbedFooter, WebhookMessage};
#[cfg(test)]
pub use dispatch::DeliveryFailure;
#[cfg(test)]
pub use webhook::{TransportError, WebhookResponse};
