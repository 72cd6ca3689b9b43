// src/notify/webhook.rs
// =============================================================================
// The raw webhook POST.
//
// This layer only knows how to send one message and report what came back.
// All retry and rate-limit decisions live in dispatch.rs.
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use url::Url;

use super::alert::WebhookMessage;

/// The request never produced an HTTP response.
#[derive(Debug, Error)]
#[error("webhook request failed: {0}")]
pub struct TransportError(pub String);

/// Status and body of a webhook answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait WebhookTransport {
    async fn post(&self, message: &WebhookMessage) -> Result<WebhookResponse, TransportError>;
}

pub struct HttpWebhook {
    client: Client,
    url: Url,
}

impl HttpWebhook {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl WebhookTransport for HttpWebhook {
    async fn post(&self, message: &WebhookMessage) -> Result<WebhookResponse, TransportError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(message)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        // The body only matters for 429s and error reports; an unreadable
        // body is not a transport failure once we have a status.
        let body = response.text().await.unwrap_or_default();
        Ok(WebhookResponse { status, body })
    }
}
