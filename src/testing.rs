// src/testing.rs
// =============================================================================
// Test doubles shared by the unit tests of several modules.
//
// - ScriptedWebhook: answers webhook posts from a fixed script
// - ScriptedFetcher: serves per-URL content from a fixed script
// =============================================================================

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::fetch::Fetcher;
use crate::notify::{
    Embed, EmbedFooter, TransportError, WebhookMessage, WebhookResponse, WebhookTransport,
};

/// One scripted webhook answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, &'static str),
    /// The request fails before any response arrives.
    Down,
}

/// Plays back `Reply`s in order; the last one repeats forever.
pub struct ScriptedWebhook {
    script: Mutex<VecDeque<Reply>>,
    sent: Mutex<Vec<WebhookMessage>>,
}

impl ScriptedWebhook {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().collect()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<WebhookMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookTransport for ScriptedWebhook {
    async fn post(&self, message: &WebhookMessage) -> Result<WebhookResponse, TransportError> {
        self.sent.lock().unwrap().push(message.clone());
        let reply = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            }
        };
        match reply.unwrap_or(Reply::Status(204, "")) {
            Reply::Status(status, body) => Ok(WebhookResponse {
                status,
                body: body.to_string(),
            }),
            Reply::Down => Err(TransportError("connection refused".into())),
        }
    }
}

pub fn sample_message() -> WebhookMessage {
    WebhookMessage {
        embeds: vec![Embed {
            title: "🚨 JS Change Detected!".into(),
            description: "Changes detected in:\n**https://x.test/app.js**".into(),
            color: 0xff0000,
            fields: Vec::new(),
            footer: EmbedFooter {
                text: "JS & Endpoint Monitor".into(),
            },
            timestamp: "2026-01-01T00:00:00+00:00".into(),
        }],
    }
}

/// Serves scripted content per URL. Each fetch pops the next entry; the last
/// entry repeats. `None` entries simulate a failed fetch.
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: Mutex<HashMap<String, VecDeque<Option<String>>>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(self, url: &str, versions: &[Option<&str>]) -> Self {
        self.pages.lock().unwrap().insert(
            url.to_string(),
            versions.iter().map(|v| v.map(str::to_string)).collect(),
        );
        self
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut pages = self.pages.lock().unwrap();
        let versions = pages.get_mut(url).ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })?;
        let next = if versions.len() > 1 {
            versions.pop_front().flatten()
        } else {
            versions.front().cloned().flatten()
        };
        next.ok_or_else(|| FetchError::Transport {
            url: url.to_string(),
            reason: "scripted failure".into(),
        })
    }
}
