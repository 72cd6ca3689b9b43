// src/fetch/http.rs
// =============================================================================
// This module downloads target scripts over HTTP.
//
// Key functionality:
// - One reqwest Client reused for every request (connection pooling)
// - A fixed User-Agent and per-request timeout
// - Non-2xx answers are failures: the target is skipped for this cycle
// - Bodies are decoded as UTF-8, falling back to a lossy decode
//
// Rust concepts:
// - Traits: Fetcher lets the poll loop run against a fake in tests
// - async_trait: async methods in traits
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;

use crate::config::FetchConfig;
use crate::error::FetchError;

/// Anything that can turn a target URL into its current content.
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| categorize_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| categorize_error(url, e))?;
        Ok(decode_body(&body))
    }
}

/// UTF-8 if the bytes are valid, otherwise a best-effort decode with
/// replacement characters. Never fails.
pub fn decode_body(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(e) => {
            tracing::debug!(valid_up_to = e.valid_up_to(), "body is not valid UTF-8, decoding lossily");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

fn categorize_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout { url: url.to_string() }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_utf8() {
        assert_eq!(decode_body("const é = '/api';".as_bytes()), "const é = '/api';");
    }

    #[test]
    fn test_decode_falls_back_on_invalid_bytes() {
        let bytes = b"var a = '/api/v1'; \xff\xfe";
        let text = decode_body(bytes);
        assert!(text.starts_with("var a = '/api/v1'; "));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_client_builds_from_config() {
        let config = FetchConfig {
            user_agent: "JSChangeMonitor/1.0 (BugBounty)".into(),
            timeout: std::time::Duration::from_secs(30),
        };
        assert!(HttpFetcher::new(&config).is_ok());
    }
}
