//! Browserless-backed rendering sessions.
//!
//! Browserless renders pages over plain HTTP (`POST /content`), so a
//! "session" here is a leased slot on a semaphore plus a client handle.
//! Closing the session (or dropping it) returns the slot.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use super::{BaseRenderer, NavigateOptions, RenderSession, RenderedPage};

/// Headroom on top of the navigation timeout for Browserless to respond
const RESPONSE_SLACK: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum BrowserlessError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Render of {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for BrowserlessError {
    fn from(err: reqwest::Error) -> Self {
        BrowserlessError::Network(err.to_string())
    }
}

pub struct BrowserlessRenderer {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    sessions: Arc<Semaphore>,
}

impl BrowserlessRenderer {
    pub fn new(base_url: &str, token: Option<&str>, max_sessions: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            sessions: Arc::new(Semaphore::new(max_sessions.max(1))),
        })
    }

    /// Sessions that can be leased without waiting
    pub fn available_sessions(&self) -> usize {
        self.sessions.available_permits()
    }
}

#[async_trait]
impl BaseRenderer for BrowserlessRenderer {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>> {
        let permit = self
            .sessions
            .clone()
            .acquire_owned()
            .await
            .context("Rendering session pool closed")?;

        Ok(Box::new(BrowserlessSession {
            client: self.client.clone(),
            endpoint: format!("{}/content", self.base_url),
            token: self.token.clone(),
            _permit: permit,
        }))
    }
}

struct BrowserlessSession {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    _permit: OwnedSemaphorePermit,
}

impl BrowserlessSession {
    async fn content(
        &self,
        url: &str,
        options: &NavigateOptions,
    ) -> std::result::Result<String, BrowserlessError> {
        let timeout_ms = options.timeout.as_millis() as u64;
        let body = serde_json::json!({
            "url": url,
            "gotoOptions": {
                "waitUntil": options.wait_until.as_str(),
                "timeout": timeout_ms,
            },
        });

        let mut request = self
            .client
            .post(&self.endpoint)
            .timeout(options.timeout + RESPONSE_SLACK)
            .json(&body);
        if let Some(ref token) = self.token {
            request = request.query(&[("token", token)]);
        }

        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BrowserlessError::Timeout {
                    url: url.to_string(),
                    timeout_ms,
                }
            } else {
                e.into()
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}

#[async_trait]
impl RenderSession for BrowserlessSession {
    async fn navigate(&mut self, url: &str, options: &NavigateOptions) -> Result<RenderedPage> {
        debug!(url = %url, wait_until = options.wait_until.as_str(), "Rendering page");
        let html = self.content(url, options).await?;
        Ok(RenderedPage {
            url: url.to_string(),
            html,
        })
    }

    async fn close(self: Box<Self>) {
        debug!("Rendering session released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_are_bounded_and_released_on_close() {
        let renderer = BrowserlessRenderer::new("http://localhost:3000/", None, 1).unwrap();

        let first = renderer.open_session().await.unwrap();
        assert_eq!(renderer.available_sessions(), 0);

        let blocked =
            tokio::time::timeout(Duration::from_millis(50), renderer.open_session()).await;
        assert!(blocked.is_err());

        first.close().await;
        assert_eq!(renderer.available_sessions(), 1);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let renderer = BrowserlessRenderer::new("http://localhost:3000", None, 0).unwrap();
        assert_eq!(renderer.available_sessions(), 1);
    }
}
