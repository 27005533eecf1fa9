//! Per-company mailbox with two independent slots, `command` and `html`.
//!
//! Writes replace whatever is in the slot. There is no queue, no
//! acknowledgement, and reads never wait: an empty slot is simply "not
//! found".

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::common::{parse_http_url, CompanyId};
use crate::kernel::BaseKeyValueCache;

pub fn command_key(company_id: &CompanyId) -> String {
    format!("extension:{}:command", company_id)
}

pub fn html_key(company_id: &CompanyId) -> String {
    format!("extension:{}:html", company_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionAction {
    CaptureHtml,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionCommand {
    pub action: ExtensionAction,
    pub url: String,
    pub issued_at: DateTime<Utc>,
}

impl ExtensionCommand {
    pub fn capture_html(url: impl Into<String>) -> Self {
        Self {
            action: ExtensionAction::CaptureHtml,
            url: url.into(),
            issued_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedHtml {
    pub html: String,
    /// Page the capture was taken from; None when no command was pending
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl CapturedHtml {
    /// Whether this capture was taken from `url`. Captures of unknown origin
    /// never match.
    pub fn is_for(&self, url: &str) -> bool {
        let Some(captured) = self.url.as_deref() else {
            return false;
        };
        match (parse_http_url(captured), parse_http_url(url)) {
            (Some(a), Some(b)) => a == b,
            _ => captured == url,
        }
    }
}

#[derive(Clone)]
pub struct ExtensionChannel {
    cache: Arc<dyn BaseKeyValueCache>,
}

impl ExtensionChannel {
    pub fn new(cache: Arc<dyn BaseKeyValueCache>) -> Self {
        Self { cache }
    }

    /// Replace the pending command for a company
    pub async fn push_command(
        &self,
        company_id: &CompanyId,
        command: &ExtensionCommand,
    ) -> Result<()> {
        let payload = serde_json::to_string(command)?;
        self.cache.set(&command_key(company_id), &payload).await?;
        debug!(company_id = %company_id, url = %command.url, "Extension command written");
        Ok(())
    }

    pub async fn pending_command(&self, company_id: &CompanyId) -> Result<Option<ExtensionCommand>> {
        self.read_slot(company_id, &command_key(company_id)).await
    }

    /// Replace the captured HTML for a company. Without an explicit `url`
    /// the capture is attributed to the pending command's URL.
    pub async fn store_capture(
        &self,
        company_id: &CompanyId,
        html: &str,
        url: Option<&str>,
    ) -> Result<CapturedHtml> {
        let url = match url {
            Some(url) => Some(url.to_string()),
            None => self.pending_command(company_id).await?.map(|c| c.url),
        };
        let capture = CapturedHtml {
            html: html.to_string(),
            url,
            captured_at: Utc::now(),
        };
        let payload = serde_json::to_string(&capture)?;
        self.cache.set(&html_key(company_id), &payload).await?;
        debug!(
            company_id = %company_id,
            url = ?capture.url,
            bytes = html.len(),
            "Extension capture stored"
        );
        Ok(capture)
    }

    pub async fn captured_html(&self, company_id: &CompanyId) -> Result<Option<CapturedHtml>> {
        self.read_slot(company_id, &html_key(company_id)).await
    }

    async fn read_slot<T: serde::de::DeserializeOwned>(
        &self,
        company_id: &CompanyId,
        key: &str,
    ) -> Result<Option<T>> {
        let Some(raw) = self.cache.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(company_id = %company_id, key = %key, error = %e, "Ignoring malformed extension slot");
                Ok(None)
            }
        }
    }
}
