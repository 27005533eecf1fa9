//! Generative-model calls with strict response validation.
//!
//! The model answers in free text. The gateway locates the JSON object in
//! it (first `{` to last `}`), decodes it, and validates it before anything
//! downstream sees the value.

use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use super::html::{condense_html, MAX_PROMPT_HTML_CHARS};
use super::prompts::{canonical_url_prompt, selector_prompt};
use crate::common::parse_http_url;
use crate::domains::selectors::SelectorConfig;
use crate::kernel::BaseAI;

#[derive(Debug, Error)]
pub enum InferenceError {
    /// The collaborator could not be reached or returned an error
    #[error("inference call failed: {0}")]
    Gateway(#[from] anyhow::Error),
    /// The collaborator answered, but not with something usable
    #[error("inference response is malformed: {0}")]
    Format(String),
}

// =============================================================================
// LLM Response Types
// =============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CanonicalUrlSuggestion {
    /// Absolute URL of the job listings page, or null when none is evident
    #[serde(default)]
    canonical_url: Option<String>,
}

/// Slice from the first `{` to the last `}`, if any.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn decode_object(response: &str) -> Result<serde_json::Value, InferenceError> {
    let json = extract_json_object(response)
        .ok_or_else(|| InferenceError::Format("no JSON object in response".to_string()))?;
    serde_json::from_str(json).map_err(|e| InferenceError::Format(e.to_string()))
}

#[derive(Clone)]
pub struct InferenceGateway {
    ai: Arc<dyn BaseAI>,
}

impl InferenceGateway {
    pub fn new(ai: Arc<dyn BaseAI>) -> Self {
        Self { ai }
    }

    /// Ask the model for the canonical careers-listing URL behind a page.
    ///
    /// `Ok(None)` means the model found nothing; a URL that is not an
    /// absolute http(s) URL is a `Format` error.
    pub async fn discover_canonical_url(
        &self,
        page_url: &str,
        html: &str,
    ) -> Result<Option<Url>, InferenceError> {
        let prompt = canonical_url_prompt(page_url, &condense_html(html, MAX_PROMPT_HTML_CHARS));
        let response = self.ai.complete_json(&prompt).await?;

        let suggestion: CanonicalUrlSuggestion = serde_json::from_value(decode_object(&response)?)
            .map_err(|e| InferenceError::Format(e.to_string()))?;

        let Some(raw) = suggestion
            .canonical_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
        else {
            debug!(page_url = %page_url, "Model found no canonical URL");
            return Ok(None);
        };

        match parse_http_url(&raw) {
            Some(url) => {
                info!(page_url = %page_url, canonical_url = %url, "Canonical URL discovered");
                Ok(Some(url))
            }
            None => Err(InferenceError::Format(format!(
                "canonical URL is not an absolute http(s) URL: {}",
                raw
            ))),
        }
    }

    /// Ask the model for a selector set that matches the postings in `html`.
    /// The answer is schema-checked and every locator must parse as CSS.
    pub async fn suggest_selectors(
        &self,
        page_url: &str,
        html: &str,
        existing: Option<&SelectorConfig>,
    ) -> Result<SelectorConfig, InferenceError> {
        let prompt = selector_prompt(
            page_url,
            &condense_html(html, MAX_PROMPT_HTML_CHARS),
            existing,
        );
        let response = self.ai.complete_json(&prompt).await?;

        let mut value = decode_object(&response)?;
        // Some models wrap the answer as {"selectors": {...}}
        let wrapped = value
            .get_mut("selectors")
            .filter(|v| v.is_object())
            .map(serde_json::Value::take);
        if let Some(inner) = wrapped {
            value = inner;
        }

        SelectorConfig::from_value(value).map_err(|e| {
            warn!(page_url = %page_url, error = %e, "Rejected selector suggestion");
            InferenceError::Format(e.to_string())
        })
    }
}
