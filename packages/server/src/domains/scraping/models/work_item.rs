//! Inbound work items.
//!
//! The queue delivers untyped JSON. `RawWorkItem` accepts anything so that
//! a malformed item reaches the handler (and is discarded there) instead of
//! failing deserialization in the runtime.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::common::{parse_http_url, CompanyId};
use crate::domains::scraping::error::ScrapeError;
use crate::domains::selectors::PartialSelectors;
use crate::impl_restate_serde;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawWorkItem(pub serde_json::Value);

impl_restate_serde!(RawWorkItem);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkItemPayload {
    company_id: String,
    fallback_url: String,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
    #[serde(default)]
    override_selectors: Option<serde_json::Value>,
}

/// A decoded, validated work item
#[derive(Debug, Clone)]
pub struct ScrapeWorkItem {
    pub company_id: CompanyId,
    pub fallback_url: Url,
    pub metadata: Option<serde_json::Value>,
    pub override_selectors: Option<PartialSelectors>,
}

impl ScrapeWorkItem {
    pub fn parse(raw: RawWorkItem) -> Result<Self, ScrapeError> {
        if !raw.0.is_object() {
            return Err(ScrapeError::validation("work item must be a JSON object"));
        }

        let payload: WorkItemPayload = serde_json::from_value(raw.0)
            .map_err(|e| ScrapeError::validation(e.to_string()))?;

        let company_id = CompanyId::parse(&payload.company_id)
            .map_err(|e| ScrapeError::validation(e.to_string()))?;

        let fallback_url = parse_http_url(&payload.fallback_url).ok_or_else(|| {
            ScrapeError::validation(format!(
                "fallbackUrl must be an absolute http(s) URL: {:?}",
                payload.fallback_url
            ))
        })?;

        let override_selectors = match payload.override_selectors {
            Some(value) => {
                let partial = PartialSelectors::from_value(value)
                    .and_then(|partial| partial.validate().map(|_| partial))
                    .map_err(|e| ScrapeError::validation(format!("overrideSelectors: {}", e)))?;
                Some(partial).filter(|p| !p.is_empty())
            }
            None => None,
        };

        Ok(Self {
            company_id,
            fallback_url,
            metadata: payload.metadata.filter(|m| !m.is_null()),
            override_selectors,
        })
    }
}
