use serde::{Deserialize, Serialize};

use crate::common::CompanyId;
use crate::domains::selectors::SelectorConfig;
use crate::impl_restate_serde;

/// Workflow input, built by the scrape dispatcher on a zero-result run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfHealRequest {
    pub company_id: CompanyId,
    /// Page the extraction ran against
    pub url: String,
    /// HTML captured by the extraction engine
    pub fallback_html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_selectors: Option<SelectorConfig>,
}

impl_restate_serde!(SelfHealRequest);

/// Where the HTML used for inference came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSource {
    Extension,
    Extraction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealingHtml {
    pub html: String,
    pub source: CaptureSource,
}

impl_restate_serde!(HealingHtml);

/// Where the persisted selector set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorSource {
    Inferred,
    Existing,
    Default,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedSelectors {
    pub selectors: SelectorConfig,
    pub source: SelectorSource,
}

impl_restate_serde!(SuggestedSelectors);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfHealResult {
    pub company_id: CompanyId,
    pub selectors: SelectorConfig,
    pub selector_source: SelectorSource,
    pub html_source: CaptureSource,
    /// `company_configs.override_selectors` was rewritten
    pub overrides_updated: bool,
}

impl_restate_serde!(SelfHealResult);
