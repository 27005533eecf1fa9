use serde::{Deserialize, Serialize};

use crate::impl_restate_serde;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    /// At least one posting extracted and persisted (or attempted)
    Completed,
    /// Zero postings; a self-heal workflow was started
    Healing,
    /// Malformed work item, acknowledged without processing
    Discarded,
}

/// Per-item report returned by `ScrapeService/scrape`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOutcome {
    pub status: DispatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    pub extracted: usize,
    pub persisted: usize,
    pub failed_writes: usize,
    pub canonical_backfilled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_heal_workflow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl_restate_serde!(ScrapeOutcome);

impl ScrapeOutcome {
    pub fn discarded(reason: impl Into<String>) -> Self {
        Self {
            status: DispatchStatus::Discarded,
            company_id: None,
            target_url: None,
            extracted: 0,
            persisted: 0,
            failed_writes: 0,
            canonical_backfilled: false,
            self_heal_workflow_id: None,
            reason: Some(reason.into()),
        }
    }
}
