//! Work-item dispatch: resolve target and selectors, extract, then either
//! persist the postings or hand the page to the self-heal workflow.

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::common::{parse_http_url, CompanyId};
use crate::domains::extraction::{ExtractedJob, ExtractionEngine, ExtractionResult};
use crate::domains::postings::NewProductionJob;
use crate::domains::scraping::error::ScrapeError;
use crate::domains::scraping::machines::{ScrapeEvent, ScrapeMachine, ScrapeStage};
use crate::domains::scraping::models::{DispatchStatus, ScrapeOutcome, ScrapeWorkItem};
use crate::domains::selectors::{resolve_selectors, CompanyConfig, SelectorTiers};
use crate::domains::self_heal::SelfHealRequest;
use crate::impl_restate_serde;
use crate::kernel::ServerDeps;

/// Outcome plus the self-heal request to emit, if any
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub outcome: ScrapeOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_heal: Option<SelfHealRequest>,
}

impl_restate_serde!(DispatchResult);

fn fail(machine: &mut ScrapeMachine, error: anyhow::Error) -> ScrapeError {
    machine.decide(&ScrapeEvent::TransientFailure);
    ScrapeError::Transient(error)
}

/// A stored canonical URL wins over the work item's fallback URL.
fn resolve_target(company_id: &CompanyId, config: Option<&CompanyConfig>, fallback: &Url) -> Url {
    match config.and_then(CompanyConfig::canonical_url) {
        Some(raw) => parse_http_url(raw).unwrap_or_else(|| {
            warn!(company_id = %company_id, canonical_url = %raw, "Stored canonical URL is invalid, using fallback");
            fallback.clone()
        }),
        None => fallback.clone(),
    }
}

pub(crate) fn self_heal_workflow_id(company_id: &CompanyId) -> String {
    format!("self-heal-{}-{}", company_id, Uuid::now_v7())
}

fn to_ledger_record(
    item: &ScrapeWorkItem,
    target_url: &str,
    job: &ExtractedJob,
    scraped_at: DateTime<Utc>,
) -> NewProductionJob {
    NewProductionJob::builder()
        .company_id(item.company_id.to_string())
        .url(job.url.as_str())
        .title(job.title.as_str())
        .location(job.location.clone())
        .snippet(job.snippet.clone())
        .scraped_at(scraped_at)
        .raw_payload(serde_json::json!({
            "job": job,
            "targetUrl": target_url,
            "metadata": item.metadata,
        }))
        .build()
}

/// Ask the model for a canonical URL and store it if it is usable.
/// Failures are logged and never fail the item.
async fn backfill_canonical(
    item: &ScrapeWorkItem,
    extraction: &ExtractionResult,
    deps: &ServerDeps,
) -> bool {
    if extraction.html.trim().is_empty() {
        return false;
    }

    let url = match deps
        .inference()
        .discover_canonical_url(&extraction.page_url, &extraction.html)
        .await
    {
        Ok(Some(url)) => url,
        Ok(None) => return false,
        Err(e) => {
            warn!(company_id = %item.company_id, error = %e, "Canonical URL discovery failed");
            return false;
        }
    };

    match deps
        .selector_store()
        .backfill_canonical_url(&item.company_id, &url)
        .await
    {
        Ok(_) => true,
        Err(e) => {
            warn!(company_id = %item.company_id, canonical_url = %url, error = %e, "Failed to store canonical URL");
            false
        }
    }
}

/// Run one work item to ACK. Errors are transient and should be retried;
/// validation happens before this point.
pub async fn dispatch_work_item(
    item: &ScrapeWorkItem,
    deps: &ServerDeps,
) -> Result<DispatchResult, ScrapeError> {
    let mut machine = ScrapeMachine::new();
    let store = deps.selector_store();

    // RESOLVE_TARGET
    let config = match store
        .company_config(&item.company_id)
        .await
        .context("Failed to load company config")
    {
        Ok(config) => config,
        Err(e) => return Err(fail(&mut machine, e)),
    };
    let target_url = resolve_target(&item.company_id, config.as_ref(), &item.fallback_url);
    let canonical_known = config
        .as_ref()
        .and_then(CompanyConfig::canonical_url)
        .is_some();

    let persisted = config.as_ref().and_then(CompanyConfig::overrides);
    let cached = store.cached_selectors(&item.company_id).await;
    let tiers = SelectorTiers {
        work_item: item.override_selectors.as_ref(),
        persisted: persisted.as_ref(),
        cached: cached.as_ref(),
    };
    let selectors = resolve_selectors(&tiers);
    let has_overrides =
        tiers.work_item.is_some() || tiers.persisted.is_some() || tiers.cached.is_some();
    let existing_selectors = has_overrides.then(|| selectors.clone());

    machine.decide(&ScrapeEvent::TargetResolved);
    debug!(
        company_id = %item.company_id,
        target_url = %target_url,
        has_overrides,
        "Target resolved"
    );

    // EXTRACT
    let engine = ExtractionEngine::new(deps.renderer.clone(), deps.navigate_options());
    let extraction = match engine.extract(&target_url, &selectors).await {
        Ok(extraction) => extraction,
        Err(e) => return Err(fail(&mut machine, e)),
    };

    let mut outcome = ScrapeOutcome {
        status: DispatchStatus::Completed,
        company_id: Some(item.company_id.to_string()),
        target_url: Some(target_url.to_string()),
        extracted: extraction.jobs.len(),
        persisted: 0,
        failed_writes: 0,
        canonical_backfilled: false,
        self_heal_workflow_id: None,
        reason: None,
    };
    let mut self_heal = None;

    machine.decide(&ScrapeEvent::Extracted {
        records: extraction.jobs.len(),
        canonical_known,
    });

    loop {
        match machine.stage() {
            ScrapeStage::BackfillCanonical => {
                outcome.canonical_backfilled = backfill_canonical(item, &extraction, deps).await;
                machine.decide(&ScrapeEvent::CanonicalBackfillFinished);
            }
            ScrapeStage::SelfHeal => {
                let workflow_id = self_heal_workflow_id(&item.company_id);
                info!(
                    company_id = %item.company_id,
                    url = %extraction.page_url,
                    workflow_id = %workflow_id,
                    "Zero postings extracted, requesting self-heal"
                );
                self_heal = Some(SelfHealRequest {
                    company_id: item.company_id.clone(),
                    url: extraction.page_url.clone(),
                    fallback_html: extraction.html.clone(),
                    existing_selectors: existing_selectors.clone(),
                });
                outcome.status = DispatchStatus::Healing;
                outcome.self_heal_workflow_id = Some(workflow_id);
                machine.decide(&ScrapeEvent::SelfHealEmitted);
            }
            ScrapeStage::Persist => {
                let scraped_at = Utc::now();
                let records: Vec<NewProductionJob> = extraction
                    .jobs
                    .iter()
                    .map(|job| to_ledger_record(item, &extraction.page_url, job, scraped_at))
                    .collect();
                let summary = match deps.production_ledger().persist_all(records).await {
                    Ok(summary) => summary,
                    Err(e) => return Err(fail(&mut machine, anyhow::Error::new(e))),
                };
                outcome.persisted = summary.persisted;
                outcome.failed_writes = summary.failed;
                machine.decide(&ScrapeEvent::Persisted);
            }
            ScrapeStage::Ack => break,
            stage => {
                return Err(ScrapeError::Transient(anyhow!(
                    "dispatch stopped in unexpected stage {:?}",
                    stage
                )))
            }
        }
    }

    info!(
        company_id = %item.company_id,
        status = ?outcome.status,
        extracted = outcome.extracted,
        persisted = outcome.persisted,
        failed_writes = outcome.failed_writes,
        canonical_backfilled = outcome.canonical_backfilled,
        "Work item dispatched"
    );

    Ok(DispatchResult { outcome, self_heal })
}
