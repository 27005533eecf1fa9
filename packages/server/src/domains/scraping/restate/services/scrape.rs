//! Scrape service (stateless)
//!
//! Queue consumer entry point: one invocation per work item.

use restate_sdk::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domains::scraping::activities::dispatch_work_item;
use crate::domains::scraping::models::{RawWorkItem, ScrapeOutcome, ScrapeWorkItem};
use crate::domains::self_heal::SelfHealWorkflowClient;
use crate::kernel::ServerDeps;

// =============================================================================
// Service definition
// =============================================================================

#[restate_sdk::service]
#[name = "ScrapeService"]
pub trait ScrapeService {
    async fn scrape(req: RawWorkItem) -> Result<ScrapeOutcome, HandlerError>;
}

pub struct ScrapeServiceImpl {
    deps: Arc<ServerDeps>,
}

impl ScrapeServiceImpl {
    pub fn with_deps(deps: Arc<ServerDeps>) -> Self {
        Self { deps }
    }
}

impl ScrapeService for ScrapeServiceImpl {
    async fn scrape(
        &self,
        ctx: Context<'_>,
        req: RawWorkItem,
    ) -> Result<ScrapeOutcome, HandlerError> {
        // Malformed items are acknowledged, never retried
        let item = match ScrapeWorkItem::parse(req) {
            Ok(item) => item,
            Err(e) => {
                warn!(error = %e, "Discarding malformed work item");
                return Ok(ScrapeOutcome::discarded(e.to_string()));
            }
        };

        info!(
            company_id = %item.company_id,
            fallback_url = %item.fallback_url,
            "Scraping work item"
        );

        // Transient failures surface as retryable errors
        let result = ctx
            .run(|| async {
                dispatch_work_item(&item, &self.deps)
                    .await
                    .map_err(HandlerError::from)
            })
            .name("dispatch")
            .await?;

        if let (Some(request), Some(workflow_id)) = (
            result.self_heal,
            result.outcome.self_heal_workflow_id.clone(),
        ) {
            info!(
                company_id = %request.company_id,
                workflow_id = %workflow_id,
                "Starting self-heal workflow"
            );
            ctx.workflow_client::<SelfHealWorkflowClient>(workflow_id)
                .run(request)
                .send();
        }

        Ok(result.outcome)
    }
}
