//! Self-heal workflow
//!
//! Durable four-step recovery of a company's selector set. Each step is a
//! named `ctx.run` block, so a restarted workflow resumes after the last
//! journaled step instead of starting over. Progress is published as the
//! `status` state value (see `get_status`).

use restate_sdk::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};

use crate::common::EmptyRequest;
use crate::domains::selectors::store::SelectorStoreError;
use crate::domains::self_heal::activities::{
    await_capture, dispatch_capture_command, persist_selectors, suggest_selectors,
};
use crate::domains::self_heal::types::{SelfHealRequest, SelfHealResult};
use crate::kernel::ServerDeps;

// =============================================================================
// Workflow definition
// =============================================================================

#[restate_sdk::workflow]
#[name = "SelfHealWorkflow"]
pub trait SelfHealWorkflow {
    async fn run(req: SelfHealRequest) -> Result<SelfHealResult, HandlerError>;

    #[shared]
    async fn get_status(req: EmptyRequest) -> Result<String, HandlerError>;
}

pub struct SelfHealWorkflowImpl {
    deps: Arc<ServerDeps>,
}

impl SelfHealWorkflowImpl {
    pub fn with_deps(deps: Arc<ServerDeps>) -> Self {
        Self { deps }
    }
}

impl SelfHealWorkflow for SelfHealWorkflowImpl {
    async fn run(
        &self,
        ctx: WorkflowContext<'_>,
        req: SelfHealRequest,
    ) -> Result<SelfHealResult, HandlerError> {
        info!(company_id = %req.company_id, url = %req.url, "Starting self-heal workflow");

        // Step 1: a failed dispatch only means no fresh capture; step 2 falls back
        ctx.set("status", "dispatch-command".to_string());
        let dispatched = ctx
            .run(|| async {
                Ok(match dispatch_capture_command(&req, &self.deps).await {
                    Ok(_) => true,
                    Err(e) => {
                        warn!(company_id = %req.company_id, error = %e, "Capture command not dispatched");
                        false
                    }
                })
            })
            .name("dispatch-command")
            .await?;

        // Step 2
        ctx.set("status", "await-capture".to_string());
        let html = ctx
            .run(|| async { Ok(await_capture(&req, &self.deps).await) })
            .name("await-capture")
            .await?;

        // Step 3
        ctx.set("status", "suggest-selectors".to_string());
        let suggestion = ctx
            .run(|| async { Ok(suggest_selectors(&req, &html.html, &self.deps).await) })
            .name("suggest-selectors")
            .await?;

        // Step 4: store outages are retried by the runtime
        ctx.set("status", "persist-selectors".to_string());
        let overrides_updated = ctx
            .run(|| async {
                match persist_selectors(&req, &suggestion, &self.deps).await {
                    Ok(updated) => Ok(updated),
                    Err(SelectorStoreError::Invalid(e)) => Err(TerminalError::new(format!(
                        "Refusing to store invalid selectors: {}",
                        e
                    ))
                    .into()),
                    Err(e) => Err(e.into()),
                }
            })
            .name("persist-selectors")
            .await?;

        let result = SelfHealResult {
            company_id: req.company_id.clone(),
            selectors: suggestion.selectors,
            selector_source: suggestion.source,
            html_source: html.source,
            overrides_updated,
        };

        ctx.set(
            "status",
            format!("completed ({:?} selectors)", result.selector_source).to_lowercase(),
        );
        info!(
            company_id = %result.company_id,
            selector_source = ?result.selector_source,
            html_source = ?result.html_source,
            overrides_updated = result.overrides_updated,
            capture_requested = dispatched,
            "Self-heal workflow completed"
        );

        Ok(result)
    }

    async fn get_status(
        &self,
        ctx: SharedWorkflowContext<'_>,
        _req: EmptyRequest,
    ) -> Result<String, HandlerError> {
        Ok(ctx
            .get::<String>("status")
            .await?
            .unwrap_or_else(|| "pending".to_string()))
    }
}
