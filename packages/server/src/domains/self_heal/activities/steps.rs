//! Self-heal steps.
//!
//! Each step is safe to run more than once: the workflow journals finished
//! steps, but a step interrupted mid-way is re-run from the top. Steps 2
//! and 3 never fail; they degrade to the extraction HTML and to existing or
//! default selectors.

use anyhow::Result;
use tracing::{info, warn};

use crate::domains::extension::ExtensionCommand;
use crate::domains::selectors::store::SelectorStoreError;
use crate::domains::selectors::SelectorConfig;
use crate::domains::self_heal::types::{
    CaptureSource, HealingHtml, SelectorSource, SelfHealRequest, SelfHealResult,
    SuggestedSelectors,
};
use crate::kernel::ServerDeps;

/// Step 1: ask the capture agent for the page, replacing any stale command.
pub async fn dispatch_capture_command(
    req: &SelfHealRequest,
    deps: &ServerDeps,
) -> Result<ExtensionCommand> {
    let command = ExtensionCommand::capture_html(req.url.as_str());
    deps.extension_channel()
        .push_command(&req.company_id, &command)
        .await?;

    info!(company_id = %req.company_id, url = %req.url, "Capture command dispatched");
    Ok(command)
}

/// Step 2: one read of the capture slot. Falls back to the extraction HTML
/// when the slot is empty, unreadable, or holds a capture of another page.
pub async fn await_capture(req: &SelfHealRequest, deps: &ServerDeps) -> HealingHtml {
    let fallback = || HealingHtml {
        html: req.fallback_html.clone(),
        source: CaptureSource::Extraction,
    };

    match deps.extension_channel().captured_html(&req.company_id).await {
        Ok(Some(capture)) if !capture.is_for(&req.url) => {
            info!(
                company_id = %req.company_id,
                captured_url = ?capture.url,
                url = %req.url,
                "Extension capture is for another page, using extraction HTML"
            );
            fallback()
        }
        Ok(Some(capture)) if !capture.html.trim().is_empty() => {
            info!(
                company_id = %req.company_id,
                captured_at = %capture.captured_at,
                "Using HTML captured by extension"
            );
            HealingHtml {
                html: capture.html,
                source: CaptureSource::Extension,
            }
        }
        Ok(_) => {
            info!(company_id = %req.company_id, "No extension capture, using extraction HTML");
            fallback()
        }
        Err(e) => {
            warn!(company_id = %req.company_id, error = %e, "Capture slot unreadable, using extraction HTML");
            fallback()
        }
    }
}

fn fallback_selectors(req: &SelfHealRequest) -> SuggestedSelectors {
    match &req.existing_selectors {
        Some(existing) if existing.validate().is_ok() => SuggestedSelectors {
            selectors: existing.clone(),
            source: SelectorSource::Existing,
        },
        _ => SuggestedSelectors {
            selectors: SelectorConfig::builtin_default(),
            source: SelectorSource::Default,
        },
    }
}

/// Step 3: model suggestion, else the existing selectors, else the default.
pub async fn suggest_selectors(
    req: &SelfHealRequest,
    html: &str,
    deps: &ServerDeps,
) -> SuggestedSelectors {
    match deps
        .inference()
        .suggest_selectors(&req.url, html, req.existing_selectors.as_ref())
        .await
    {
        Ok(selectors) => {
            info!(company_id = %req.company_id, "Model suggested new selectors");
            SuggestedSelectors {
                selectors,
                source: SelectorSource::Inferred,
            }
        }
        Err(e) => {
            let fallback = fallback_selectors(req);
            warn!(
                company_id = %req.company_id,
                error = %e,
                fallback = ?fallback.source,
                "Selector suggestion unusable, falling back"
            );
            fallback
        }
    }
}

/// Step 4: store the selectors for future dispatches. Inferred selectors go
/// to the cache and `company_configs` (canonical URL untouched); a fallback
/// set only refreshes the cache. Returns whether the relational override
/// changed.
pub async fn persist_selectors(
    req: &SelfHealRequest,
    suggestion: &SuggestedSelectors,
    deps: &ServerDeps,
) -> Result<bool, SelectorStoreError> {
    let store = deps.selector_store();

    match suggestion.source {
        SelectorSource::Inferred => {
            store
                .save_selectors(&req.company_id, &suggestion.selectors)
                .await?;
            Ok(true)
        }
        SelectorSource::Existing | SelectorSource::Default => {
            if suggestion.source == SelectorSource::Default && req.existing_selectors.is_none() {
                info!(company_id = %req.company_id, "Nothing learned; caching default selectors");
            }
            store
                .cache_selectors(&req.company_id, &suggestion.selectors)
                .await?;
            Ok(false)
        }
    }
}

/// All four steps back to back, without journaling.
pub async fn run_self_heal(req: &SelfHealRequest, deps: &ServerDeps) -> Result<SelfHealResult> {
    dispatch_capture_command(req, deps).await?;
    let html = await_capture(req, deps).await;
    let suggestion = suggest_selectors(req, &html.html, deps).await;
    let overrides_updated = persist_selectors(req, &suggestion, deps).await?;

    Ok(SelfHealResult {
        company_id: req.company_id.clone(),
        selectors: suggestion.selectors,
        selector_source: suggestion.source,
        html_source: html.source,
        overrides_updated,
    })
}
