// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (what to prompt for, which selectors win) lives in domains.
//
// Naming convention: Base* for trait names (e.g., BaseAI, BaseRenderer)

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use crate::common::CompanyId;
use crate::domains::postings::models::{NewProductionJob, ProductionJob};
use crate::domains::selectors::models::{CompanyConfig, SelectorConfig};

// =============================================================================
// AI Trait (Infrastructure - Generic LLM capabilities)
// =============================================================================

#[async_trait]
pub trait BaseAI: Send + Sync {
    /// Complete a prompt with an LLM (returns raw text response)
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Complete a prompt expecting JSON response (returns raw text)
    /// Locate and parse the JSON object in calling code
    async fn complete_json(&self, prompt: &str) -> Result<String> {
        self.complete(prompt).await
    }
}

// =============================================================================
// Rendering Trait (Infrastructure - headless browser sessions)
// =============================================================================

/// Navigation lifecycle event to wait for before reading the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    Load,
    DomContentLoaded,
    NetworkIdle0,
    NetworkIdle2,
}

impl WaitUntil {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitUntil::Load => "load",
            WaitUntil::DomContentLoaded => "domcontentloaded",
            WaitUntil::NetworkIdle0 => "networkidle0",
            WaitUntil::NetworkIdle2 => "networkidle2",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavigateOptions {
    pub wait_until: WaitUntil,
    pub timeout: Duration,
}

impl NavigateOptions {
    pub fn network_idle(timeout: Duration) -> Self {
        Self {
            wait_until: WaitUntil::NetworkIdle2,
            timeout,
        }
    }
}

/// Rendered document returned by a navigation
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// URL the document was rendered from
    pub url: String,
    pub html: String,
}

/// A leased rendering session. Must be closed on every exit path.
#[async_trait]
pub trait RenderSession: Send {
    async fn navigate(&mut self, url: &str, options: &NavigateOptions) -> Result<RenderedPage>;

    async fn close(self: Box<Self>);
}

#[async_trait]
pub trait BaseRenderer: Send + Sync {
    /// Lease a session, waiting for capacity when all sessions are in use
    async fn open_session(&self) -> Result<Box<dyn RenderSession>>;
}

// =============================================================================
// Key-Value Cache Trait (Infrastructure - string values by key)
// =============================================================================

#[async_trait]
pub trait BaseKeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Unconditionally replaces any existing value
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

// =============================================================================
// Relational Store Traits (Infrastructure - implemented over the models)
// =============================================================================

#[async_trait]
pub trait BaseCompanyConfigStore: Send + Sync {
    async fn find(&self, company_id: &CompanyId) -> Result<Option<CompanyConfig>>;

    /// Stores `url` as the canonical URL unless one is already set
    async fn backfill_canonical_url(&self, company_id: &CompanyId, url: &str)
        -> Result<CompanyConfig>;

    /// Replaces the override selectors, preserving the canonical URL
    async fn upsert_override_selectors(
        &self,
        company_id: &CompanyId,
        selectors: &SelectorConfig,
    ) -> Result<CompanyConfig>;
}

#[async_trait]
pub trait BaseProductionLedger: Send + Sync {
    /// Insert-or-update keyed by (company_id, url)
    async fn upsert(&self, job: &NewProductionJob) -> Result<ProductionJob>;
}
