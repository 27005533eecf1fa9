// TestDependencies - in-memory doubles for testing
//
// Every Base* trait has a double here. Doubles record their calls so tests
// can assert on what an activity did, not just what it returned.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use super::{
    BaseAI, BaseCompanyConfigStore, BaseKeyValueCache, BaseProductionLedger, BaseRenderer,
    NavigateOptions, RenderSession, RenderedPage, ServerDeps,
};
use crate::common::CompanyId;
use crate::domains::postings::models::{NewProductionJob, ProductionJob};
use crate::domains::selectors::models::{CompanyConfig, SelectorConfig};

// =============================================================================
// Mock AI
// =============================================================================

pub struct MockAI {
    responses: Arc<Mutex<Vec<Result<String, String>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockAI {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a response; responses are returned in order
    pub fn with_response(self, response: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(Ok(response.to_string()));
        self
    }

    /// Queue a failed completion
    pub fn with_error(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(Err(message.to_string()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Check if any prompt contained the given text
    pub fn was_called_with(&self, needle: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|p| p.contains(needle))
    }
}

impl Default for MockAI {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseAI for MockAI {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push(prompt.to_string());

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(anyhow!("MockAI has no queued response"));
        }
        responses.remove(0).map_err(|e| anyhow!(e))
    }
}

// =============================================================================
// Mock Renderer
// =============================================================================

#[derive(Default)]
struct RendererState {
    pages: HashMap<String, Result<String, String>>,
    navigations: Vec<String>,
}

pub struct MockRenderer {
    state: Arc<Mutex<RendererState>>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RendererState::default())),
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), Ok(html.to_string()));
        self
    }

    /// Navigation to `url` fails with `message`
    pub fn with_failure(self, url: &str, message: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), Err(message.to_string()));
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRenderer for MockRenderer {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            state: self.state.clone(),
            closed: self.closed.clone(),
        }))
    }
}

struct MockSession {
    state: Arc<Mutex<RendererState>>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderSession for MockSession {
    async fn navigate(&mut self, url: &str, _options: &NavigateOptions) -> Result<RenderedPage> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        match state.pages.get(url) {
            Some(Ok(html)) => Ok(RenderedPage {
                url: url.to_string(),
                html: html.clone(),
            }),
            Some(Err(message)) => Err(anyhow!(message.clone())),
            None => Err(anyhow!("navigation to {} failed: 404", url)),
        }
    }

    async fn close(self: Box<Self>) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// In-memory key-value cache
// =============================================================================

pub struct MemoryCache {
    values: Mutex<HashMap<String, String>>,
    failing: bool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            failing: false,
        }
    }

    /// Every operation fails (cache outage)
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            return Err(anyhow!("cache unavailable"));
        }
        Ok(())
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseKeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check()?;
        self.insert(key, value);
        Ok(())
    }
}

// =============================================================================
// In-memory company config store
// =============================================================================

pub struct MemoryCompanyConfigStore {
    rows: Mutex<HashMap<String, CompanyConfig>>,
    failing: bool,
}

impl MemoryCompanyConfigStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            failing: false,
        }
    }

    pub fn with_config(self, config: CompanyConfig) -> Self {
        self.rows
            .lock()
            .unwrap()
            .insert(config.company_id.clone(), config);
        self
    }

    /// Every operation fails (database outage)
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn get(&self, company_id: &CompanyId) -> Option<CompanyConfig> {
        self.rows.lock().unwrap().get(company_id.as_str()).cloned()
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            return Err(anyhow!("database unavailable"));
        }
        Ok(())
    }

    fn blank(company_id: &CompanyId) -> CompanyConfig {
        CompanyConfig {
            company_id: company_id.to_string(),
            careers_page_url: None,
            override_selectors: None,
            updated_at: Utc::now(),
        }
    }
}

impl Default for MemoryCompanyConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseCompanyConfigStore for MemoryCompanyConfigStore {
    async fn find(&self, company_id: &CompanyId) -> Result<Option<CompanyConfig>> {
        self.check()?;
        Ok(self.get(company_id))
    }

    async fn backfill_canonical_url(
        &self,
        company_id: &CompanyId,
        url: &str,
    ) -> Result<CompanyConfig> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .entry(company_id.to_string())
            .or_insert_with(|| Self::blank(company_id));
        if row.canonical_url().is_none() {
            row.careers_page_url = Some(url.to_string());
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn upsert_override_selectors(
        &self,
        company_id: &CompanyId,
        selectors: &SelectorConfig,
    ) -> Result<CompanyConfig> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .entry(company_id.to_string())
            .or_insert_with(|| Self::blank(company_id));
        row.override_selectors = Some(serde_json::to_value(selectors)?);
        row.updated_at = Utc::now();
        Ok(row.clone())
    }
}

// =============================================================================
// In-memory production ledger
// =============================================================================

pub struct MemoryProductionLedger {
    records: Mutex<Vec<ProductionJob>>,
    upsert_calls: AtomicUsize,
    failing: bool,
}

impl MemoryProductionLedger {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            upsert_calls: AtomicUsize::new(0),
            failing: false,
        }
    }

    /// Every write fails as if the database were unreachable
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn records(&self) -> Vec<ProductionJob> {
        self.records.lock().unwrap().clone()
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }
}

impl Default for MemoryProductionLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseProductionLedger for MemoryProductionLedger {
    async fn upsert(&self, job: &NewProductionJob) -> Result<ProductionJob> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(anyhow!("connection refused"));
        }

        let mut records = self.records.lock().unwrap();
        if let Some(existing) = records
            .iter_mut()
            .find(|r| r.company_id == job.company_id && r.url == job.url)
        {
            existing.title = job.title.clone();
            existing.location = job.location.clone();
            existing.snippet = job.snippet.clone();
            existing.scraped_at = job.scraped_at;
            existing.raw_payload = job.raw_payload.clone();
            return Ok(existing.clone());
        }

        let record = ProductionJob {
            job_id: Uuid::now_v7(),
            company_id: job.company_id.clone(),
            title: job.title.clone(),
            location: job.location.clone(),
            url: job.url.clone(),
            snippet: job.snippet.clone(),
            scraped_at: job.scraped_at,
            raw_payload: job.raw_payload.clone(),
        };
        records.push(record.clone());
        Ok(record)
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Bundle of doubles with handles kept for assertions
pub struct TestDependencies {
    pub ai: Arc<MockAI>,
    pub renderer: Arc<MockRenderer>,
    pub cache: Arc<MemoryCache>,
    pub company_configs: Arc<MemoryCompanyConfigStore>,
    pub ledger: Arc<MemoryProductionLedger>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            ai: Arc::new(MockAI::new()),
            renderer: Arc::new(MockRenderer::new()),
            cache: Arc::new(MemoryCache::new()),
            company_configs: Arc::new(MemoryCompanyConfigStore::new()),
            ledger: Arc::new(MemoryProductionLedger::new()),
        }
    }

    pub fn mock_ai(mut self, ai: MockAI) -> Self {
        self.ai = Arc::new(ai);
        self
    }

    pub fn mock_renderer(mut self, renderer: MockRenderer) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    pub fn cache(mut self, cache: MemoryCache) -> Self {
        self.cache = Arc::new(cache);
        self
    }

    pub fn company_configs(mut self, store: MemoryCompanyConfigStore) -> Self {
        self.company_configs = Arc::new(store);
        self
    }

    pub fn ledger(mut self, ledger: MemoryProductionLedger) -> Self {
        self.ledger = Arc::new(ledger);
        self
    }

    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.ai.clone(),
            self.renderer.clone(),
            self.cache.clone(),
            self.company_configs.clone(),
            self.ledger.clone(),
        )
        .with_render_timeout(Duration::from_secs(5))
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
