//! Server dependencies for activities (using traits for testability)
//!
//! Central dependency container shared by the Restate handlers and the HTTP
//! routes. Every external capability sits behind a Base* trait so
//! activities can run against the in-memory doubles in `test_dependencies`.

use std::sync::Arc;
use std::time::Duration;

use crate::domains::extension::ExtensionChannel;
use crate::domains::inference::InferenceGateway;
use crate::domains::postings::ProductionLedger;
use crate::domains::selectors::SelectorStore;
use crate::kernel::{
    BaseAI, BaseCompanyConfigStore, BaseKeyValueCache, BaseProductionLedger, BaseRenderer,
    NavigateOptions,
};

/// Default bounded wait for a page to settle
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Default upper bound on a captured-HTML request body
pub const DEFAULT_MAX_CAPTURE_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct ServerDeps {
    pub ai: Arc<dyn BaseAI>,
    pub renderer: Arc<dyn BaseRenderer>,
    /// Selector cache and extension channel slots
    pub cache: Arc<dyn BaseKeyValueCache>,
    pub company_configs: Arc<dyn BaseCompanyConfigStore>,
    pub ledger: Arc<dyn BaseProductionLedger>,
    pub render_timeout: Duration,
    pub max_capture_bytes: usize,
}

impl ServerDeps {
    pub fn new(
        ai: Arc<dyn BaseAI>,
        renderer: Arc<dyn BaseRenderer>,
        cache: Arc<dyn BaseKeyValueCache>,
        company_configs: Arc<dyn BaseCompanyConfigStore>,
        ledger: Arc<dyn BaseProductionLedger>,
    ) -> Self {
        Self {
            ai,
            renderer,
            cache,
            company_configs,
            ledger,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            max_capture_bytes: DEFAULT_MAX_CAPTURE_BYTES,
        }
    }

    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    pub fn with_max_capture_bytes(mut self, bytes: usize) -> Self {
        self.max_capture_bytes = bytes;
        self
    }

    pub fn navigate_options(&self) -> NavigateOptions {
        NavigateOptions::network_idle(self.render_timeout)
    }

    pub fn selector_store(&self) -> SelectorStore {
        SelectorStore::new(self.cache.clone(), self.company_configs.clone())
    }

    pub fn production_ledger(&self) -> ProductionLedger {
        ProductionLedger::new(self.ledger.clone())
    }

    pub fn extension_channel(&self) -> ExtensionChannel {
        ExtensionChannel::new(self.cache.clone())
    }

    pub fn inference(&self) -> InferenceGateway {
        InferenceGateway::new(self.ai.clone())
    }
}
