//! Selector persistence across the key-value cache and `company_configs`.
//!
//! The relational row holds operator and inferred overrides. The cache
//! entry under `selectors:<companyId>` holds the last selector set written
//! through either path, so dispatches pick it up without a database
//! round-trip.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use super::models::{CompanyConfig, PartialSelectors, SelectorConfig, SelectorValidationError};
use crate::common::CompanyId;
use crate::kernel::{BaseCompanyConfigStore, BaseKeyValueCache};

pub fn selector_cache_key(company_id: &CompanyId) -> String {
    format!("selectors:{}", company_id)
}

#[derive(Debug, Error)]
pub enum SelectorStoreError {
    #[error("invalid selectors: {0}")]
    Invalid(#[from] SelectorValidationError),
    #[error("selector store write failed: {0}")]
    Store(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct SelectorStore {
    cache: Arc<dyn BaseKeyValueCache>,
    configs: Arc<dyn BaseCompanyConfigStore>,
}

impl SelectorStore {
    pub fn new(cache: Arc<dyn BaseKeyValueCache>, configs: Arc<dyn BaseCompanyConfigStore>) -> Self {
        Self { cache, configs }
    }

    /// Cached override tier. A cache outage or a malformed entry reads as
    /// absent; the relational tier and defaults still apply.
    pub async fn cached_selectors(&self, company_id: &CompanyId) -> Option<PartialSelectors> {
        let key = selector_cache_key(company_id);
        let raw = match self.cache.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(company_id = %company_id, error = %e, "Selector cache read failed");
                return None;
            }
        };

        let decoded = serde_json::from_str::<serde_json::Value>(&raw)
            .map_err(|e| SelectorValidationError::Malformed(e.to_string()))
            .and_then(PartialSelectors::from_value);
        match decoded {
            Ok(partial) if !partial.is_empty() => Some(partial),
            Ok(_) => None,
            Err(e) => {
                warn!(company_id = %company_id, error = %e, "Ignoring malformed cached selectors");
                None
            }
        }
    }

    pub async fn company_config(&self, company_id: &CompanyId) -> Result<Option<CompanyConfig>> {
        self.configs.find(company_id).await
    }

    /// Validates, then writes the relational override and the cache entry.
    /// Re-running with the same input leaves the same state.
    pub async fn save_selectors(
        &self,
        company_id: &CompanyId,
        selectors: &SelectorConfig,
    ) -> Result<CompanyConfig, SelectorStoreError> {
        selectors.validate()?;

        let config = self
            .configs
            .upsert_override_selectors(company_id, selectors)
            .await?;

        self.write_cache(company_id, selectors).await?;

        info!(company_id = %company_id, "Selectors saved");
        Ok(config)
    }

    /// Validates, then writes the cache tier only. The relational override
    /// is left as it is.
    pub async fn cache_selectors(
        &self,
        company_id: &CompanyId,
        selectors: &SelectorConfig,
    ) -> Result<(), SelectorStoreError> {
        selectors.validate()?;
        self.write_cache(company_id, selectors).await?;

        info!(company_id = %company_id, "Selectors cached");
        Ok(())
    }

    async fn write_cache(&self, company_id: &CompanyId, selectors: &SelectorConfig) -> Result<()> {
        let payload = serde_json::to_string(selectors)?;
        self.cache
            .set(&selector_cache_key(company_id), &payload)
            .await
    }

    /// Records a canonical careers-page URL unless one is already set.
    pub async fn backfill_canonical_url(
        &self,
        company_id: &CompanyId,
        url: &Url,
    ) -> Result<CompanyConfig> {
        let config = self
            .configs
            .backfill_canonical_url(company_id, url.as_str())
            .await?;
        info!(
            company_id = %company_id,
            canonical_url = ?config.canonical_url(),
            "Canonical URL backfilled"
        );
        Ok(config)
    }
}

/// Postgres-backed company config store over the models
pub struct PgCompanyConfigStore {
    pool: PgPool,
}

impl PgCompanyConfigStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseCompanyConfigStore for PgCompanyConfigStore {
    async fn find(&self, company_id: &CompanyId) -> Result<Option<CompanyConfig>> {
        CompanyConfig::find_by_company_id(company_id.as_str(), &self.pool).await
    }

    async fn backfill_canonical_url(
        &self,
        company_id: &CompanyId,
        url: &str,
    ) -> Result<CompanyConfig> {
        CompanyConfig::backfill_canonical_url(company_id.as_str(), url, &self.pool).await
    }

    async fn upsert_override_selectors(
        &self,
        company_id: &CompanyId,
        selectors: &SelectorConfig,
    ) -> Result<CompanyConfig> {
        CompanyConfig::upsert_override_selectors(company_id.as_str(), selectors, &self.pool).await
    }
}
