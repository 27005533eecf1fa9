//! Idempotent store of production job records.
//!
//! Records are keyed by (company_id, url). Redelivered work items and
//! concurrent runs for the same company converge on one row per key; the
//! unique constraint is the only coordination between them.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use super::models::{NewProductionJob, ProductionJob};
use crate::kernel::BaseProductionLedger;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("companyId must not be empty")]
    EmptyCompanyId,
    #[error("url must not be empty")]
    EmptyUrl,
    #[error("ledger write failed: {0}")]
    Store(#[from] anyhow::Error),
}

/// Outcome of persisting a batch of records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    pub persisted: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct ProductionLedger {
    store: Arc<dyn BaseProductionLedger>,
}

impl ProductionLedger {
    pub fn new(store: Arc<dyn BaseProductionLedger>) -> Self {
        Self { store }
    }

    pub async fn upsert(&self, mut job: NewProductionJob) -> Result<ProductionJob, LedgerError> {
        job.company_id = job.company_id.trim().to_string();
        job.url = job.url.trim().to_string();
        if job.company_id.is_empty() {
            return Err(LedgerError::EmptyCompanyId);
        }
        if job.url.is_empty() {
            return Err(LedgerError::EmptyUrl);
        }

        Ok(self.store.upsert(&job).await?)
    }

    /// Upserts every record. A record with a blank key is logged and
    /// skipped; a store failure stops the batch and is returned so the
    /// caller can redeliver it. Upserts are idempotent, so a redelivered
    /// batch rewrites the records that already landed.
    pub async fn persist_all(
        &self,
        jobs: Vec<NewProductionJob>,
    ) -> Result<PersistSummary, LedgerError> {
        let mut summary = PersistSummary::default();

        for job in jobs {
            let company_id = job.company_id.clone();
            let url = job.url.clone();
            match self.upsert(job).await {
                Ok(record) => {
                    debug!(company_id = %company_id, job_id = %record.job_id, url = %url, "Upserted job");
                    summary.persisted += 1;
                }
                Err(e @ LedgerError::Store(_)) => {
                    warn!(company_id = %company_id, url = %url, error = %e, "Ledger unavailable, abandoning batch");
                    return Err(e);
                }
                Err(e) => {
                    warn!(company_id = %company_id, url = %url, error = %e, "Skipping invalid job record");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

/// Postgres-backed ledger over the `production_jobs` table
pub struct PgProductionLedger {
    pool: PgPool,
}

impl PgProductionLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseProductionLedger for PgProductionLedger {
    async fn upsert(&self, job: &NewProductionJob) -> Result<ProductionJob> {
        ProductionJob::upsert(job, &self.pool).await
    }
}
