use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::warn;

use super::selector_config::{present, PartialSelectors, SelectorConfig};

/// Per-company scrape configuration, created lazily on first write.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CompanyConfig {
    pub company_id: String,
    /// Canonical careers-page URL, preferred over any work-item fallback
    pub careers_page_url: Option<String>,
    pub override_selectors: Option<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyConfig {
    pub fn canonical_url(&self) -> Option<&str> {
        present(self.careers_page_url.as_deref())
    }

    /// Persisted override tier. Rows written outside this service may hold
    /// arbitrary JSON; anything that is not a selector object is ignored.
    pub fn overrides(&self) -> Option<PartialSelectors> {
        let value = self.override_selectors.clone()?;
        match PartialSelectors::from_value(value) {
            Ok(partial) if !partial.is_empty() => Some(partial),
            Ok(_) => None,
            Err(e) => {
                warn!(
                    company_id = %self.company_id,
                    error = %e,
                    "Ignoring malformed override_selectors"
                );
                None
            }
        }
    }

    pub async fn find_by_company_id(company_id: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM company_configs WHERE company_id = $1")
            .bind(company_id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Sets the canonical URL only when none is stored yet.
    pub async fn backfill_canonical_url(
        company_id: &str,
        url: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO company_configs (company_id, careers_page_url, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (company_id) DO UPDATE SET
                careers_page_url = COALESCE(
                    NULLIF(company_configs.careers_page_url, ''),
                    EXCLUDED.careers_page_url
                ),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(url)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Replaces the selector override, leaving the canonical URL untouched.
    pub async fn upsert_override_selectors(
        company_id: &str,
        selectors: &SelectorConfig,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO company_configs (company_id, override_selectors, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (company_id) DO UPDATE SET
                override_selectors = EXCLUDED.override_selectors,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(Json(selectors))
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}
