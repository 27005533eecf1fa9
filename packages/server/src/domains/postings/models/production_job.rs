use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// A persisted job posting, unique per (company_id, url).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductionJob {
    pub job_id: Uuid,
    pub company_id: String,
    pub title: String,
    pub location: Option<String>,
    pub url: String,
    pub snippet: Option<String>,
    pub scraped_at: DateTime<Utc>,
    pub raw_payload: serde_json::Value,
}

/// Mutable fields for an upsert. `job_id` is minted by the store.
#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NewProductionJob {
    pub company_id: String,
    pub url: String,
    pub title: String,
    #[builder(default)]
    pub location: Option<String>,
    #[builder(default)]
    pub snippet: Option<String>,
    #[builder(default = Utc::now())]
    pub scraped_at: DateTime<Utc>,
    #[builder(default = serde_json::Value::Null)]
    pub raw_payload: serde_json::Value,
}

impl ProductionJob {
    /// Insert, or overwrite the mutable fields of the existing row for the
    /// same (company_id, url). The original job_id is kept.
    pub async fn upsert(job: &NewProductionJob, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO production_jobs
                (job_id, company_id, title, location, url, snippet, scraped_at, raw_payload)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (company_id, url) DO UPDATE SET
                title = EXCLUDED.title,
                location = EXCLUDED.location,
                snippet = EXCLUDED.snippet,
                scraped_at = EXCLUDED.scraped_at,
                raw_payload = EXCLUDED.raw_payload
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&job.company_id)
        .bind(&job.title)
        .bind(&job.location)
        .bind(&job.url)
        .bind(&job.snippet)
        .bind(job.scraped_at)
        .bind(&job.raw_payload)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_company(company_id: &str, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM production_jobs WHERE company_id = $1 ORDER BY scraped_at DESC, url",
        )
        .bind(company_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn count_by_company(company_id: &str, pool: &PgPool) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM production_jobs WHERE company_id = $1")
                .bind(company_id)
                .fetch_one(pool)
                .await?;
        Ok(count.0)
    }
}
