//! Scraper server
//!
//! Runs the Restate endpoint (ScrapeService + SelfHealWorkflow) and, on a
//! second port, the axum router for the extension mediator and manual
//! selector overrides.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use careers_core::domains::postings::PgProductionLedger;
use careers_core::domains::scraping::{ScrapeService, ScrapeServiceImpl};
use careers_core::domains::selectors::PgCompanyConfigStore;
use careers_core::domains::self_heal::{SelfHealWorkflow, SelfHealWorkflowImpl};
use careers_core::kernel::{BrowserlessRenderer, OpenAIClient, RedisCache, ServerDeps};
use careers_core::server::build_app;
use careers_core::Config;
use restate_sdk::prelude::*;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,careers_core=debug,restate_sdk=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting careers scraper");

    let config = Config::from_env()?;

    // Database setup
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let cache = RedisCache::connect(&config.redis_url).await?;
    let ai = OpenAIClient::new(config.openai_api_key.clone(), config.openai_model.clone())?;
    let renderer = BrowserlessRenderer::new(
        &config.browserless_url,
        config.browserless_token.as_deref(),
        config.max_render_sessions,
    )?;
    tracing::info!(
        browserless_url = %config.browserless_url,
        max_render_sessions = config.max_render_sessions,
        "Renderer configured"
    );

    let server_deps = Arc::new(
        ServerDeps::new(
            Arc::new(ai),
            Arc::new(renderer),
            Arc::new(cache),
            Arc::new(PgCompanyConfigStore::new(pool.clone())),
            Arc::new(PgProductionLedger::new(pool)),
        )
        .with_render_timeout(Duration::from_millis(config.render_timeout_ms))
        .with_max_capture_bytes(config.max_capture_bytes),
    );

    // Extension mediator + manual override API
    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .context("Failed to bind HTTP server")?;
    tracing::info!("HTTP server listening on {}", http_addr);
    let router = build_app(server_deps.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(http_listener, router).await {
            tracing::error!(error = %e, "HTTP server stopped");
        }
    });

    // Restate endpoint
    let mut builder = Endpoint::builder();

    if let Some(identity_key) = &config.restate_identity_key {
        tracing::info!("Restate identity key configured");
        builder = builder
            .identity_key(identity_key)
            .context("Invalid Restate identity key")?;
    }

    let endpoint = builder
        .bind(ScrapeServiceImpl::with_deps(server_deps.clone()).serve())
        .bind(SelfHealWorkflowImpl::with_deps(server_deps).serve())
        .build();

    let addr = format!("0.0.0.0:{}", config.server_port);
    tracing::info!("Restate endpoint listening on {}", addr);

    HttpServer::new(endpoint)
        .listen_and_serve(addr.parse()?)
        .await;

    Ok(())
}
