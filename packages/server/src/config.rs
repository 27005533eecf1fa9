use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub browserless_url: String,
    pub browserless_token: Option<String>,
    /// Upper bound on how long a page may take to settle before extraction
    pub render_timeout_ms: u64,
    /// Largest captured-HTML body the extension mediator accepts
    pub max_capture_bytes: usize,
    /// Maximum concurrently leased rendering sessions
    pub max_render_sessions: usize,
    /// Port for the Restate endpoint (ScrapeService + SelfHealWorkflow)
    pub server_port: u16,
    /// Port for the extension mediator and manual override API
    pub http_port: u16,
    pub restate_identity_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?,
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            browserless_url: env::var("BROWSERLESS_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            browserless_token: env::var("BROWSERLESS_TOKEN").ok().filter(|t| !t.is_empty()),
            render_timeout_ms: env::var("RENDER_TIMEOUT_MS")
                .unwrap_or_else(|_| "30000".to_string())
                .parse()
                .context("RENDER_TIMEOUT_MS must be a valid number")?,
            max_capture_bytes: env::var("MAX_CAPTURE_BYTES")
                .unwrap_or_else(|_| "16777216".to_string())
                .parse()
                .context("MAX_CAPTURE_BYTES must be a valid number")?,
            max_render_sessions: env::var("MAX_RENDER_SESSIONS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .context("MAX_RENDER_SESSIONS must be a valid number")?,
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "9080".to_string())
                .parse()
                .context("SERVER_PORT must be a valid number")?,
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("HTTP_PORT must be a valid number")?,
            restate_identity_key: env::var("RESTATE_IDENTITY_KEY").ok(),
        })
    }
}
