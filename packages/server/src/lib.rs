// Self-healing careers-page scraper - core library
//
// Work items arrive through the Restate `ScrapeService`; zero-result pages are
// handed to the durable `SelfHealWorkflow`. The axum router serves the
// browser-extension mediator and manual selector overrides.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
