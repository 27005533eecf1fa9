pub mod services;

pub use services::scrape::{ScrapeService, ScrapeServiceClient, ScrapeServiceImpl};
