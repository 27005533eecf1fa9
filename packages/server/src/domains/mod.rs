// Business domains
pub mod extension;
pub mod extraction;
pub mod inference;
pub mod postings;
pub mod scraping;
pub mod selectors;
pub mod self_heal;
