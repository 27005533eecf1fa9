// Common types and utilities shared across the application

pub mod entity_ids;
pub mod http_url;
pub mod restate_serde;
pub mod restate_types;

pub use entity_ids::*;
pub use http_url::parse_http_url;
pub use restate_types::EmptyRequest;
