//! Selectors domain - per-company CSS locator sets, their precedence merge,
//! and persistence across the cache and `company_configs`.

pub mod models;
pub mod resolver;
pub mod store;

pub use models::{
    CompanyConfig, PartialSelectors, SelectorConfig, SelectorField, SelectorValidationError,
};
pub use resolver::{resolve_selectors, SelectorTiers};
pub use store::{selector_cache_key, PgCompanyConfigStore, SelectorStore, SelectorStoreError};
