//! Extraction domain - renders a careers page and evaluates a selector set
//! against it.

pub mod engine;
pub mod types;

pub use engine::{extract_jobs, ExtractionEngine};
pub use types::{ExtractedJob, ExtractionResult, SNIPPET_MAX_CHARS};
