//! Inference domain - generative-model calls for canonical URL discovery
//! and selector suggestion, with strict validation of what comes back.

pub mod gateway;
pub mod html;
pub mod prompts;

pub use gateway::{extract_json_object, InferenceError, InferenceGateway};
pub use html::{condense_html, MAX_PROMPT_HTML_CHARS};
