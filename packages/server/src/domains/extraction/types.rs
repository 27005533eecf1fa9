use serde::{Deserialize, Serialize};

/// Snippets longer than this are cut on a character boundary
pub const SNIPPET_MAX_CHARS: usize = 500;

/// One posting candidate read from the rendered page. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedJob {
    pub title: String,
    /// Absolute URL, empty when the container had no usable link
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Candidates in document order; may be empty
    pub jobs: Vec<ExtractedJob>,
    /// Raw rendered HTML, kept as fallback input for healing
    pub html: String,
    pub page_url: String,
}
