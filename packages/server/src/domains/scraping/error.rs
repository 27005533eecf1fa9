use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Malformed work item - acknowledged and discarded, never retried
    #[error("invalid work item: {0}")]
    Validation(String),
    /// Store, network or rendering failure - redelivered with backoff
    #[error("transient failure: {0}")]
    Transient(#[from] anyhow::Error),
}

impl ScrapeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ScrapeError::Validation(msg.into())
    }

    /// Whether this error should trigger redelivery
    pub fn should_retry(&self) -> bool {
        matches!(self, ScrapeError::Transient(_))
    }
}
