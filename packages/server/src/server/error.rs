use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::common::{CompanyId, CompanyIdError};
use crate::domains::selectors::SelectorStoreError;

/// Error type for HTTP handlers, rendered as `{"error", "code"}` JSON.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed path or body
    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::Unprocessable(msg.into())
    }
}

impl From<CompanyIdError> for ApiError {
    fn from(err: CompanyIdError) -> Self {
        Self::Unprocessable(err.to_string())
    }
}

impl From<SelectorStoreError> for ApiError {
    fn from(err: SelectorStoreError) -> Self {
        match err {
            SelectorStoreError::Invalid(e) => Self::Unprocessable(e.to_string()),
            SelectorStoreError::Store(e) => Self::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unprocessable(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                msg.clone(),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, axum::Json(json!({ "error": message, "code": code }))).into_response()
    }
}

/// Path segment to `CompanyId`, 422 when it is not a usable identifier.
pub fn company_id_from_path(raw: &str) -> ApiResult<CompanyId> {
    Ok(CompanyId::parse(raw)?)
}

/// Decode a JSON body by hand so every shape error answers 422.
pub fn decode_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| ApiError::unprocessable(format!("invalid body: {}", e)))
}
