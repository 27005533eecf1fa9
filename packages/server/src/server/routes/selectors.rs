//! Manual selector override: an operator pins a company's selector set.

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    Json,
};
use tracing::info;

use crate::domains::selectors::{CompanyConfig, SelectorConfig};
use crate::server::app::AppState;
use crate::server::error::{company_id_from_path, decode_body, ApiError, ApiResult};

/// Validates the body against the selector schema, then writes it through
/// the selector store (relational row and cache).
pub async fn save_selectors_handler(
    Extension(state): Extension<AppState>,
    Path(company_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<CompanyConfig>> {
    let company_id = company_id_from_path(&company_id)?;
    let value: serde_json::Value = decode_body(&body)?;
    let selectors = SelectorConfig::from_value(value)
        .map_err(|e| ApiError::unprocessable(e.to_string()))?;

    let config = state
        .server_deps
        .selector_store()
        .save_selectors(&company_id, &selectors)
        .await?;

    info!(company_id = %company_id, "Manual selector override stored");
    Ok(Json(config))
}
