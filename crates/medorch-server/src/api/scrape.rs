use axum::{extract::State, Extension, Json};
use medorch_dispatch::{DispatchError, MergedRecord};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{require_names, validation_error, ApiError, ApiJson, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ScrapeRequest {
    pub medicines: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub(super) struct ScrapeResponse {
    results: Vec<MergedRecord>,
}

/// POST /api/v1/scrape: look every medicine up on every retail source.
///
/// Per-source failures are reported inside each record; the request only
/// fails on bad input.
pub(super) async fn scrape_medicines(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<ScrapeRequest>,
) -> Result<Json<ApiResponse<ScrapeResponse>>, ApiError> {
    let rid = &req_id.0;
    let medicines = require_names(rid, "medicines", body.medicines)?;

    tracing::info!(request_id = %rid, medicines = medicines.len(), "scrape requested");

    let results = state
        .dispatcher
        .lookup(&medicines)
        .await
        .map_err(|DispatchError::InvalidArgument(message)| validation_error(rid, message))?;

    Ok(Json(ApiResponse {
        data: ScrapeResponse { results },
        meta: ResponseMeta::new(req_id.0),
    }))
}
