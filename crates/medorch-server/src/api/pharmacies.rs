use axum::{extract::State, Extension, Json};
use medorch_core::Coordinate;
use medorch_delivery::{classify_stores, ClassifiedLocation, RankingResponse, RoutingRequest, TierLists};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    map_upstream_error, require_coordinate, require_names, validation_error, ApiError, ApiJson,
    ApiResponse, AppState, ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct PharmaciesRequest {
    pub source_lat: Option<f64>,
    pub source_lon: Option<f64>,
    pub medicine_names: Option<Vec<String>>,
    pub top_k: Option<u32>,
}

/// Argument handed to the ranking collaborator.
#[derive(Debug, Serialize)]
pub(super) struct RankingInput<'a> {
    pub source_lat: f64,
    pub source_lon: f64,
    pub medicine_names: &'a [String],
    pub top_k: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct PharmaciesResponse {
    source_location: serde_json::Value,
    stores: Vec<ClassifiedLocation>,
    tiers: TierLists,
    map: serde_json::Value,
}

pub(super) fn resolve_top_k(request_id: &str, requested: Option<u32>, default: u32) -> Result<u32, ApiError> {
    match requested {
        Some(0) => Err(validation_error(request_id, "top_k must be at least 1")),
        Some(k) => Ok(k),
        None => Ok(default),
    }
}

/// Run the ranking collaborator and classify its stores in rank order.
pub(super) async fn rank_and_classify(
    state: &AppState,
    request_id: &str,
    source: Coordinate,
    medicine_names: &[String],
    top_k: u32,
) -> Result<(RankingResponse, Vec<ClassifiedLocation>), ApiError> {
    let input = RankingInput {
        source_lat: source.latitude,
        source_lon: source.longitude,
        medicine_names,
        top_k,
    };
    let ranking: RankingResponse = state
        .ranking
        .invoke_json(&input)
        .await
        .map_err(|e| map_upstream_error(request_id, &e))?;

    let stores = classify_stores(&ranking.ranked_stores);
    tracing::info!(
        request_id,
        stores = stores.len(),
        "ranked stores classified"
    );
    Ok((ranking, stores))
}

/// POST /api/v1/pharmacies: rank nearby pharmacies, tier them, and draw the map.
pub(super) async fn find_pharmacies(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<PharmaciesRequest>,
) -> Result<Json<ApiResponse<PharmaciesResponse>>, ApiError> {
    let rid = &req_id.0;
    let source = require_coordinate(rid, "source", body.source_lat, body.source_lon)?;
    let medicine_names = require_names(rid, "medicine_names", body.medicine_names)?;
    let top_k = resolve_top_k(rid, body.top_k, state.default_top_k)?;

    let (ranking, stores) = rank_and_classify(&state, rid, source, &medicine_names, top_k).await?;

    let tiers = TierLists::from_classified(&stores);
    let map: serde_json::Value = state
        .routing
        .invoke_json(&RoutingRequest::map(source, tiers.clone()))
        .await
        .map_err(|e| map_upstream_error(rid, &e))?;

    Ok(Json(ApiResponse {
        data: PharmaciesResponse {
            source_location: ranking.source_location,
            stores,
            tiers,
            map,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(all(test, unix))]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::super::test_support::{app, app_with, post_json, FAILING, ROUTING};

    fn request() -> serde_json::Value {
        json!({
            "source_lat": 12.9716,
            "source_lon": 77.5946,
            "medicine_names": ["Paracetamol", "Amoxicillin"],
            "top_k": 3
        })
    }

    #[tokio::test]
    async fn pharmacies_are_tiered_in_rank_order() {
        let (status, json) = post_json(app(), "/api/v1/pharmacies", request()).await;
        assert_eq!(status, StatusCode::OK);

        let stores = json["data"]["stores"].as_array().expect("stores array");
        let colors: Vec<&str> = stores.iter().map(|s| s["color"].as_str().unwrap()).collect();
        assert_eq!(colors, ["green", "yellow", "red"]);

        // Absence wins: Wellness Forever lists Amoxicillin as available and missing.
        assert_eq!(stores[2]["medicine_status"]["available"], json!([]));
        assert_eq!(
            stores[2]["medicine_status"]["missing"],
            json!(["Amoxicillin", "Paracetamol"])
        );

        assert_eq!(json["data"]["tiers"]["green_stores"], json!([[12.9784, 77.6408]]));
        assert_eq!(json["data"]["source_location"]["lat"], 12.9716);
    }

    #[tokio::test]
    async fn routing_receives_tier_lists_without_delivery() {
        let (_, json) = post_json(app(), "/api/v1/pharmacies", request()).await;
        let received = &json["data"]["map"]["received"];
        assert_eq!(received["origin"], json!([12.9716, 77.5946]));
        assert_eq!(received["red_stores"], json!([[12.96, 77.58]]));
        assert!(received.get("create_delivery").is_none());
        assert_eq!(json["data"]["map"]["map_html"], "<html></html>");
    }

    #[tokio::test]
    async fn missing_source_coordinates_are_rejected() {
        let (status, json) = post_json(
            app(),
            "/api/v1/pharmacies",
            json!({ "medicine_names": ["Paracetamol"] }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["error"]["message"],
            "source coordinates (latitude, longitude) are required"
        );
    }

    #[tokio::test]
    async fn non_array_medicine_names_is_validation_error() {
        let mut body = request();
        body["medicine_names"] = json!("Paracetamol");
        let (status, json) = post_json(app(), "/api/v1/pharmacies", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn zero_top_k_is_rejected() {
        let mut body = request();
        body["top_k"] = json!(0);
        let (status, _) = post_json(app(), "/api/v1/pharmacies", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ranking_failure_is_bad_gateway_with_details() {
        let (status, json) =
            post_json(app_with(FAILING, ROUTING), "/api/v1/pharmacies", request()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"]["code"], "upstream_unavailable");
        assert_eq!(json["error"]["details"], "Error: OSRM unreachable");
    }
}
