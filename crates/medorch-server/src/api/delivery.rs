use axum::{extract::State, Extension, Json};
use medorch_delivery::{Assignment, ClassifiedLocation, RoutingRequest, TierLists};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::pharmacies::{rank_and_classify, resolve_top_k};
use super::{
    map_delivery_error, map_upstream_error, require_coordinate, require_names, ApiError, ApiJson,
    ApiResponse, AppState, ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct PointBody {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DeliveryRequest {
    pub origin: Option<PointBody>,
    pub medicine_names: Option<Vec<String>>,
    pub top_k: Option<u32>,
    /// Pickup store; the top-ranked store when omitted.
    pub store: Option<PointBody>,
}

#[derive(Debug, Serialize)]
pub(super) struct DeliveryResponse {
    assignment: Assignment,
    stores: Vec<ClassifiedLocation>,
    tiers: TierLists,
    map: serde_json::Value,
}

/// POST /api/v1/delivery: rank stores, assign the nearest agent to the
/// pickup store, and have the routing collaborator draw the trip.
pub(super) async fn create_delivery(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<DeliveryRequest>,
) -> Result<Json<ApiResponse<DeliveryResponse>>, ApiError> {
    let rid = &req_id.0;
    let (lat, lon) = body
        .origin
        .as_ref()
        .map_or((None, None), |p| (p.latitude, p.longitude));
    let origin = require_coordinate(rid, "origin", lat, lon)?;
    let medicine_names = require_names(rid, "medicine_names", body.medicine_names)?;
    let top_k = resolve_top_k(rid, body.top_k, state.default_top_k)?;
    let requested_store = body
        .store
        .as_ref()
        .map(|p| require_coordinate(rid, "store", p.latitude, p.longitude))
        .transpose()?;

    // The routing input depends on the ranking result, so these run in sequence.
    let (_, stores) = rank_and_classify(&state, rid, origin, &medicine_names, top_k).await?;

    let store = match (requested_store, stores.first()) {
        (Some(point), _) => point,
        (None, Some(top)) => top.coordinate(),
        (None, None) => {
            return Err(ApiError::new(
                rid,
                "not_found",
                "no pharmacies found for the requested medicines",
            ))
        }
    };

    let assignment = Assignment::nearest(&state.agents, store, origin)
        .map_err(|e| map_delivery_error(rid, &e))?;

    let tiers = TierLists::from_classified(&stores);
    let routing = RoutingRequest::map(origin, tiers.clone()).with_delivery(store, assignment.agent_idx);
    let map: serde_json::Value = state
        .routing
        .invoke_json(&routing)
        .await
        .map_err(|e| map_upstream_error(rid, &e))?;

    Ok(Json(ApiResponse {
        data: DeliveryResponse {
            assignment,
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

    use super::super::test_support::{app, app_with, post_json, FAILING, RANKING};

    const EMPTY_RANKING: &str = r#"echo '{"source_location":null,"ranked_stores":[]}'"#;

    fn request() -> serde_json::Value {
        json!({
            "origin": { "latitude": 12.9716, "longitude": 77.5946 },
            "medicine_names": ["Paracetamol", "Amoxicillin"],
            "store": { "latitude": 12.975, "longitude": 77.605 }
        })
    }

    #[tokio::test]
    async fn assigns_agent_nearest_to_selected_store() {
        let (status, json) = post_json(app(), "/api/v1/delivery", request()).await;
        assert_eq!(status, StatusCode::OK);

        let assignment = &json["data"]["assignment"];
        assert_eq!(assignment["agent_idx"], 1);
        assert_eq!(assignment["agent"]["name"], "Priya R");
        assert_eq!(assignment["charge"], 20);

        let received = &json["data"]["map"]["received"];
        assert_eq!(received["create_delivery"], true);
        assert_eq!(received["agent_idx"], 1);
        assert_eq!(received["best_store"], json!([12.975, 77.605]));
    }

    #[tokio::test]
    async fn defaults_to_top_ranked_store() {
        let mut body = request();
        body.as_object_mut().unwrap().remove("store");
        let (status, json) = post_json(app(), "/api/v1/delivery", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["data"]["assignment"]["store"],
            json!({ "latitude": 12.9784, "longitude": 77.6408 })
        );
    }

    #[tokio::test]
    async fn no_ranked_stores_is_not_found() {
        let mut body = request();
        body.as_object_mut().unwrap().remove("store");
        let (status, json) =
            post_json(app_with(EMPTY_RANKING, FAILING), "/api/v1/delivery", body).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn routing_failure_is_bad_gateway() {
        let (status, json) =
            post_json(app_with(RANKING, FAILING), "/api/v1/delivery", request()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"]["code"], "upstream_unavailable");
    }

    #[tokio::test]
    async fn non_array_medicine_names_is_validation_error() {
        let mut body = request();
        body["medicine_names"] = json!("Paracetamol");
        let (status, json) = post_json(app(), "/api/v1/delivery", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn missing_origin_is_rejected_before_ranking() {
        let (status, json) = post_json(
            app_with(FAILING, FAILING),
            "/api/v1/delivery",
            json!({ "medicine_names": ["Paracetamol"] }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["error"]["message"],
            "origin coordinates (latitude, longitude) are required"
        );
    }
}
