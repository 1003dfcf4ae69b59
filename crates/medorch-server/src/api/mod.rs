mod delivery;
mod pharmacies;
mod scrape;

use std::sync::Arc;

use axum::{
    extract::{FromRequest, Request, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use medorch_core::{AppConfig, Coordinate};
use medorch_delivery::AgentRegistry;
use medorch_dispatch::{Collaborator, Dispatcher, ProcessWorker, SourceId, UpstreamError};
use serde::{de::DeserializeOwned, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher<ProcessWorker>>,
    pub ranking: Arc<Collaborator>,
    pub routing: Arc<Collaborator>,
    pub agents: Arc<AgentRegistry>,
    pub default_top_k: u32,
}

impl AppState {
    /// Wire the scraper, ranking, and routing processes and the agent registry.
    pub fn from_config(config: &AppConfig, agents: AgentRegistry) -> anyhow::Result<Self> {
        let dispatcher = Dispatcher::new(
            ProcessWorker::from_config(config),
            SourceId::ALL.to_vec(),
            config.workers_per_source,
        )?;
        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            ranking: Arc::new(Collaborator::ranking(config)),
            routing: Arc::new(Collaborator::routing(config)),
            agents: Arc::new(agents),
            default_top_k: config.default_top_k,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    /// Diagnostic text captured from a failed collaborator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    agents: usize,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                details: None,
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: Option<&str>) -> Self {
        self.error.details = details.map(ToOwned::to_owned);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_unavailable" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn validation_error(request_id: &str, message: impl Into<String>) -> ApiError {
    ApiError::new(request_id, "validation_error", message)
}

pub(super) fn map_upstream_error(request_id: &str, error: &UpstreamError) -> ApiError {
    tracing::error!(error = %error, details = ?error.diagnostics(), "collaborator failed");
    ApiError::new(request_id, "upstream_unavailable", error.to_string())
        .with_details(error.diagnostics())
}

pub(super) fn map_delivery_error(
    request_id: &str,
    error: &medorch_delivery::DeliveryError,
) -> ApiError {
    match error {
        medorch_delivery::DeliveryError::InvalidArgument(message) => {
            validation_error(request_id, message.clone())
        }
        other => {
            tracing::error!(error = %other, "delivery assignment failed");
            ApiError::new(request_id, "internal_error", other.to_string())
        }
    }
}

/// JSON request body whose rejections use the [`ApiError`] envelope.
///
/// Malformed JSON, a wrong content type, or a field of the wrong shape all
/// become `validation_error` (400) instead of axum's plain-text rejection.
pub(super) struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_default();
        match Json::<T>::from_request(req, state).await {
            Ok(Json(body)) => Ok(Self(body)),
            Err(rejection) => Err(validation_error(
                &request_id,
                format!("invalid request body: {}", rejection.body_text()),
            )),
        }
    }
}

/// Reject missing, non-finite, or out-of-range coordinates.
pub(super) fn require_coordinate(
    request_id: &str,
    field: &str,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Coordinate, ApiError> {
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(validation_error(
            request_id,
            format!("{field} coordinates (latitude, longitude) are required"),
        ));
    };
    let point = Coordinate::new(latitude, longitude);
    if !point.is_valid() {
        return Err(validation_error(
            request_id,
            format!("{field} coordinates ({latitude}, {longitude}) are out of range"),
        ));
    }
    Ok(point)
}

/// Trimmed, non-blank medicine names; at least one is required.
pub(super) fn require_names(
    request_id: &str,
    field: &str,
    names: Option<Vec<String>>,
) -> Result<Vec<String>, ApiError> {
    let names: Vec<String> = names
        .unwrap_or_default()
        .into_iter()
        .map(|n| n.trim().to_owned())
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        return Err(validation_error(
            request_id,
            format!("{field} array is required and cannot be empty"),
        ));
    }
    Ok(names)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/scrape", post(scrape::scrape_medicines))
        .route("/api/v1/pharmacies", post(pharmacies::find_pharmacies))
        .route("/api/v1/delivery", post(delivery::create_delivery))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            agents: state.agents.len(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}
