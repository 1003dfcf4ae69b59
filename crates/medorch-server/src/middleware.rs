use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id, stored as a request extension by [`request_id`].
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer tokens accepted on the lookup, pharmacy, and delivery routes.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<HashSet<String>>,
    pub enabled: bool,
}

impl AuthState {
    pub fn from_config(config: &medorch_core::AppConfig) -> anyhow::Result<Self> {
        Self::from_keys(
            config.api_keys.as_deref(),
            matches!(config.env, medorch_core::Environment::Development),
        )
    }

    /// Parse `MEDORCH_API_KEYS` (comma-separated).
    ///
    /// An empty list turns auth off in development and is a startup error
    /// anywhere else.
    pub fn from_keys(raw: Option<&str>, is_development: bool) -> anyhow::Result<Self> {
        let keys: HashSet<String> = raw
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if !keys.is_empty() {
            return Ok(Self {
                api_keys: Arc::new(keys),
                enabled: true,
            });
        }
        if !is_development {
            anyhow::bail!("MEDORCH_API_KEYS must list at least one bearer token outside development");
        }

        tracing::warn!("MEDORCH_API_KEYS is empty; bearer auth is off for development");
        Ok(Self {
            api_keys: Arc::new(HashSet::new()),
            enabled: false,
        })
    }

    fn allows(&self, token: &str) -> bool {
        self.api_keys.contains(token)
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// Bearer token accepted by [`require_bearer_auth`], stored as a request
/// extension. Absent when auth is off.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient(pub String);

/// Fixed-window request budget, tracked separately for each client.
///
/// Clients are told apart by their [`AuthenticatedClient`] token, so the
/// limiter must run inside [`require_bearer_auth`]. Requests without one
/// share a single budget.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: u32,
    window: Duration,
    clients: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimitState {
    /// A `max_requests` of zero turns limiting off.
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn from_config(config: &medorch_core::AppConfig) -> Self {
        Self::new(config.rate_limit_per_minute, Duration::from_secs(60))
    }

    /// Count one request for `client`; `false` once its budget is spent.
    async fn admit(&self, client: &str) -> bool {
        if self.max_requests == 0 {
            return true;
        }

        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        // Drop idle clients so the map stays bounded by recent traffic.
        clients.retain(|_, w| now.duration_since(w.started_at) < self.window);

        let window = clients.entry(client.to_owned()).or_insert(Window {
            started_at: now,
            count: 0,
        });
        if window.count >= self.max_requests {
            return false;
        }
        window.count += 1;
        true
    }
}

/// Take the caller's `x-request-id` or mint a `UUIDv4`, expose it as a
/// [`RequestId`] extension, and echo it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, val);
    }
    res
}

pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    let accepted = bearer_token(req.headers())
        .filter(|token| auth.allows(token))
        .map(ToOwned::to_owned);
    match accepted {
        Some(token) => {
            req.extensions_mut().insert(AuthenticatedClient(token));
            next.run(req).await
        }
        None => {
            tracing::warn!(path = %req.uri().path(), "rejected request without a valid bearer token");
            ApiError::new(
                request_id_of(&req),
                "unauthorized",
                "missing or invalid bearer token",
            )
            .into_response()
        }
    }
}

pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let client = req
        .extensions()
        .get::<AuthenticatedClient>()
        .map_or_else(|| "anonymous".to_owned(), |c| c.0.clone());
    if rate_limit.admit(&client).await {
        return next.run(req).await;
    }

    tracing::warn!(path = %req.uri().path(), "rate limit exceeded");
    ApiError::new(request_id_of(&req), "rate_limited", "rate limit exceeded").into_response()
}

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
