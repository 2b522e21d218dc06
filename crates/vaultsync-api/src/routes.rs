use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use vaultsync_core::commit::CommitEntry;
use vaultsync_core::manifest::validate_identifier;
use vaultsync_core::LocalFile;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::rate_limit::{EndpointRateLimiter, ProtectedEndpoint, RateLimitMetricsSnapshot};
use crate::storage::R2PresignService;
use crate::store::{CommitOutcome, DeviceRecord, ManifestStore};
use crate::sync::{DiffResponse, SyncService};

pub const DEVICE_ID_HEADER: &str = "x-device-id";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    sync: Arc<SyncService>,
    endpoint_rate_limiter: Arc<EndpointRateLimiter>,
}

/// Device making the request, taken from the `x-device-id` header
#[derive(Debug, Clone)]
pub struct DeviceId(pub String);

impl AppState {
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let presigner = R2PresignService::from_config(&config).map(Arc::new);
        if presigner.is_none() {
            tracing::warn!("R2 is not configured; diffs that need transfers will fail with 503");
        }
        let sync = SyncService::new(
            ManifestStore::new(),
            presigner,
            config.quota,
            config.default_device_name.clone(),
        );
        Self {
            sync: Arc::new(sync),
            endpoint_rate_limiter: Arc::new(EndpointRateLimiter::from_config(config.as_ref())),
            config,
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    let sync_routes = Router::new()
        .route("/vaults/{vault_id}/sync/diff", post(sync_diff))
        .route("/vaults/{vault_id}/sync/commit", post(sync_commit))
        .route_layer(middleware::from_fn(require_device));
    let v1_routes = Router::new()
        .route("/vaults/{vault_id}/devices/{device_id}", put(register_device))
        .merge(sync_routes);

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/v1", v1_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
    rate_limit: RateLimitMetricsSnapshot,
}

async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
        rate_limit: state.endpoint_rate_limiter.metrics_snapshot(),
    })
}

async fn require_device(mut request: Request, next: Next) -> Result<Response, AppError> {
    let device_id = extract_device_id(request.headers())?;
    request.extensions_mut().insert(DeviceId(device_id));
    Ok(next.run(request).await)
}

fn extract_device_id(headers: &HeaderMap) -> Result<String, AppError> {
    let value = headers
        .get(DEVICE_ID_HEADER)
        .ok_or_else(|| AppError::bad_request("Missing x-device-id header"))?
        .to_str()
        .map_err(|_| AppError::bad_request("x-device-id header must be ASCII"))?
        .trim();
    validate_identifier("device id", value)?;
    Ok(value.to_string())
}

#[derive(Debug, Deserialize)]
struct RegisterDeviceRequest {
    name: String,
}

async fn register_device(
    State(state): State<AppState>,
    Path((vault_id, device_id)): Path<(String, String)>,
    Json(request): Json<RegisterDeviceRequest>,
) -> Result<Json<DeviceRecord>, AppError> {
    validate_identifier("vault id", &vault_id)?;
    validate_identifier("device id", &device_id)?;
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("device name is required"));
    }

    let record = state
        .sync
        .store()
        .register_device(&vault_id, &device_id, name.to_string())
        .await;
    tracing::info!(vault = %vault_id, device = %device_id, "Registered device");
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
struct DiffRequest {
    files: Vec<LocalFile>,
}

async fn sync_diff(
    State(state): State<AppState>,
    Extension(DeviceId(device_id)): Extension<DeviceId>,
    Path(vault_id): Path<String>,
    Json(request): Json<DiffRequest>,
) -> Result<Json<DiffResponse>, AppError> {
    state
        .endpoint_rate_limiter
        .check(ProtectedEndpoint::SyncDiff, &device_id)
        .await?;

    let response = state.sync.diff(&vault_id, &device_id, &request.files).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct CommitRequest {
    files: Vec<CommitEntry>,
}

async fn sync_commit(
    State(state): State<AppState>,
    Extension(DeviceId(device_id)): Extension<DeviceId>,
    Path(vault_id): Path<String>,
    Json(request): Json<CommitRequest>,
) -> Result<Json<CommitOutcome>, AppError> {
    state
        .endpoint_rate_limiter
        .check(ProtectedEndpoint::SyncCommit, &device_id)
        .await?;

    let outcome = state
        .sync
        .commit(&vault_id, &device_id, &request.files)
        .await?;
    Ok(Json(outcome))
}
