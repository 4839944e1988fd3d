use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ApiError, ApiResponse, AppState, HealthCheck, HealthResponse};
use crate::models::{Product, Tracking};
use crate::product_manager::TrackRequest;
use crate::scheduler::{CheckSummary, WatchStats};

/// Event id understood by the action endpoint.
pub const PRICE_CHECK_EVENT: &str = "scheduled_price_check";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub event: ActionEvent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEvent {
    pub id: String,
    #[serde(default)]
    pub trigger: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopTrackingResponse {
    pub subscription_id: String,
    pub stopped: bool,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.watch.stats().await;
    let runner = HealthCheck {
        name: "price_watch".to_string(),
        status: if stats.running { "running" } else { "idle" }.to_string(),
        message: stats
            .last_run
            .map(|run| format!("last run finished at {}", run.finished_at)),
    };

    Json(HealthResponse::healthy(state.started_at, vec![runner]))
}

pub async fn track_product(
    State(state): State<AppState>,
    Json(request): Json<TrackRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Tracking>>), ApiError> {
    let url = request.url.clone();

    match state.product_manager.track_product(request).await? {
        Some(tracking) => Ok((StatusCode::CREATED, Json(ApiResponse::success(tracking)))),
        None => {
            tracing::warn!(url = %url, "Could not extract a title and price");
            Err(ApiError::unprocessable(format!("Failed to scrape product at {}", url)))
        }
    }
}

pub async fn list_trackings(
    State(state): State<AppState>,
    Path(watcher_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Tracking>>>, ApiError> {
    if watcher_id.trim().is_empty() {
        return Err(ApiError::bad_request("Watcher ID is required"));
    }

    let trackings = state.product_manager.list_trackings(&watcher_id).await;
    let meta = json!({ "total": trackings.len() });
    Ok(Json(ApiResponse::success_with_meta(trackings, meta)))
}

pub async fn stop_tracking(
    State(state): State<AppState>,
    Path((watcher_id, subscription_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<StopTrackingResponse>>, ApiError> {
    if state
        .product_manager
        .stop_tracking(&subscription_id, &watcher_id)
        .await
    {
        Ok(Json(ApiResponse::success(StopTrackingResponse {
            subscription_id,
            stopped: true,
        })))
    } else {
        Err(ApiError::not_found("Subscription"))
    }
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    match state.product_manager.get_product(&id).await {
        Some(product) => Ok(Json(ApiResponse::success(product))),
        None => {
            tracing::debug!(product_id = %id, "Product not found");
            Err(ApiError::not_found("Product"))
        }
    }
}

pub async fn run_action(
    State(state): State<AppState>,
    Json(action): Json<ActionRequest>,
) -> Result<Json<ApiResponse<CheckSummary>>, ApiError> {
    if action.event.id != PRICE_CHECK_EVENT {
        tracing::warn!(event_id = %action.event.id, "Unknown action event");
        return Err(ApiError::not_found(format!("Action {}", action.event.id)));
    }

    tracing::info!(trigger = ?action.event.trigger, "Price check triggered by action");
    run_check_now(&state).await
}

pub async fn run_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CheckSummary>>, ApiError> {
    run_check_now(&state).await
}

pub async fn check_status(State(state): State<AppState>) -> Json<ApiResponse<WatchStats>> {
    Json(ApiResponse::success(state.watch.stats().await))
}

async fn run_check_now(state: &AppState) -> Result<Json<ApiResponse<CheckSummary>>, ApiError> {
    state
        .watch
        .run_check()
        .await
        .map(|summary| Json(ApiResponse::success(summary)))
        .ok_or_else(|| ApiError::conflict("A price check is already running"))
}
