use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::product_manager::ProductManager;
use crate::scheduler::PriceWatch;

pub mod handlers;
pub mod middleware;
pub mod responses;

pub use handlers::{
    check_status, get_product, health_check, list_trackings, run_action, run_check,
    stop_tracking, track_product,
};
pub use responses::*;

#[derive(Clone)]
pub struct AppState {
    pub product_manager: Arc<ProductManager>,
    pub watch: Arc<PriceWatch>,
    pub trigger_token: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        product_manager: Arc<ProductManager>,
        watch: Arc<PriceWatch>,
        trigger_token: Option<String>,
    ) -> Self {
        Self {
            product_manager,
            watch,
            trigger_token: trigger_token.filter(|t| !t.is_empty()),
            started_at: Utc::now(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn api_routes(state: AppState) -> Router<AppState> {
    let triggers = Router::new()
        .route("/actions", post(run_action))
        .route("/check", post(run_check))
        .route_layer(from_fn_with_state(state, middleware::require_trigger_token));

    Router::new()
        .route("/trackings", post(track_product))
        .route("/watchers/:watcher_id/trackings", get(list_trackings))
        .route(
            "/watchers/:watcher_id/trackings/:subscription_id",
            delete(stop_tracking),
        )
        .route("/products/:id", get(get_product))
        .route("/check/status", get(check_status))
        .merge(triggers)
}

/// Binds `addr` and serves the API until `shutdown` resolves.
pub async fn serve(
    state: AppState,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
