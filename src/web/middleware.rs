use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use super::{ApiError, AppState};

pub const TRIGGER_TOKEN_HEADER: &str = "x-trigger-token";

/// Rejects check triggers that do not carry the configured shared secret. Open when
/// no token is configured.
pub async fn require_trigger_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.trigger_token.as_deref() {
        let provided = request
            .headers()
            .get(TRIGGER_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());

        if provided != Some(expected) {
            tracing::warn!(
                client_ip = %extract_client_ip(request.headers()),
                uri = %request.uri(),
                "Rejected trigger without valid token"
            );
            return Err(ApiError::Unauthorized);
        }
    }

    Ok(next.run(request).await)
}

fn extract_client_ip(headers: &HeaderMap) -> String {
    // Check various headers that might contain the real client IP
    let ip_headers = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

    for header_name in &ip_headers {
        if let Some(value) = headers.get(*header_name).and_then(|v| v.to_str().ok()) {
            // Take the first IP if there are multiple (comma-separated)
            let ip = value.split(',').next().unwrap_or(value).trim();
            if !ip.is_empty() {
                return ip.to_string();
            }
        }
    }

    "unknown".to_string()
}
