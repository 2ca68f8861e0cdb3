// handlers/health.rs - GET /health

use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub store: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Liveness plus a store round trip; 503 when the store is unreachable.
pub async fn health(State(state): State<AppState>) -> ApiResult<Health> {
    if let Err(e) = state.store.ping().await {
        tracing::error!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("Store unavailable"));
    }

    Ok(ApiResponse::success(Health {
        status: "ok",
        store: "ok",
        timestamp: Utc::now(),
    }))
}
