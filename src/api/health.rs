use axum::{extract::State, http::StatusCode, Json};
use tracing::{error, info};

use crate::api::AppState;
use crate::health::HealthStatus;

pub async fn health(
    State(state): State<AppState>,
) -> Result<Json<HealthStatus>, (StatusCode, Json<HealthStatus>)> {
    let health_status = state.health_checker.check_health().await;

    // Return 503 if any component is unhealthy
    if health_status.is_healthy() {
        Ok(Json(health_status))
    } else {
        error!("Health check failed - service unhealthy");
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(health_status)))
    }
}

/// Readiness probe - checks if the storage backend can serve traffic
pub async fn readiness(
    state: State<AppState>,
) -> Result<Json<HealthStatus>, (StatusCode, Json<HealthStatus>)> {
    let result = health(state).await;
    if result.is_ok() {
        info!("Readiness check passed");
    }
    result
}

/// Liveness probe - the process is up and serving
pub async fn liveness() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "payment-service",
    }))
}
