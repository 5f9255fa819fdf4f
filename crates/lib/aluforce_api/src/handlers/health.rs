//! Liveness probe.

use axum::Json;
use axum::extract::State;
use tracing::warn;

use crate::AppState;
use crate::models::HealthResponse;

/// `GET /api/health`: always 200; reports whether the database answers.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, database) = match state.store.ping().await {
        Ok(()) => ("ok", "up"),
        Err(e) => {
            warn!(error = %e, "health check: database ping failed");
            ("degraded", "down")
        }
    };
    Json(HealthResponse {
        status: status.into(),
        database: database.into(),
        version: aluforce_core::version().into(),
    })
}
