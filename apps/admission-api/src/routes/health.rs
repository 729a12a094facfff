use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// `ok` or `unavailable`. Admission fails open while unavailable.
    pub store: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = match state.kv.check().await {
        Ok(()) => "ok",
        Err(err) => {
            tracing::debug!(%err, "health check: store unavailable");
            "unavailable"
        }
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        store: store.to_string(),
    })
}
