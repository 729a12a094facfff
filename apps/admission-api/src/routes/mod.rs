pub mod admission;
pub mod health;

use axum::Router;
use utoipa::OpenApi;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(admission::router())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        admission::enter,
        admission::heartbeat,
        admission::leave,
    ),
    components(
        schemas(
            crate::error::ApiErrorBody,
            health::HealthResponse,
            admission::EnterResponse,
            admission::HeartbeatResponse,
            admission::LeaveResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Admission", description = "Daily and concurrent admission control"),
    )
)]
pub struct ApiDoc;
