//! Admission routes: enter, heartbeat and leave.
//!
//! Client identity travels in cookies. Denials are ordinary 200 responses
//! carrying a reason code.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::admission::identity::cookie;
use crate::admission::{AdmissionEngine, ClientIdentity, Decision, Presence};
use crate::error::{ApiError, ApiErrorBody};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/enter", get(enter))
        .route("/heartbeat", post(heartbeat))
        .route("/leave", post(leave))
}

fn identity_from(jar: &CookieJar) -> ClientIdentity {
    let value = |name: &str| jar.get(name).map(|c| c.value().to_string());
    ClientIdentity {
        visited_date: value(cookie::VISITED_DATE),
        used_today: value(cookie::USED_TODAY),
        session_id: value(cookie::SESSION_ID),
    }
}

fn client_cookie(name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs))
        .same_site(SameSite::Lax)
        .http_only(false)
        .build()
}

fn write_identity(mut jar: CookieJar, identity: &ClientIdentity, max_age_secs: i64) -> CookieJar {
    let fields = [
        (cookie::VISITED_DATE, &identity.visited_date),
        (cookie::USED_TODAY, &identity.used_today),
        (cookie::SESSION_ID, &identity.session_id),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            jar = jar.add(client_cookie(name, value.clone(), max_age_secs));
        }
    }
    jar
}

// ---------------------------------------------------------------------------
// GET /enter
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnterResponse {
    pub allowed: bool,
    /// `ONCE_PER_DAY`, `CONCURRENCY_LIMIT` or `DAILY_LIMIT` when denied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Visitors counted today.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrent_users: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Present when admission control was bypassed because the store failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<Decision> for EnterResponse {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Granted(grant) => Self {
                allowed: true,
                total: Some(grant.total),
                concurrent_users: Some(grant.concurrent_users),
                session_id: Some(grant.session_id),
                warning: grant.warning,
                ..Default::default()
            },
            Decision::Denied(denial) => Self {
                allowed: false,
                reason: Some(denial.reason.code().to_string()),
                message: Some(denial.reason.message().to_string()),
                total: denial.total,
                concurrent_users: denial.concurrent_users,
                ..Default::default()
            },
        }
    }
}

#[utoipa::path(
    get,
    path = "/enter",
    tag = "Admission",
    responses(
        (status = 200, description = "Admission decision (granted or denied)", body = EnterResponse),
    ),
)]
pub async fn enter(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<EnterResponse>) {
    let identity = identity_from(&jar);
    let engine = AdmissionEngine::new(state.kv.as_ref(), &state.config);
    let decision = engine.attempt_enter(&identity, Utc::now()).await;

    let jar = match &decision {
        Decision::Granted(grant) => {
            write_identity(jar, &grant.identity, state.config.cookie_max_age_secs)
        }
        Decision::Denied(_) => jar,
    };
    (jar, Json(EnterResponse::from(decision)))
}

// ---------------------------------------------------------------------------
// POST /heartbeat
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct HeartbeatResponse {
    pub success: bool,
    /// Recorded activity time, epoch milliseconds.
    pub timestamp: i64,
}

#[utoipa::path(
    post,
    path = "/heartbeat",
    tag = "Admission",
    responses(
        (status = 200, description = "Session refreshed", body = HeartbeatResponse),
        (status = 400, description = "No session cookie", body = ApiErrorBody),
        (status = 503, description = "Session store unavailable", body = ApiErrorBody),
    ),
)]
pub async fn heartbeat(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<HeartbeatResponse>, ApiError> {
    let session_id = jar
        .get(cookie::SESSION_ID)
        .map(|c| c.value().to_string())
        .unwrap_or_default();

    let timestamp = Presence::new(state.kv.as_ref(), &state.config)
        .beat(&session_id, Utc::now())
        .await?;

    Ok(Json(HeartbeatResponse {
        success: true,
        timestamp,
    }))
}

// ---------------------------------------------------------------------------
// POST /leave
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveResponse {
    pub success: bool,
}

#[utoipa::path(
    post,
    path = "/leave",
    tag = "Admission",
    responses(
        (status = 200, description = "Session released (or nothing to release)", body = LeaveResponse),
        (status = 503, description = "Session store unavailable", body = ApiErrorBody),
    ),
)]
pub async fn leave(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<LeaveResponse>, ApiError> {
    let session_id = jar
        .get(cookie::SESSION_ID)
        .map(|c| c.value().to_string())
        .unwrap_or_default();

    Presence::new(state.kv.as_ref(), &state.config)
        .leave(&session_id)
        .await?;

    Ok(Json(LeaveResponse { success: true }))
}
