mod common;

use std::sync::Arc;

use admission_api::config::Config;
use admission_api::db::kv::NoopStore;
use axum::body::Body;
use axum_test::TestServer;
use http::header::COOKIE;
use http::{Request, StatusCode};
use tower::ServiceExt;

fn unconfigured_app() -> axum::Router {
    let (app, _state) =
        common::test_app_with_store(Config::default(), Arc::new(NoopStore::unconfigured()));
    app
}

#[tokio::test]
async fn enter_fails_open_when_store_unconfigured() {
    let config = Config::default();
    let today = common::today(&config);
    let server = TestServer::new(unconfigured_app()).unwrap();

    let resp = server.get("/enter").await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    assert_eq!(body["allowed"], true);
    assert_eq!(body["total"], 0);
    assert_eq!(body["concurrentUsers"], 0);
    assert!(body["warning"].is_string());
    assert!(body["sessionId"].is_string());

    // The day's entry is still consumed; no visit was counted.
    assert_eq!(resp.cookie("used_today").value(), today);
    assert!(resp.maybe_cookie("visited_date").is_none());
}

#[tokio::test]
async fn heartbeat_and_leave_surface_store_errors() {
    let server = TestServer::new(unconfigured_app()).unwrap();
    let cookie = common::cookie_header(&[("session_id", "abc")]);

    let resp = server
        .post("/heartbeat")
        .add_header(COOKIE, cookie.clone())
        .await;
    resp.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(resp.json::<serde_json::Value>()["code"], "STORE_UNAVAILABLE");

    let resp = server.post("/leave").add_header(COOKIE, cookie).await;
    resp.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    // Missing session is still a client error, not a store error.
    server.post("/heartbeat").await.assert_status_bad_request();
    // And leaving without a session needs no store at all.
    server.post("/leave").await.assert_status_ok();
}

#[tokio::test]
async fn health_reports_store_state() {
    let resp = unconfigured_app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "unavailable");

    let (app, _state, _store) = common::test_app(Config::default());
    let server = TestServer::new(app).unwrap();
    let body: serde_json::Value = server.get("/health").await.json();
    assert_eq!(body["store"], "ok");
}
