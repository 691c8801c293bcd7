// tests/metrics.rs
use std::sync::Arc;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

mod common;

use common::{offline_researcher, post_json};
use company_research_assistant::llm::StaticClient;
use company_research_assistant::{app_from_state, AppState};

#[tokio::test]
async fn metrics_endpoint_contains_research_and_llm_series() {
    let app = app_from_state(AppState::new(
        offline_researcher(),
        Arc::new(StaticClient::new("EXECUTIVE SUMMARY:\nok")),
    ));

    post_json(&app, "/api/research", r#"{"company":"Acme","fetch_news":false}"#).await;
    post_json(
        &app,
        "/api/generate-account-plan",
        r#"{"company":"Acme","research_data":{}}"#,
    )
    .await;

    let resp = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "research_requests_total",
        "llm_requests_total",
        "llm_duration_ms",
    ] {
        assert!(text.contains(needle), "missing {needle} in:\n{text}");
    }
}
