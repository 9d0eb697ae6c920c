// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{service_for, AccordionPage, FakeDriverFactory, PageState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::{Extension, Router};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;
use taskreel::presentation::routes;
use tower::util::ServiceExt;

const URL: &str = "https://tryhackme.com/room/defensivesecurityintro";

fn app_for(factory: FakeDriverFactory) -> Router {
    let service = Arc::new(service_for(Arc::new(factory)));
    routes::routes().layer(Extension(service))
}

fn server_for(page: &AccordionPage) -> TestServer {
    TestServer::new(app_for(FakeDriverFactory::new(page.clone()))).unwrap()
}

#[tokio::test]
async fn test_root_describes_usage() {
    let server = server_for(&AccordionPage::default());

    let response = server.get("/").await;

    response.assert_status_ok();
    response.assert_json(&json!({ "ok": true, "usage": "/extract/tasks?url=..." }));
}

#[tokio::test]
async fn test_health_and_version() {
    let server = server_for(&AccordionPage::default());

    let health = server.get("/health").await;
    health.assert_status_ok();
    health.assert_text("OK");

    let version = server.get("/v1/version").await;
    version.assert_status_ok();
    version.assert_text(env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_extract_tasks_wire_format() {
    let page = AccordionPage::with_tasks(2);
    let server = server_for(&page);

    let response = server
        .get("/extract/tasks")
        .add_query_param("url", URL)
        .add_query_param("settle_ms", 0)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["url"], URL);
    assert_eq!(body["joined_clicked"], false);
    assert_eq!(body["tasks_opened"], 2);
    assert_eq!(body["tasks_found"], 2);
    assert_eq!(body["title_guess"], "Defensive Security Intro");
    assert_eq!(body["tasks"][0]["task_number"], 1);
    assert_eq!(body["tasks"][0]["task_label"], "Task 1");
    assert_eq!(body["tasks"][0]["task_title"], "Step 1 title");
    assert!(body["tasks"][1]["content"]
        .as_str()
        .unwrap()
        .starts_with("Task 2\nStep 2 title"));
    assert!(page.state().closed);
}

#[tokio::test]
async fn test_extract_tasks_respects_max_tasks() {
    let page = AccordionPage::with_tasks(4);
    let server = server_for(&page);

    let response = server
        .get("/extract/tasks")
        .add_query_param("url", URL)
        .add_query_param("settle_ms", 0)
        .add_query_param("max_tasks", 1)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["tasks_found"], 1);
    assert_eq!(body["tasks"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_non_http_url_is_rejected() {
    let page = AccordionPage::with_tasks(1);
    let server = server_for(&page);

    let response = server
        .get("/extract/tasks")
        .add_query_param("url", "ftp://example.com/room")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "detail": "Invalid URL (http/https only)" }));
    assert!(page.state().navigated.is_empty());
}

#[tokio::test]
async fn test_out_of_range_params_are_rejected() {
    let server = server_for(&AccordionPage::with_tasks(1));

    for (key, value) in [("max_tasks", "0"), ("timeout_ms", "100"), ("settle_ms", "99999")] {
        let response = server
            .get("/extract/tasks")
            .add_query_param("url", URL)
            .add_query_param(key, value)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("Validation error"), "{}", detail);
        assert!(detail.contains(key), "{}", detail);
    }
}

#[tokio::test]
async fn test_malformed_query_is_json_400() {
    let page = AccordionPage::with_tasks(1);
    let server = server_for(&page);

    let missing_url = server.get("/extract").await;
    missing_url.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = missing_url.json();
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Invalid query"), "{}", detail);
    assert!(detail.contains("url"), "{}", detail);

    let bad_number = server
        .get("/extract/tasks")
        .add_query_param("url", URL)
        .add_query_param("max_tasks", "many")
        .await;
    bad_number.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = bad_number.json();
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Invalid query"));

    assert!(page.state().navigated.is_empty());
}

#[tokio::test]
async fn test_browser_failure_is_500() {
    let server = TestServer::new(app_for(FakeDriverFactory::failing())).unwrap();

    let response = server
        .get("/extract")
        .add_query_param("url", URL)
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["detail"], "BrowserError: Browser error: browser crashed");
}

#[tokio::test]
async fn test_extract_text() {
    let page = AccordionPage::with_tasks(1);
    let server = server_for(&page);

    let response = server
        .get("/extract")
        .add_query_param("url", URL)
        .add_query_param("settle_ms", 0)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["url"], URL);
    assert!(body["text"].as_str().unwrap().contains("Task 1"));
    assert!(body.get("note").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_render_timeout_is_504() {
    let page = AccordionPage::new(PageState {
        never_ready: true,
        ..Default::default()
    });
    let app = app_for(FakeDriverFactory::new(page.clone()));

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/extract/tasks?url={}&timeout_ms=5000&settle_ms=0",
                    URL
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body["detail"],
        "Upstream timed out after 5000ms (page too slow or blocked)"
    );
    assert!(page.state().closed);
}
