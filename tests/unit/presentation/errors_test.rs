// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::Value;
use std::time::Duration;
use taskreel::presentation::errors::AppError;
use taskreel::utils::errors::ExtractionError;

async fn body_of(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_render_timeout_response() {
    let (status, body) =
        body_of(ExtractionError::RenderTimeout(Duration::from_millis(120_000)).into()).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(
        body["detail"],
        "Upstream timed out after 120000ms (page too slow or blocked)"
    );
}

#[tokio::test]
async fn test_invalid_url_response() {
    let (status, body) =
        body_of(ExtractionError::InvalidUrl("mailto:someone".to_string()).into()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid URL (http/https only)");
}

#[tokio::test]
async fn test_unexpected_response_keeps_kind() {
    let (status, body) = body_of(
        ExtractionError::Unexpected {
            kind: "ScriptError",
            message: "Script error: Uncaught TypeError".to_string(),
        }
        .into(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "ScriptError: Script error: Uncaught TypeError");
}
