// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{rejection::QueryRejection, Query},
    Extension, Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::application::dto::extract_request::{TasksQueryDto, TextQueryDto};
use crate::domain::models::task_record::{ExtractionResult, TextExtraction};
use crate::domain::services::extraction_service::ExtractionService;
use crate::presentation::errors::AppError;

/// 根路径，返回用法提示
pub async fn root() -> Json<Value> {
    Json(json!({ "ok": true, "usage": "/extract/tasks?url=..." }))
}

/// 全文抽取
pub async fn extract_text(
    Extension(service): Extension<Arc<ExtractionService>>,
    query: Result<Query<TextQueryDto>, QueryRejection>,
) -> Result<Json<TextExtraction>, AppError> {
    let Query(query) = query?;
    query.validate()?;
    info!("Text extraction requested for {}", query.url);

    let options = query.options(service.settings());
    let result = service.extract_text(&query.url, options).await?;
    Ok(Json(result))
}

/// 结构化任务抽取
pub async fn extract_tasks(
    Extension(service): Extension<Arc<ExtractionService>>,
    query: Result<Query<TasksQueryDto>, QueryRejection>,
) -> Result<Json<ExtractionResult>, AppError> {
    let Query(query) = query?;
    query.validate()?;
    info!("Task extraction requested for {}", query.url);

    let options = query.options(service.settings());
    let result = service.extract_tasks(&query.url, options).await?;
    Ok(Json(result))
}
