// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use validator::ValidationErrors;

use crate::utils::errors::ExtractionError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub enum AppError {
    Extraction(ExtractionError),
    Validation(ValidationErrors),
    /// 查询串缺少字段或无法解析
    Query(QueryRejection),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Query(rejection) => rejection.status(),
            AppError::Extraction(ExtractionError::InvalidUrl(_)) => StatusCode::BAD_REQUEST,
            AppError::Extraction(ExtractionError::RenderTimeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Extraction(ExtractionError::Unexpected { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn detail(&self) -> String {
        match self {
            AppError::Validation(errors) => format!("Validation error: {}", errors),
            AppError::Query(rejection) => format!("Invalid query: {}", rejection.body_text()),
            AppError::Extraction(ExtractionError::InvalidUrl(_)) => {
                "Invalid URL (http/https only)".to_string()
            }
            AppError::Extraction(e) => e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "detail": self.detail() }));
        (self.status(), body).into_response()
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        Self::Extraction(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        Self::Validation(err)
    }
}

impl From<QueryRejection> for AppError {
    fn from(err: QueryRejection) -> Self {
        Self::Query(err)
    }
}
