// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::DriverError;
use std::time::Duration;
use thiserror::Error;

/// 抽取流程对外暴露的错误类型
///
/// 流程内部的尽力而为步骤失败不会出现在这里，只会体现为空值
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// URL 不合法
    #[error("Invalid URL (http/https only): {0}")]
    InvalidUrl(String),

    /// 页面在预算时间内未完成初始渲染
    #[error("Upstream timed out after {}ms (page too slow or blocked)", .0.as_millis())]
    RenderTimeout(Duration),

    /// 未预料的错误
    #[error("{kind}: {message}")]
    Unexpected { kind: &'static str, message: String },
}

impl ExtractionError {
    /// 将驱动错误归类：超时视为渲染超时，其他视为未预料错误
    pub fn from_driver(err: DriverError, budget: Duration) -> Self {
        match err {
            DriverError::Timeout(_) => ExtractionError::RenderTimeout(budget),
            other => ExtractionError::Unexpected {
                kind: other.kind(),
                message: other.to_string(),
            },
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ExtractionError::RenderTimeout(_))
    }

    /// 指标标签
    pub fn label(&self) -> &'static str {
        match self {
            ExtractionError::InvalidUrl(_) => "invalid_url",
            ExtractionError::RenderTimeout(_) => "timeout",
            ExtractionError::Unexpected { .. } => "error",
        }
    }
}
