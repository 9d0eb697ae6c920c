// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ExtractionSettings;
use crate::domain::services::extraction_service::ExtractionOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// 全文抽取查询参数
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct TextQueryDto {
    /// 目标页面
    pub url: String,

    /// 总超时（毫秒）
    #[validate(range(min = 5000, max = 180000))]
    pub timeout_ms: Option<u64>,

    /// 渲染稳定等待（毫秒）
    #[validate(range(min = 0, max = 30000))]
    pub settle_ms: Option<u64>,
}

impl TextQueryDto {
    pub fn options(&self, defaults: &ExtractionSettings) -> ExtractionOptions {
        ExtractionOptions {
            timeout: Duration::from_millis(self.timeout_ms.unwrap_or(defaults.default_timeout_ms)),
            settle: Duration::from_millis(self.settle_ms.unwrap_or(defaults.default_settle_ms)),
            max_tasks: defaults.default_max_tasks,
        }
    }
}

/// 结构化任务抽取查询参数
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct TasksQueryDto {
    pub url: String,

    #[validate(range(min = 5000, max = 180000))]
    pub timeout_ms: Option<u64>,

    #[validate(range(min = 0, max = 30000))]
    pub settle_ms: Option<u64>,

    /// 最多展开的段落数
    #[validate(range(min = 1, max = 100))]
    pub max_tasks: Option<u32>,
}

impl TasksQueryDto {
    pub fn options(&self, defaults: &ExtractionSettings) -> ExtractionOptions {
        ExtractionOptions {
            timeout: Duration::from_millis(self.timeout_ms.unwrap_or(defaults.default_timeout_ms)),
            settle: Duration::from_millis(self.settle_ms.unwrap_or(defaults.default_settle_ms)),
            max_tasks: self.max_tasks.unwrap_or(defaults.default_max_tasks),
        }
    }
}
