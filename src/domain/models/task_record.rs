// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 段落标签
///
/// 形如 `Task N`（N ≥ 1），是查找、展开和定位段落内容的唯一锚点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLabel {
    number: u32,
    text: String,
}

impl SectionLabel {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            text: format!("Task {}", number),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// 单个任务段落的抽取结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// 段落序号，从 1 开始连续递增
    #[serde(rename = "task_number")]
    pub number: u32,
    /// 段落标签
    #[serde(rename = "task_label")]
    pub label: String,
    /// 第一行非空且不等于标签的内容，没有则为空
    #[serde(rename = "task_title")]
    pub title: String,
    /// 清理后的段落文本，可能为空
    pub content: String,
}

impl TaskRecord {
    /// 抽取失败时的空记录
    pub fn empty(label: &SectionLabel) -> Self {
        Self {
            number: label.number(),
            label: label.as_str().to_string(),
            title: String::new(),
            content: String::new(),
        }
    }
}

/// 结构化任务抽取结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub url: String,
    /// 是否点击了“加入”按钮
    pub joined_clicked: bool,
    /// 成功点击展开的段落数
    #[serde(rename = "tasks_opened")]
    pub sections_opened: u32,
    /// 输出的段落数，恒等于 `tasks.len()`
    #[serde(rename = "tasks_found")]
    pub sections_found: u32,
    /// 页面标题猜测，失败时为空
    pub title_guess: String,
    pub tasks: Vec<TaskRecord>,
}

/// 全文抽取结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextExtraction {
    pub url: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
}

impl TextExtraction {
    pub const EMPTY_NOTE: &'static str =
        "Visible text is empty (login required or rendering blocked).";

    pub fn new(url: impl Into<String>, text: String) -> Self {
        let note = text.is_empty().then(|| Self::EMPTY_NOTE.to_string());
        Self {
            url: url.into(),
            text,
            note,
        }
    }
}
