// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task_record::{ExtractionResult, TaskRecord};
use crate::engines::traits::PageDriver;
use tracing::debug;

/// 结果汇总器
///
/// 按发现顺序收集段落记录。页面全文不会进入结构化结果
#[derive(Debug, Default)]
pub struct ResultAssembler {
    url: String,
    joined_clicked: bool,
    title_guess: String,
    sections_opened: u32,
    tasks: Vec<TaskRecord>,
}

impl ResultAssembler {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn set_joined(&mut self, joined: bool) {
        self.joined_clicked = joined;
    }

    pub fn set_title_guess(&mut self, title: String) {
        self.title_guess = title;
    }

    pub fn mark_opened(&mut self) {
        self.sections_opened += 1;
    }

    pub fn push(&mut self, record: TaskRecord) {
        self.tasks.push(record);
    }

    pub fn sections_opened(&self) -> u32 {
        self.sections_opened
    }

    pub fn finish(self) -> ExtractionResult {
        ExtractionResult {
            url: self.url,
            joined_clicked: self.joined_clicked,
            sections_opened: self.sections_opened,
            sections_found: self.tasks.len() as u32,
            title_guess: self.title_guess,
            tasks: self.tasks,
        }
    }
}

/// 猜测页面标题：第一个标题类元素的文本，失败时为空
pub async fn guess_title(driver: &dyn PageDriver) -> String {
    match driver.first_heading_text().await {
        Ok(Some(title)) => title.trim().to_string(),
        Ok(None) => String::new(),
        Err(e) => {
            debug!("Title guess failed: {}", e);
            String::new()
        }
    }
}
