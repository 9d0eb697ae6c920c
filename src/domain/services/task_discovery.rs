// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task_record::{SectionLabel, TaskRecord};
use crate::domain::services::block_extractor::BlockExtractor;
use crate::domain::services::page_session::PageSession;
use crate::domain::services::readiness::ContentReadinessWaiter;
use crate::domain::services::result_assembler::ResultAssembler;
use crate::domain::services::section_expander::{ExpandOutcome, SectionExpander};
use tracing::{debug, info, warn};

/// 循环结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStop {
    /// 第 n 个段落找不到控件，列表到此结束
    NoMatch(u32),
    /// 达到上限
    Ceiling,
}

/// 任务发现循环
///
/// 页面不提供段落总数，只能从 1 开始连续探测，第一次找不到即停止
pub struct TaskDiscoveryLoop {
    expander: SectionExpander,
    content_waiter: ContentReadinessWaiter,
    extractor: BlockExtractor,
    max_tasks: u32,
}

impl TaskDiscoveryLoop {
    pub fn new(
        expander: SectionExpander,
        content_waiter: ContentReadinessWaiter,
        extractor: BlockExtractor,
        max_tasks: u32,
    ) -> Self {
        Self {
            expander,
            content_waiter,
            extractor,
            max_tasks,
        }
    }

    /// 执行发现循环，把每个展开的段落写入 `assembler`
    pub async fn run(&self, session: &PageSession, assembler: &mut ResultAssembler) -> DiscoveryStop {
        let driver = session.driver();

        for number in 1..=self.max_tasks {
            let label = SectionLabel::new(number);
            let before = text_len(session).await;

            let strategy = match self.expander.expand(driver, &label).await {
                ExpandOutcome::Clicked { strategy } => strategy,
                ExpandOutcome::NotFound => {
                    info!("No control for {}, discovery finished", label);
                    return DiscoveryStop::NoMatch(number);
                }
            };
            assembler.mark_opened();

            let wait = self.content_waiter.wait(session, label.as_str()).await;

            // A click on an already-open panel, or on a decoy with the same text,
            // leaves the page unchanged. The record is still emitted.
            if let (Some(before), Some(after)) = (before, text_len(session).await) {
                if after <= before {
                    warn!(
                        "Clicking {} via {} did not grow the page ({} -> {} chars); section may be collapsed",
                        label, strategy, before, after
                    );
                }
            }

            let record = match self.extractor.extract(driver, label.as_str()).await {
                Ok(block) => TaskRecord {
                    number,
                    label: label.as_str().to_string(),
                    title: block.title,
                    content: block.content,
                },
                Err(e) => {
                    warn!("Extraction of {} failed: {}", label, e);
                    TaskRecord::empty(&label)
                }
            };
            debug!(
                "{} extracted: {} chars, content wait {:?}",
                label,
                record.content.len(),
                wait
            );
            assembler.push(record);
        }

        info!("Reached max_tasks = {}", self.max_tasks);
        DiscoveryStop::Ceiling
    }
}

async fn text_len(session: &PageSession) -> Option<usize> {
    session
        .driver()
        .visible_text()
        .await
        .ok()
        .map(|t| t.chars().count())
}
