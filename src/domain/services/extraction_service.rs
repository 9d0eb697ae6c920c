// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ExtractionSettings;
use crate::domain::models::task_record::{ExtractionResult, TextExtraction};
use crate::domain::services::block_extractor::BlockExtractor;
use crate::domain::services::content_locator::{locator_by_name, LargestText};
use crate::domain::services::page_session::PageSession;
use crate::domain::services::readiness::{ContentReadinessWaiter, PageReadinessWaiter};
use crate::domain::services::result_assembler::{guess_title, ResultAssembler};
use crate::domain::services::section_expander::SectionExpander;
use crate::domain::services::session_joiner::SessionJoiner;
use crate::domain::services::task_discovery::TaskDiscoveryLoop;
use crate::engines::traits::{DriverFactory, WaitUntil};
use crate::engines::validators::validate_url;
use crate::infrastructure::metrics;
use crate::utils::errors::ExtractionError;
use crate::utils::text::clean_text;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// 单次请求的参数
#[derive(Debug, Clone, Copy)]
pub struct ExtractionOptions {
    /// 总超时预算
    pub timeout: Duration,
    /// 渲染稳定等待
    pub settle: Duration,
    /// 最多展开的段落数
    pub max_tasks: u32,
}

/// 抽取服务
///
/// 负责一次请求的完整流程：打开独占页面、导航、等待就绪、加入、发现段落、汇总，
/// 并保证页面在任何退出路径上都被释放
pub struct ExtractionService {
    factory: Arc<dyn DriverFactory>,
    settings: ExtractionSettings,
}

impl ExtractionService {
    pub fn new(factory: Arc<dyn DriverFactory>, settings: ExtractionSettings) -> Self {
        if locator_by_name(&settings.locator).is_none() {
            warn!(
                "Unknown locator {:?}, falling back to largest text",
                settings.locator
            );
        }
        Self { factory, settings }
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// 结构化任务抽取
    pub async fn extract_tasks(
        &self,
        url: &str,
        options: ExtractionOptions,
    ) -> Result<ExtractionResult, ExtractionError> {
        let span = info_span!("extract_tasks", request_id = %Uuid::new_v4(), url = %url);
        let started = Instant::now();

        let outcome: Result<ExtractionResult, ExtractionError> = async {
            validate_url(url)?;
            let session = self.open_session(&options).await?;
            let outcome = self.run_tasks(&session, url, &options).await;
            session.release().await;
            outcome
        }
        .instrument(span)
        .await;

        match &outcome {
            Ok(result) => {
                info!(
                    "Extracted {} tasks from {} in {:?}",
                    result.sections_found,
                    url,
                    started.elapsed()
                );
                metrics::record_sections_opened(result.sections_opened);
                metrics::record_extraction("tasks", "ok", started.elapsed());
            }
            Err(e) => {
                warn!("Task extraction for {} failed: {}", url, e);
                metrics::record_extraction("tasks", e.label(), started.elapsed());
            }
        }
        outcome
    }

    /// 全文抽取
    pub async fn extract_text(
        &self,
        url: &str,
        options: ExtractionOptions,
    ) -> Result<TextExtraction, ExtractionError> {
        let span = info_span!("extract_text", request_id = %Uuid::new_v4(), url = %url);
        let started = Instant::now();

        let outcome: Result<TextExtraction, ExtractionError> = async {
            validate_url(url)?;
            let session = self.open_session(&options).await?;
            let outcome = self.run_text(&session, url).await;
            session.release().await;
            outcome
        }
        .instrument(span)
        .await;

        let label = match &outcome {
            Ok(_) => "ok",
            Err(e) => e.label(),
        };
        metrics::record_extraction("text", label, started.elapsed());
        outcome
    }

    async fn open_session(&self, options: &ExtractionOptions) -> Result<PageSession, ExtractionError> {
        PageSession::open(self.factory.as_ref(), options.timeout, options.settle)
            .await
            .map_err(|e| ExtractionError::from_driver(e, options.timeout))
    }

    /// 导航并等待页面就绪，超时是致命错误
    async fn load(
        &self,
        session: &PageSession,
        url: &str,
        readiness: &PageReadinessWaiter,
    ) -> Result<(), ExtractionError> {
        session
            .driver()
            .navigate(url, WaitUntil::DomContentLoaded, session.timeout())
            .await
            .map_err(|e| ExtractionError::from_driver(e, session.timeout()))?;
        readiness.wait(session).await?;
        session.settle().await;
        Ok(())
    }

    async fn run_tasks(
        &self,
        session: &PageSession,
        url: &str,
        options: &ExtractionOptions,
    ) -> Result<ExtractionResult, ExtractionError> {
        let readiness = PageReadinessWaiter::new(
            self.settings.ready_keywords.clone(),
            self.settings.ready_min_text_len,
        );
        self.load(session, url, &readiness).await?;

        let mut assembler = ResultAssembler::new(url);

        let joiner = SessionJoiner::new(self.settings.join_labels.clone(), self.settings.join_settle());
        assembler.set_joined(joiner.join(session.driver()).await);
        assembler.set_title_guess(guess_title(session.driver()).await);

        let discovery = self.discovery_loop(options.max_tasks);
        let stop = discovery.run(session, &mut assembler).await;
        info!(
            "Discovery stopped ({:?}) after opening {} sections",
            stop,
            assembler.sections_opened()
        );

        Ok(assembler.finish())
    }

    async fn run_text(&self, session: &PageSession, url: &str) -> Result<TextExtraction, ExtractionError> {
        let readiness = PageReadinessWaiter::new(Vec::new(), self.settings.text_min_text_len);
        self.load(session, url, &readiness).await?;

        let raw = session
            .driver()
            .visible_text()
            .await
            .map_err(|e| ExtractionError::from_driver(e, session.timeout()))?;
        Ok(TextExtraction::new(url, clean_text(&raw)))
    }

    fn discovery_loop(&self, max_tasks: u32) -> TaskDiscoveryLoop {
        let locator = locator_by_name(&self.settings.locator).unwrap_or_else(|| Box::new(LargestText));
        let extractor = BlockExtractor::new(
            self.settings.container_kinds.clone(),
            self.settings.fallback_container_kinds.clone(),
            locator,
        );
        let content_waiter = ContentReadinessWaiter::new(
            self.settings.content_sentinels.clone(),
            self.settings.content_min_text_len,
            Duration::from_millis(self.settings.content_wait_ms),
        );
        TaskDiscoveryLoop::new(SectionExpander::default(), content_waiter, extractor, max_tasks)
    }
}
