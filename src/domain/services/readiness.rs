// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 基于可见文本的就绪等待
//!
//! 单页应用的 load 事件不代表内容已渲染，而第三方脚本让网络永远不会空闲，
//! 因此两个等待器都轮询页面可见文本并对其求值。

use crate::domain::services::page_session::PageSession;
use crate::utils::errors::ExtractionError;
use std::time::Duration;
use tracing::{debug, warn};

/// 页面初始就绪等待器
///
/// 可见文本包含任一导航关键词且长度超过阈值时视为就绪；超时是致命错误
#[derive(Debug, Clone)]
pub struct PageReadinessWaiter {
    keywords: Vec<String>,
    min_text_len: usize,
}

impl PageReadinessWaiter {
    /// # 参数
    ///
    /// * `keywords` - 导航关键词，为空时只检查长度
    /// * `min_text_len` - 可见文本长度下限（不含）
    pub fn new(keywords: Vec<String>, min_text_len: usize) -> Self {
        Self {
            keywords,
            min_text_len,
        }
    }

    pub fn is_ready(&self, text: &str) -> bool {
        let has_keyword = self.keywords.is_empty() || self.keywords.iter().any(|k| text.contains(k));
        has_keyword && text.chars().count() > self.min_text_len
    }

    /// 等待页面就绪，超时返回 `RenderTimeout`
    pub async fn wait(&self, session: &PageSession) -> Result<(), ExtractionError> {
        let predicate = |text: &str| self.is_ready(text);
        session
            .driver()
            .wait_for_predicate(&predicate, session.timeout())
            .await
            .map_err(|e| ExtractionError::from_driver(e, session.timeout()))?;
        debug!("Page reached initial readiness");
        Ok(())
    }
}

/// 段落内容等待结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentWait {
    Ready,
    TimedOut,
}

/// 段落内容就绪等待器
///
/// 超时可以容忍：提示语只是对页面的猜测，内容可能已经存在
#[derive(Debug, Clone)]
pub struct ContentReadinessWaiter {
    sentinels: Vec<String>,
    min_text_len: usize,
    budget: Duration,
}

impl ContentReadinessWaiter {
    /// # 参数
    ///
    /// * `sentinels` - 段落展开后常见的提示语
    /// * `min_text_len` - 可见文本长度下限（不含）
    /// * `budget` - 单个段落的等待上限，实际取它与会话超时的较小值
    pub fn new(sentinels: Vec<String>, min_text_len: usize, budget: Duration) -> Self {
        Self {
            sentinels,
            min_text_len,
            budget,
        }
    }

    pub fn is_ready(&self, text: &str, label: &str) -> bool {
        if !text.contains(label) {
            return false;
        }
        self.sentinels.iter().any(|s| text.contains(s.as_str()))
            || text.chars().count() > self.min_text_len
    }

    /// 等待段落内容出现，随后执行渲染稳定等待
    pub async fn wait(&self, session: &PageSession, label: &str) -> ContentWait {
        let budget = self.budget.min(session.timeout());
        let predicate = |text: &str| self.is_ready(text, label);

        let outcome = match session.driver().wait_for_predicate(&predicate, budget).await {
            Ok(()) => ContentWait::Ready,
            Err(e) if e.is_timeout() => {
                debug!("Content for {} not confirmed within {:?}, proceeding", label, budget);
                ContentWait::TimedOut
            }
            Err(e) => {
                warn!("Content wait for {} failed: {}", label, e);
                ContentWait::TimedOut
            }
        };

        session.settle().await;
        outcome
    }
}
