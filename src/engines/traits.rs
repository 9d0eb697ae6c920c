// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// 轮询页面状态的默认间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 驱动错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 等待超时
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    /// 浏览器或 CDP 连接错误
    #[error("Browser error: {0}")]
    Browser(String),
    /// 页面脚本执行或结果解析失败
    #[error("Script error: {0}")]
    Script(String),
    /// 元素句柄已失效（元素被移除或重新渲染）
    #[error("Element is gone: {0}")]
    StaleElement(String),
    /// 页面已关闭
    #[error("Page already closed")]
    Closed,
}

impl DriverError {
    /// 错误类别名称，用于对外暴露的通用错误信息
    pub fn kind(&self) -> &'static str {
        match self {
            DriverError::Timeout(_) => "Timeout",
            DriverError::Browser(_) => "BrowserError",
            DriverError::Script(_) => "ScriptError",
            DriverError::StaleElement(_) => "StaleElement",
            DriverError::Closed => "PageClosed",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout(_))
    }
}

/// 导航完成的判定时机
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// 等待 load 事件
    Load,
    /// 仅等待 DOM 解析完成，不等待子资源
    DomContentLoaded,
}

/// 页面元素句柄
///
/// 对调用方不透明，仅能交还给产生它的驱动使用
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// 包含某段文本的候选容器
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CandidateBlock {
    /// 元素标签名（小写）
    pub tag: String,
    /// ARIA role 属性
    #[serde(default)]
    pub role: Option<String>,
    /// 在 DOM 中的深度，body 为 0
    pub depth: u32,
    /// 渲染后的可见文本
    pub text: String,
}

impl CandidateBlock {
    /// 可见文本长度（按字符计）
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// 页面可见文本上的判定函数
pub type TextPredicate<'a> = &'a (dyn Fn(&str) -> bool + Send + Sync);

/// 页面驱动特质
///
/// 抽取核心只通过该特质操作页面，不依赖具体的浏览器实现
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 导航到指定 URL
    async fn navigate(
        &self,
        url: &str,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    /// 读取 body 的可见文本（innerText）
    async fn visible_text(&self) -> Result<String, DriverError>;

    /// 查找自身文本节点与 `text` 完全相同的元素，按文档顺序返回
    async fn query_by_exact_text(&self, text: &str) -> Result<Vec<ElementHandle>, DriverError>;

    /// 查找可见文本整体匹配 `pattern` 的最内层元素，按文档顺序返回
    async fn query_by_pattern(&self, pattern: &Regex) -> Result<Vec<ElementHandle>, DriverError>;

    /// 点击元素
    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError>;

    /// 收集可见文本包含 `needle` 的容器
    ///
    /// 先在 `kinds` 中查找，若没有任何匹配则退回到 `fallback_kinds`
    async fn collect_blocks(
        &self,
        needle: &str,
        kinds: &[String],
        fallback_kinds: &[String],
    ) -> Result<Vec<CandidateBlock>, DriverError>;

    /// 第一个标题类元素的文本，没有则返回 `None`
    async fn first_heading_text(&self) -> Result<Option<String>, DriverError>;

    /// 释放页面资源
    async fn close(&self) -> Result<(), DriverError>;

    /// 无条件等待
    async fn wait(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }

    /// 轮询间隔
    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }

    /// 轮询可见文本，直到 `predicate` 成立或超时
    async fn wait_for_predicate(
        &self,
        predicate: TextPredicate<'_>,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            // A failed read counts as "not ready yet"; the page may be mid-navigation.
            match self.visible_text().await {
                Ok(text) if predicate(&text) => return Ok(()),
                Ok(_) => {}
                Err(DriverError::Closed) => return Err(DriverError::Closed),
                Err(e) => tracing::trace!("visible text read failed while polling: {}", e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(DriverError::Timeout(timeout));
            }
            tokio::time::sleep(self.poll_interval().min(deadline - now)).await;
        }
    }
}

/// 页面驱动工厂
///
/// 每个请求通过工厂获得一个独占的页面
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageDriver>, DriverError>;

    /// 工厂名称
    fn name(&self) -> &'static str;
}
