// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task_record::SectionLabel;
use crate::engines::traits::{DriverError, ElementHandle, PageDriver};
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

/// 元素匹配策略
#[async_trait]
pub trait ElementMatcher: Send + Sync {
    /// 策略名称
    fn name(&self) -> &'static str;

    /// 查找可见文本等于 `label` 的元素，按文档顺序返回
    async fn find(
        &self,
        driver: &dyn PageDriver,
        label: &str,
    ) -> Result<Vec<ElementHandle>, DriverError>;
}

/// 文本节点完全相等匹配
pub struct ExactTextMatcher;

#[async_trait]
impl ElementMatcher for ExactTextMatcher {
    fn name(&self) -> &'static str {
        "exact_text"
    }

    async fn find(
        &self,
        driver: &dyn PageDriver,
        label: &str,
    ) -> Result<Vec<ElementHandle>, DriverError> {
        driver.query_by_exact_text(label).await
    }
}

/// 整串字面量模式匹配，容忍首尾和中间空白差异
pub struct PatternMatcher;

impl PatternMatcher {
    /// 构造匹配整个标签的锚定模式，不做模糊匹配
    pub fn pattern_for(label: &str) -> Result<Regex, regex::Error> {
        let body = label
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+");
        Regex::new(&format!(r"^\s*{}\s*$", body))
    }
}

#[async_trait]
impl ElementMatcher for PatternMatcher {
    fn name(&self) -> &'static str {
        "pattern"
    }

    async fn find(
        &self,
        driver: &dyn PageDriver,
        label: &str,
    ) -> Result<Vec<ElementHandle>, DriverError> {
        let pattern =
            Self::pattern_for(label).map_err(|e| DriverError::Script(e.to_string()))?;
        driver.query_by_pattern(&pattern).await
    }
}

/// 展开结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// 找到并点击了控件（不代表段落已经展开）
    Clicked { strategy: &'static str },
    /// 所有策略都没有找到控件
    NotFound,
}

/// 段落展开器
///
/// 按顺序尝试匹配策略，第一个找到元素的策略胜出
pub struct SectionExpander {
    matchers: Vec<Box<dyn ElementMatcher>>,
}

impl Default for SectionExpander {
    fn default() -> Self {
        Self::new(vec![Box::new(ExactTextMatcher), Box::new(PatternMatcher)])
    }
}

impl SectionExpander {
    pub fn new(matchers: Vec<Box<dyn ElementMatcher>>) -> Self {
        Self { matchers }
    }

    pub async fn expand(&self, driver: &dyn PageDriver, label: &SectionLabel) -> ExpandOutcome {
        for matcher in &self.matchers {
            let found = match matcher.find(driver, label.as_str()).await {
                Ok(found) => found,
                Err(e) => {
                    debug!("{} lookup for {} failed: {}", matcher.name(), label, e);
                    continue;
                }
            };
            let Some(first) = found.first() else {
                continue;
            };

            // A found-but-unclickable control falls through to the next strategy.
            match driver.click(first).await {
                Ok(()) => {
                    debug!(
                        "Clicked {} via {} ({} candidates)",
                        label,
                        matcher.name(),
                        found.len()
                    );
                    return ExpandOutcome::Clicked {
                        strategy: matcher.name(),
                    };
                }
                Err(e) => debug!("{} click on {} failed: {}", matcher.name(), label, e),
            }
        }
        ExpandOutcome::NotFound
    }
}
