// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::content_locator::ContentLocator;
use crate::engines::traits::{DriverError, PageDriver};
use crate::utils::text::{clean_text, title_from};
use tracing::debug;

/// 单个段落抽取出的内容
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedBlock {
    pub title: String,
    pub content: String,
}

/// 段落内容抽取器
///
/// 收集可见文本包含标签的容器，交给 `ContentLocator` 选出一个，再清理文本并取标题
pub struct BlockExtractor {
    kinds: Vec<String>,
    fallback_kinds: Vec<String>,
    locator: Box<dyn ContentLocator>,
}

impl BlockExtractor {
    pub fn new(
        kinds: Vec<String>,
        fallback_kinds: Vec<String>,
        locator: Box<dyn ContentLocator>,
    ) -> Self {
        Self {
            kinds,
            fallback_kinds,
            locator,
        }
    }

    pub async fn extract(
        &self,
        driver: &dyn PageDriver,
        label: &str,
    ) -> Result<ExtractedBlock, DriverError> {
        let candidates = driver
            .collect_blocks(label, &self.kinds, &self.fallback_kinds)
            .await?;

        let Some(chosen) = self.locator.select(label, &candidates) else {
            debug!("No container holds {}", label);
            return Ok(ExtractedBlock::default());
        };
        debug!(
            "{} picked <{}> at depth {} ({} chars) from {} candidates",
            self.locator.name(),
            chosen.tag,
            chosen.depth,
            chosen.text_len(),
            candidates.len()
        );

        let content = clean_text(&chosen.text);
        let title = title_from(&content, label);
        Ok(ExtractedBlock { title, content })
    }
}
