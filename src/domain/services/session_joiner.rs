// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::PageDriver;
use std::time::Duration;
use tracing::{debug, info};

/// “加入”按钮点击器
///
/// 尽力而为：按钮不存在（已加入或页面没有该功能）是正常情况，
/// 任何失败都不会向上传播
#[derive(Debug, Clone)]
pub struct SessionJoiner {
    labels: Vec<String>,
    settle: Duration,
}

impl SessionJoiner {
    pub fn new(labels: Vec<String>, settle: Duration) -> Self {
        Self { labels, settle }
    }

    /// 依次尝试候选文本，点击第一个存在的按钮
    ///
    /// # 返回值
    ///
    /// 是否成功点击了某个按钮
    pub async fn join(&self, driver: &dyn PageDriver) -> bool {
        for label in &self.labels {
            let found = match driver.query_by_exact_text(label).await {
                Ok(found) => found,
                Err(e) => {
                    debug!("Join lookup for {:?} failed: {}", label, e);
                    continue;
                }
            };
            let Some(first) = found.first() else {
                continue;
            };

            match driver.click(first).await {
                Ok(()) => {
                    info!("Clicked join affordance {:?}", label);
                    driver.wait(self.settle).await;
                    return true;
                }
                Err(e) => debug!("Join click on {:?} failed: {}", label, e),
            }
        }
        false
    }
}
