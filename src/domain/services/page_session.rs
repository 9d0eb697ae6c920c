// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{DriverError, DriverFactory, PageDriver};
use std::time::Duration;
use tracing::{debug, warn};

/// 页面会话
///
/// 一个请求独占的页面句柄，附带总超时预算和渲染稳定等待时间。
/// 调用方必须在所有退出路径上调用 `release`
pub struct PageSession {
    driver: Box<dyn PageDriver>,
    timeout: Duration,
    settle: Duration,
}

impl PageSession {
    pub fn new(driver: Box<dyn PageDriver>, timeout: Duration, settle: Duration) -> Self {
        Self {
            driver,
            timeout,
            settle,
        }
    }

    /// 通过工厂打开一个新页面
    pub async fn open(
        factory: &dyn DriverFactory,
        timeout: Duration,
        settle: Duration,
    ) -> Result<Self, DriverError> {
        let driver = factory.open().await?;
        debug!("Opened {} page session", factory.name());
        Ok(Self::new(driver, timeout, settle))
    }

    pub fn driver(&self) -> &dyn PageDriver {
        self.driver.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 渲染稳定等待
    pub async fn settle(&self) {
        self.driver.wait(self.settle).await;
    }

    /// 释放页面，关闭失败只记录日志
    pub async fn release(self) {
        if let Err(e) = self.driver.close().await {
            warn!("Failed to close page session: {}", e);
        }
    }
}
