// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 持久化登录会话的加载
//!
//! 读取 Playwright 格式的 storage state 文件（`cookies` 与 `origins[].localStorage`），
//! 转换为可以在新标签页上直接应用的 CDP 参数。

use chromiumoxide::cdp::browser_protocol::network::{CookieParam, CookieSameSite, TimeSinceEpoch};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// 会话文件错误
#[derive(Error, Debug)]
pub enum StorageStateError {
    #[error("Failed to read storage state: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed storage state: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// 持久化的浏览器会话
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageState {
    #[serde(default)]
    pub cookies: Vec<StoredCookie>,
    #[serde(default)]
    pub origins: Vec<StoredOrigin>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    /// Unix 时间戳（秒），-1 表示会话 cookie
    #[serde(default)]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: Option<String>,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoredOrigin {
    pub origin: String,
    #[serde(rename = "localStorage", default)]
    pub local_storage: Vec<StorageEntry>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct StorageEntry {
    pub name: String,
    pub value: String,
}

impl StorageState {
    /// 从文件加载会话
    ///
    /// # 返回值
    ///
    /// * `Ok(None)` - 文件不存在
    /// * `Ok(Some(state))` - 加载成功
    /// * `Err(StorageStateError)` - 文件无法读取或格式错误
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>, StorageStateError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        let state = serde_json::from_str(&raw)?;
        Ok(Some(state))
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.origins.iter().all(|o| o.local_storage.is_empty())
    }

    /// 转换为 CDP `Network.setCookies` 参数
    pub fn cookie_params(&self) -> Vec<CookieParam> {
        self.cookies
            .iter()
            .map(|c| {
                let mut param = CookieParam::new(c.name.clone(), c.value.clone());
                param.domain = Some(c.domain.clone());
                param.path = Some(c.path.clone());
                param.secure = Some(c.secure);
                param.http_only = Some(c.http_only);
                // Session cookies are stored with a negative expiry
                param.expires = c
                    .expires
                    .filter(|e| *e > 0.0)
                    .map(TimeSinceEpoch::new);
                param.same_site = c.same_site.as_deref().and_then(parse_same_site);
                param
            })
            .collect()
    }

    /// 生成在每个新文档加载前写入 localStorage 的脚本
    ///
    /// 脚本按 origin 过滤，只在匹配的源上写入对应条目
    pub fn local_storage_script(&self) -> Option<String> {
        let origins: Vec<_> = self
            .origins
            .iter()
            .filter(|o| !o.local_storage.is_empty())
            .map(|o| serde_json::json!({ "origin": o.origin, "entries": o.local_storage }))
            .collect();
        if origins.is_empty() {
            return None;
        }

        let payload = serde_json::Value::Array(origins).to_string();
        Some(format!(
            "(() => {{ const origins = {payload}; \
             for (const o of origins) {{ \
               if (window.location.origin !== o.origin) continue; \
               for (const e of o.entries) {{ try {{ window.localStorage.setItem(e.name, e.value); }} catch (_) {{}} }} \
             }} }})();"
        ))
    }
}

fn parse_same_site(raw: &str) -> Option<CookieSameSite> {
    match raw.to_ascii_lowercase().as_str() {
        "strict" => Some(CookieSameSite::Strict),
        "lax" => Some(CookieSameSite::Lax),
        "none" => Some(CookieSameSite::None),
        _ => None,
    }
}
