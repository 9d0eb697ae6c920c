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

use config::{Config, ConfigError, Environment, File, Map};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含服务器、浏览器、抽取流程和指标导出的所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 抽取流程配置
    pub extraction: ExtractionSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 浏览器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// 远程 Chrome DevTools 地址，设置后不再本地启动浏览器
    pub remote_debugging_url: Option<String>,
    /// Chrome 可执行文件路径
    pub chrome_executable: Option<String>,
    /// 是否无头运行
    pub headless: bool,
    /// 持久化登录会话文件路径
    pub storage_state_path: String,
    /// 单个 CDP 请求超时时间（秒）
    pub request_timeout_secs: u64,
}

/// 抽取流程配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionSettings {
    /// 默认总超时时间（毫秒）
    pub default_timeout_ms: u64,
    /// 默认渲染稳定等待时间（毫秒）
    pub default_settle_ms: u64,
    /// 默认最多展开的任务数
    pub default_max_tasks: u32,
    /// 页面就绪所需的导航关键词（任一出现即可，空表示不检查）
    pub ready_keywords: Vec<String>,
    /// 页面就绪所需的最小可见文本长度
    pub ready_min_text_len: usize,
    /// 全文模式下页面就绪所需的最小可见文本长度
    pub text_min_text_len: usize,
    /// 候选的“加入”按钮文本，按顺序尝试
    pub join_labels: Vec<String>,
    /// 点击“加入”后的等待时间（毫秒）
    pub join_settle_ms: u64,
    /// 段落展开后可能出现的提示文本
    pub content_sentinels: Vec<String>,
    /// 段落展开后判定为就绪的最小可见文本长度
    pub content_min_text_len: usize,
    /// 单个段落内容等待的上限（毫秒），不超过总超时
    pub content_wait_ms: u64,
    /// 轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 内容容器的结构化元素类型
    pub container_kinds: Vec<String>,
    /// 没有结构化容器时的通用容器类型
    pub fallback_container_kinds: Vec<String>,
    /// 容器选择策略：largest / closest / role
    pub locator: String,
}

impl ExtractionSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn join_settle(&self) -> Duration {
        Duration::from_millis(self.join_settle_ms)
    }
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出
    pub enabled: bool,
    /// 导出监听地址
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载默认值、配置文件和环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// 与 [`Settings::new`] 相同，但环境变量取自 `env_source`（`None` 时读取进程环境）
    pub fn load(env_source: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("TASKREEL")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("extraction.ready_keywords")
                    .with_list_parse_key("extraction.join_labels")
                    .with_list_parse_key("extraction.content_sentinels")
                    .with_list_parse_key("extraction.container_kinds")
                    .with_list_parse_key("extraction.fallback_container_kinds")
                    .try_parsing(true)
                    .source(env_source),
            );

        builder.build()?.try_deserialize()
    }

    /// 仅使用内置默认值构建配置，不读取文件和环境变量
    pub fn from_defaults() -> Result<Self, ConfigError> {
        Self::defaults()?.build()?.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            // Server
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Browser
            .set_default("browser.headless", true)?
            .set_default("browser.storage_state_path", "storage_state.json")?
            .set_default("browser.request_timeout_secs", 30)?
            // Extraction
            .set_default("extraction.default_timeout_ms", 120_000)?
            .set_default("extraction.default_settle_ms", 4_000)?
            .set_default("extraction.default_max_tasks", 20)?
            .set_default("extraction.ready_keywords", vec!["Task"])?
            .set_default("extraction.ready_min_text_len", 200)?
            .set_default("extraction.text_min_text_len", 200)?
            .set_default(
                "extraction.join_labels",
                vec!["Join Room", "Join room", "Join this room", "Join"],
            )?
            .set_default("extraction.join_settle_ms", 2_000)?
            .set_default(
                "extraction.content_sentinels",
                vec!["Answer the questions below", "Submit", "Question"],
            )?
            .set_default("extraction.content_min_text_len", 400)?
            .set_default("extraction.content_wait_ms", 15_000)?
            .set_default("extraction.poll_interval_ms", 250)?
            .set_default(
                "extraction.container_kinds",
                vec!["section", "article", "li", "details"],
            )?
            .set_default("extraction.fallback_container_kinds", vec!["div"])?
            .set_default("extraction.locator", "largest")?
            // Metrics
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }
}
