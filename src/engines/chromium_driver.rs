// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserSettings;
use crate::engines::storage_state::StorageState;
use crate::engines::traits::{
    CandidateBlock, DriverError, DriverFactory, ElementHandle, PageDriver, WaitUntil,
    DEFAULT_POLL_INTERVAL,
};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::SetCookiesParams;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, NavigateParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Attribute used to turn matched DOM nodes into clickable handles.
const HANDLE_ATTR: &str = "data-taskreel-handle";

const VISIBLE_TEXT_JS: &str = "document.body ? (document.body.innerText || '') : ''";

const READY_STATE_JS: &str = "[location.href, document.readyState]";

/// The blank document a fresh tab starts on.
const BLANK_DOCUMENT: &str = "about:blank";

/// 新文档已解析完成：已离开初始空白页且 readyState 不再是 `loading`
fn dom_content_loaded(href: &str, ready_state: &str) -> bool {
    href != BLANK_DOCUMENT && ready_state != "loading"
}

const FIRST_HEADING_JS: &str = r#"(() => {
  const el = document.querySelector('h1, h2, [role="heading"]');
  return el ? (el.innerText || '').trim() : '';
})()"#;

// Elements with a direct text node equal to `text`, visible only.
const EXACT_TEXT_JS: &str = r#"((text, attr, start) => {
  const body = document.body;
  if (!body) return [];
  const ids = [];
  let n = start;
  for (const el of body.querySelectorAll('*')) {
    if (el.getClientRects().length === 0) continue;
    const own = Array.from(el.childNodes).some(c => c.nodeType === 3 && c.nodeValue === text);
    if (!own) continue;
    const id = 'h' + (n++);
    el.setAttribute(attr, id);
    ids.push(id);
  }
  return ids;
})"#;

// Innermost visible elements whose whole innerText matches `source`.
const PATTERN_JS: &str = r#"((source, attr, start) => {
  const body = document.body;
  if (!body) return [];
  const re = new RegExp(source);
  const hits = [];
  for (const el of body.querySelectorAll('*')) {
    if (el.getClientRects().length === 0) continue;
    if (re.test(el.innerText || '')) hits.push(el);
  }
  const innermost = hits.filter(h => !hits.some(o => o !== h && h.contains(o)));
  const ids = [];
  let n = start;
  for (const el of innermost) {
    const id = 'h' + (n++);
    el.setAttribute(attr, id);
    ids.push(id);
  }
  return ids;
})"#;

const COLLECT_BLOCKS_JS: &str = r#"((needle, kinds, fallback) => {
  const body = document.body;
  if (!body) return [];
  const depthOf = (el) => { let d = 0; for (let p = el; p && p !== body; p = p.parentElement) d++; return d; };
  const scan = (sel) => {
    if (!sel.length) return [];
    const out = [];
    for (const el of body.querySelectorAll(sel.join(','))) {
      const text = el.innerText || '';
      if (!text.includes(needle)) continue;
      out.push({ tag: el.tagName.toLowerCase(), role: el.getAttribute('role'), depth: depthOf(el), text });
    }
    return out;
  };
  const primary = scan(kinds);
  return primary.length ? primary : scan(fallback);
})"#;

impl From<CdpError> for DriverError {
    fn from(err: CdpError) -> Self {
        DriverError::Browser(err.to_string())
    }
}

/// 基于 chromiumoxide 的驱动工厂
///
/// 浏览器进程在第一次请求时启动（或连接远程实例），之后所有请求共享，每个请求独占一个标签页
pub struct ChromiumDriverFactory {
    settings: BrowserSettings,
    poll_interval: Duration,
    browser: OnceCell<Browser>,
}

impl ChromiumDriverFactory {
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            poll_interval: DEFAULT_POLL_INTERVAL,
            browser: OnceCell::const_new(),
        }
    }

    /// 设置内容轮询间隔
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    // Asynchronously gets or initializes the shared browser instance.
    async fn browser(&self) -> Result<&Browser, DriverError> {
        self.browser
            .get_or_try_init(|| async {
                let remote_debugging_url = self
                    .settings
                    .remote_debugging_url
                    .clone()
                    .or_else(|| std::env::var("CHROMIUM_REMOTE_DEBUGGING_URL").ok());

                let (browser, mut handler) = if let Some(ref url) = remote_debugging_url {
                    info!("Connecting to remote Chrome instance at: {}", url);
                    Browser::connect(url).await.map_err(|e| {
                        DriverError::Browser(format!("Failed to connect to remote Chrome: {}", e))
                    })?
                } else {
                    let mut builder = BrowserConfig::builder()
                        .no_sandbox()
                        .request_timeout(Duration::from_secs(self.settings.request_timeout_secs))
                        .arg("--disable-gpu")
                        .arg("--disable-dev-shm-usage");

                    if !self.settings.headless {
                        builder = builder.with_head();
                    }
                    if let Some(path) = &self.settings.chrome_executable {
                        builder = builder.chrome_executable(path);
                    }

                    info!("Launching local Chrome instance");
                    Browser::launch(builder.build().map_err(DriverError::Browser)?).await?
                };

                // Spawn a handler to process browser events
                tokio::spawn(async move {
                    while let Some(h) = handler.next().await {
                        if h.is_err() {
                            break;
                        }
                    }
                });

                Ok::<_, DriverError>(browser)
            })
            .await
    }

    /// 在新标签页上应用持久化会话（若存在）
    async fn apply_storage_state(&self, page: &Page) -> Result<(), DriverError> {
        let state = match StorageState::load(&self.settings.storage_state_path) {
            Ok(Some(state)) if !state.is_empty() => state,
            Ok(_) => return Ok(()),
            Err(e) => {
                warn!(
                    "Ignoring storage state at {}: {}",
                    self.settings.storage_state_path, e
                );
                return Ok(());
            }
        };

        let cookies = state.cookie_params();
        if !cookies.is_empty() {
            page.execute(SetCookiesParams::new(cookies)).await?;
        }
        if let Some(script) = state.local_storage_script() {
            page.execute(AddScriptToEvaluateOnNewDocumentParams::new(script))
                .await?;
        }
        debug!(
            "Applied storage state: {} cookies, {} origins",
            state.cookies.len(),
            state.origins.len()
        );
        Ok(())
    }
}

#[async_trait]
impl DriverFactory for ChromiumDriverFactory {
    async fn open(&self) -> Result<Box<dyn PageDriver>, DriverError> {
        let browser = self.browser().await?;
        let page = browser.new_page("about:blank").await?;
        let driver = ChromiumDriver::new(page).with_poll_interval(self.poll_interval);

        // The driver owns the tab from here on, so a failure still releases it.
        if let Err(e) = self.apply_storage_state(driver.page()).await {
            let _ = driver.close().await;
            return Err(e);
        }
        Ok(Box::new(driver))
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

/// 标签页的关闭状态
///
/// `closed` 表示不再接受操作，`released` 表示浏览器已确认关闭；
/// 两者之间被取消时由 `Drop` 补做关闭
#[derive(Debug, Default)]
struct PageLifecycle {
    closed: AtomicBool,
    released: AtomicBool,
}

impl PageLifecycle {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 开始显式关闭，已经释放过时返回 `false`
    fn begin_close(&self) -> bool {
        self.closed.store(true, Ordering::Release);
        !self.released.load(Ordering::Acquire)
    }

    fn mark_released(&self) {
        self.released.store(true, Ordering::Release);
    }

    /// 析构时是否需要在后台关闭
    fn take_for_drop(&self) -> bool {
        self.closed.store(true, Ordering::Release);
        !self.released.swap(true, Ordering::AcqRel)
    }
}

/// 单个 Chromium 标签页
///
/// 优先通过 `close()` 显式释放；如果持有它的 future 在此之前被丢弃，
/// `Drop` 会在后台关闭标签页
pub struct ChromiumDriver {
    page: Page,
    poll_interval: Duration,
    lifecycle: PageLifecycle,
    next_handle: AtomicU64,
    runtime: tokio::runtime::Handle,
}

impl ChromiumDriver {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            poll_interval: DEFAULT_POLL_INTERVAL,
            lifecycle: PageLifecycle::default(),
            next_handle: AtomicU64::new(0),
            runtime: tokio::runtime::Handle::current(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.lifecycle.is_closed() {
            return Err(DriverError::Closed);
        }
        Ok(())
    }

    async fn evaluate<T: DeserializeOwned>(&self, expression: String) -> Result<T, DriverError> {
        self.ensure_open()?;
        let params = EvaluateParams::builder()
            .expression(expression)
            .return_by_value(true)
            .await_promise(true)
            .build()
            .map_err(DriverError::Script)?;

        self.page
            .evaluate_expression(params)
            .await
            .map_err(|e| DriverError::Script(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| DriverError::Script(e.to_string()))
    }

    /// 调用页面脚本中的函数，参数以 JSON 字面量传入
    async fn call<T: DeserializeOwned>(
        &self,
        function: &str,
        args: &[serde_json::Value],
    ) -> Result<T, DriverError> {
        let args = args
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.evaluate(format!("({})({})", function, args)).await
    }

    /// 标记匹配的元素并返回句柄
    async fn tag_elements(
        &self,
        function: &str,
        needle: &str,
    ) -> Result<Vec<ElementHandle>, DriverError> {
        let start = self.next_handle.load(Ordering::Relaxed);
        let ids: Vec<String> = self
            .call(
                function,
                &[
                    serde_json::json!(needle),
                    serde_json::json!(HANDLE_ATTR),
                    serde_json::json!(start),
                ],
            )
            .await?;
        self.next_handle
            .fetch_add(ids.len() as u64, Ordering::Relaxed);
        Ok(ids.into_iter().map(ElementHandle::new).collect())
    }

    async fn navigate_dom_content_loaded(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let deadline = Instant::now() + timeout;
        let response = self.page.execute(NavigateParams::new(url)).await?;
        if let Some(error_text) = &response.result.error_text {
            return Err(DriverError::Browser(format!(
                "Navigation to {} failed: {}",
                url, error_text
            )));
        }

        loop {
            // Evaluating can fail while the old document is being torn down.
            if let Ok((href, state)) = self
                .evaluate::<(String, String)>(READY_STATE_JS.to_string())
                .await
            {
                if dom_content_loaded(&href, &state) {
                    return Ok(());
                }
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(DriverError::Timeout(timeout));
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(
        &self,
        url: &str,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        self.ensure_open()?;
        match wait_until {
            WaitUntil::Load => tokio::time::timeout(timeout, self.page.goto(url))
                .await
                .map_err(|_| DriverError::Timeout(timeout))?
                .map(|_| ())
                .map_err(DriverError::from),
            WaitUntil::DomContentLoaded => tokio::time::timeout(
                timeout,
                self.navigate_dom_content_loaded(url, timeout),
            )
            .await
            .map_err(|_| DriverError::Timeout(timeout))?,
        }
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn visible_text(&self) -> Result<String, DriverError> {
        self.evaluate(VISIBLE_TEXT_JS.to_string()).await
    }

    async fn query_by_exact_text(&self, text: &str) -> Result<Vec<ElementHandle>, DriverError> {
        self.tag_elements(EXACT_TEXT_JS, text).await
    }

    async fn query_by_pattern(&self, pattern: &Regex) -> Result<Vec<ElementHandle>, DriverError> {
        self.tag_elements(PATTERN_JS, pattern.as_str()).await
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.ensure_open()?;
        let selector = format!("[{}=\"{}\"]", HANDLE_ATTR, element.id());
        let target = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| DriverError::StaleElement(e.to_string()))?;
        target.click().await?;
        Ok(())
    }

    async fn collect_blocks(
        &self,
        needle: &str,
        kinds: &[String],
        fallback_kinds: &[String],
    ) -> Result<Vec<CandidateBlock>, DriverError> {
        self.call(
            COLLECT_BLOCKS_JS,
            &[
                serde_json::json!(needle),
                serde_json::json!(kinds),
                serde_json::json!(fallback_kinds),
            ],
        )
        .await
    }

    async fn first_heading_text(&self) -> Result<Option<String>, DriverError> {
        let text: String = self.evaluate(FIRST_HEADING_JS.to_string()).await?;
        Ok(Some(text).filter(|t| !t.is_empty()))
    }

    async fn close(&self) -> Result<(), DriverError> {
        if !self.lifecycle.begin_close() {
            return Ok(());
        }
        self.page.clone().close().await?;
        self.lifecycle.mark_released();
        debug!("Page closed");
        Ok(())
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        if !self.lifecycle.take_for_drop() {
            return;
        }
        let page = self.page.clone();
        // Fire-and-forget; nothing can be awaited from Drop.
        self.runtime.spawn(async move {
            if let Err(e) = page.close().await {
                warn!("Background page close failed: {}", e);
            }
        });
    }
}
