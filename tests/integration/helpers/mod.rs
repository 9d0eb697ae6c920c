// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 内存中的手风琴页面，用于在没有浏览器的情况下驱动完整抽取流程

use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use taskreel::config::settings::{ExtractionSettings, Settings};
use taskreel::domain::services::extraction_service::{ExtractionOptions, ExtractionService};
use taskreel::engines::traits::{
    CandidateBlock, DriverError, DriverFactory, ElementHandle, PageDriver, WaitUntil,
};

const INTRO: &str = "Room overview. Work through each task below; every task unlocks \
hints, questions and a short reading. The room is self-paced and progress is saved \
automatically between visits, so there is no need to finish everything in one sitting.";

/// 一个可折叠段落
#[derive(Debug, Clone)]
pub struct FakeSection {
    /// 控件上显示的文本
    pub control: String,
    /// 展开后出现的内容
    pub body: String,
    pub open: bool,
    /// 点击时报错
    pub unclickable: bool,
}

impl FakeSection {
    /// 标准段落：控件文本为 `Task n`，内容以标题行开头
    pub fn task(number: u32, title: &str) -> Self {
        Self {
            control: format!("Task {}", number),
            body: format!(
                "{}\nRead the material for this step.\nAnswer the questions below",
                title
            ),
            open: false,
            unclickable: false,
        }
    }
}

/// 页面状态，测试在抽取结束后检查它
#[derive(Debug, Default)]
pub struct PageState {
    pub heading: Option<String>,
    pub join_label: Option<String>,
    pub joined: bool,
    pub sections: Vec<FakeSection>,
    /// 可见文本始终很短，页面永远不会就绪
    pub never_ready: bool,
    /// 导航超时
    pub navigation_times_out: bool,
    /// 覆盖整个 body 的可见文本
    pub body_override: Option<String>,
    /// 加入按钮查找报错
    pub fail_join_lookup: bool,
    /// 加入按钮点击报错
    pub fail_join_click: bool,
    /// 容器收集报错
    pub fail_collect: bool,
    /// 标题读取报错
    pub fail_heading: bool,
    pub navigated: Vec<String>,
    pub clicks: Vec<String>,
    pub closed: bool,
    pub close_calls: u32,
}

impl PageState {
    /// 已被点击过的段落控件文本
    pub fn clicked_sections(&self) -> Vec<String> {
        self.clicks
            .iter()
            .filter_map(|id| id.strip_prefix('s'))
            .filter_map(|i| i.parse::<usize>().ok())
            .map(|i| self.sections[i].control.clone())
            .collect()
    }

    fn render(&self) -> String {
        if let Some(text) = &self.body_override {
            return text.clone();
        }
        if self.never_ready {
            return "Loading...".to_string();
        }

        let mut out = String::new();
        if let Some(heading) = &self.heading {
            out.push_str(heading);
            out.push('\n');
        }
        if let Some(join) = &self.join_label {
            if !self.joined {
                out.push_str(join);
                out.push('\n');
            }
        }
        out.push_str(INTRO);
        out.push('\n');
        for section in &self.sections {
            out.push_str(&section_text(section));
            out.push('\n');
        }
        out
    }
}

fn section_text(section: &FakeSection) -> String {
    if section.open {
        format!("{}\n{}", section.control, section.body)
    } else {
        section.control.clone()
    }
}

/// 可共享的页面
#[derive(Debug, Clone, Default)]
pub struct AccordionPage {
    state: Arc<Mutex<PageState>>,
}

impl AccordionPage {
    pub fn new(state: PageState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// 带标题和 `count` 个标准段落的页面
    pub fn with_tasks(count: u32) -> Self {
        Self::new(PageState {
            heading: Some("Defensive Security Intro".to_string()),
            sections: (1..=count)
                .map(|n| FakeSection::task(n, &format!("Step {} title", n)))
                .collect(),
            ..Default::default()
        })
    }

    pub fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap()
    }
}

pub struct FakeDriver {
    page: AccordionPage,
}

impl FakeDriver {
    fn live(&self) -> Result<MutexGuard<'_, PageState>, DriverError> {
        let state = self.page.state();
        if state.closed {
            return Err(DriverError::Closed);
        }
        Ok(state)
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn navigate(
        &self,
        url: &str,
        _wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let times_out = {
            let mut state = self.live()?;
            state.navigated.push(url.to_string());
            state.navigation_times_out
        };
        if times_out {
            tokio::time::sleep(timeout).await;
            return Err(DriverError::Timeout(timeout));
        }
        Ok(())
    }

    async fn visible_text(&self) -> Result<String, DriverError> {
        Ok(self.live()?.render())
    }

    async fn query_by_exact_text(&self, text: &str) -> Result<Vec<ElementHandle>, DriverError> {
        let state = self.live()?;
        let mut found = Vec::new();
        if !state.joined && state.join_label.as_deref() == Some(text) {
            if state.fail_join_lookup {
                return Err(DriverError::Script("join lookup failed".to_string()));
            }
            found.push(ElementHandle::new("join"));
        }
        for (i, section) in state.sections.iter().enumerate() {
            if section.control == text {
                found.push(ElementHandle::new(format!("s{}", i)));
            }
        }
        Ok(found)
    }

    async fn query_by_pattern(&self, pattern: &Regex) -> Result<Vec<ElementHandle>, DriverError> {
        let state = self.live()?;
        Ok(state
            .sections
            .iter()
            .enumerate()
            .filter(|(_, s)| pattern.is_match(&s.control))
            .map(|(i, _)| ElementHandle::new(format!("s{}", i)))
            .collect())
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError> {
        let mut state = self.live()?;
        let id = element.id().to_string();

        if id == "join" {
            if state.fail_join_click {
                return Err(DriverError::Browser("element is not clickable".to_string()));
            }
            state.joined = true;
        } else {
            let index = id
                .strip_prefix('s')
                .and_then(|i| i.parse::<usize>().ok())
                .filter(|i| *i < state.sections.len())
                .ok_or_else(|| DriverError::StaleElement(id.clone()))?;
            let section = &mut state.sections[index];
            if section.unclickable {
                return Err(DriverError::Browser("element is not clickable".to_string()));
            }
            section.open = !section.open;
        }
        state.clicks.push(id);
        Ok(())
    }

    async fn collect_blocks(
        &self,
        needle: &str,
        kinds: &[String],
        fallback_kinds: &[String],
    ) -> Result<Vec<CandidateBlock>, DriverError> {
        let state = self.live()?;
        if state.fail_collect {
            return Err(DriverError::Script("collect failed".to_string()));
        }

        // Each section renders as <section><button/><div role="region"/></section>,
        // all inside one page-wide <div>.
        let mut blocks = Vec::new();
        for section in &state.sections {
            let text = section_text(section);
            if !text.contains(needle) {
                continue;
            }
            if kinds.iter().any(|k| k == "section") {
                blocks.push(CandidateBlock {
                    tag: "section".to_string(),
                    role: None,
                    depth: 2,
                    text: text.clone(),
                });
            }
        }
        if blocks.is_empty() && fallback_kinds.iter().any(|k| k == "div") {
            let page = state.render();
            if page.contains(needle) {
                blocks.push(CandidateBlock {
                    tag: "div".to_string(),
                    role: None,
                    depth: 1,
                    text: page,
                });
            }
        }
        Ok(blocks)
    }

    async fn first_heading_text(&self) -> Result<Option<String>, DriverError> {
        let state = self.live()?;
        if state.fail_heading {
            return Err(DriverError::Script("heading lookup failed".to_string()));
        }
        Ok(state.heading.clone())
    }

    async fn close(&self) -> Result<(), DriverError> {
        let mut state = self.page.state();
        state.close_calls += 1;
        state.closed = true;
        Ok(())
    }
}

/// 每次打开都返回同一个页面的驱动
pub struct FakeDriverFactory {
    page: AccordionPage,
    fail_open: bool,
    opened: Mutex<u32>,
}

impl FakeDriverFactory {
    pub fn new(page: AccordionPage) -> Self {
        Self {
            page,
            fail_open: false,
            opened: Mutex::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::new(AccordionPage::default())
        }
    }

    pub fn opened(&self) -> u32 {
        *self.opened.lock().unwrap()
    }
}

#[async_trait]
impl DriverFactory for FakeDriverFactory {
    async fn open(&self) -> Result<Box<dyn PageDriver>, DriverError> {
        if self.fail_open {
            return Err(DriverError::Browser("browser crashed".to_string()));
        }
        *self.opened.lock().unwrap() += 1;
        Ok(Box::new(FakeDriver {
            page: self.page.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub fn test_settings() -> ExtractionSettings {
    Settings::from_defaults()
        .expect("default settings")
        .extraction
}

pub fn service_for(factory: Arc<FakeDriverFactory>) -> ExtractionService {
    ExtractionService::new(factory, test_settings())
}

pub fn options(max_tasks: u32) -> ExtractionOptions {
    ExtractionOptions {
        timeout: Duration::from_secs(30),
        settle: Duration::from_millis(500),
        max_tasks,
    }
}
