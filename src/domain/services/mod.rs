// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 页面会话（page_session）：一个请求独占的页面及其时间预算
/// - 就绪等待（readiness）：页面级和段落级的内容轮询
/// - 加入（session_joiner）：尽力点击加入按钮
/// - 段落展开（section_expander）：按匹配策略链找到并点击段落控件
/// - 内容定位（content_locator）：在候选容器中选出段落内容块
/// - 块抽取（block_extractor）：读取并清洗段落内容
/// - 任务发现（task_discovery）：从 1 开始连续探测段落
/// - 结果汇总（result_assembler）：组装最终结果
/// - 抽取服务（extraction_service）：编排一次完整请求
pub mod block_extractor;
pub mod content_locator;
pub mod extraction_service;
pub mod page_session;
pub mod readiness;
pub mod result_assembler;
pub mod section_expander;
pub mod session_joiner;
pub mod task_discovery;
