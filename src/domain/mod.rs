// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：段落标签、任务记录和抽取结果
/// - 服务（services）：页面会话、就绪等待、段落展开、内容定位和结果汇总
///
/// 领域层只依赖页面驱动的抽象接口，不依赖具体浏览器实现。
pub mod models;
pub mod services;
