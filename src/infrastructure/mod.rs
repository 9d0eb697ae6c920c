// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 指标（metrics）：Prometheus 导出器和抽取相关的计数器
pub mod metrics;
