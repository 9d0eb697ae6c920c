// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::presentation::handlers::extract_handler;
use axum::{routing::get, Router};

/// 创建应用路由
///
/// 抽取服务通过 `Extension` 层注入
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/", get(extract_handler::root))
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let extract_routes = Router::new()
        .route("/extract", get(extract_handler::extract_text))
        .route("/extract/tasks", get(extract_handler::extract_tasks));

    Router::new().merge(public_routes).merge(extract_routes)
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
