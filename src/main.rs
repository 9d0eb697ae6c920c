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

use axum::Extension;
use std::sync::Arc;
use taskreel::config::settings::Settings;
use taskreel::domain::services::extraction_service::ExtractionService;
use taskreel::engines::chromium_driver::ChromiumDriverFactory;
use taskreel::engines::traits::DriverFactory;
use taskreel::infrastructure::metrics;
use taskreel::presentation::routes;
use taskreel::utils::telemetry;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting taskreel...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // 3. Initialize Prometheus Metrics
    metrics::init_metrics(&settings.metrics);

    // 4. Browser is launched lazily on the first request
    let factory: Arc<dyn DriverFactory> = Arc::new(
        ChromiumDriverFactory::new(settings.browser.clone())
            .with_poll_interval(settings.extraction.poll_interval()),
    );
    let service = Arc::new(ExtractionService::new(
        factory,
        settings.extraction.clone(),
    ));
    info!(
        "Extraction service ready (locator: {})",
        settings.extraction.locator
    );

    // 5. Start HTTP server
    let app = routes::routes()
        .layer(Extension(service))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
