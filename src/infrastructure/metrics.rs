// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};

pub const EXTRACTIONS_TOTAL: &str = "taskreel_extractions_total";
pub const SECTIONS_OPENED_TOTAL: &str = "taskreel_sections_opened_total";
pub const EXTRACTION_DURATION_SECONDS: &str = "taskreel_extraction_duration_seconds";

pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", settings.listen_addr, e);
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    info!("Metrics exporter listening on {}", addr);
}

/// 记录一次抽取请求
///
/// # 参数
///
/// * `mode` - `tasks` 或 `text`
/// * `outcome` - `ok`、`timeout`、`invalid_url` 或 `error`
pub fn record_extraction(mode: &'static str, outcome: &'static str, elapsed: Duration) {
    counter!(EXTRACTIONS_TOTAL, "mode" => mode, "outcome" => outcome).increment(1);
    histogram!(EXTRACTION_DURATION_SECONDS, "mode" => mode).record(elapsed.as_secs_f64());
}

pub fn record_sections_opened(count: u32) {
    counter!(SECTIONS_OPENED_TOTAL).increment(u64::from(count));
}
