// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use taskreel::utils::telemetry;

#[test]
fn test_telemetry_initialization() {
    telemetry::init_telemetry();
    // A second call must not panic.
    telemetry::init_telemetry();

    tracing::debug!("This is a debug message");
    tracing::info!(
        request_id = "00000000-0000-0000-0000-000000000000",
        url = "https://example.com",
        "Extraction started"
    );
    tracing::warn!(label = "Task 3", "Clicking did not grow the page");
}
