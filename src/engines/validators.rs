// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::ExtractionError;
use url::Url;

/// 验证目标 URL
///
/// 只接受带主机名的 http/https 地址
pub fn validate_url(url_str: &str) -> Result<Url, ExtractionError> {
    let invalid = || ExtractionError::InvalidUrl(url_str.to_string());

    if !(url_str.starts_with("https://") || url_str.starts_with("http://")) {
        return Err(invalid());
    }

    let url = Url::parse(url_str).map_err(|_| invalid())?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid());
    }

    Ok(url)
}
