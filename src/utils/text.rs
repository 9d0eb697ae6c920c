// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 清理可见文本
///
/// 按行切分，去除每行首尾空白，丢弃空行，再以 `\n` 连接
pub fn clean_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// 从清理后的内容中取标题
///
/// 返回第一行非空且不等于 `label` 的文本，没有则返回空字符串
pub fn title_from(content: &str, label: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && *line != label)
        .unwrap_or_default()
        .to_string()
}
