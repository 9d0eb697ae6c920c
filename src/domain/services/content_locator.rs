// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 段落内容容器的选择策略
//!
//! 候选容器都包含段落标签文本，策略决定其中哪一个是展开后的面板。
//! 默认策略取可见文本最长的容器：当页面上另有一个更大的容器也包含标签
//! （例如列出所有标签的目录）时，它会静默地选错，可以换用其他策略。

use crate::engines::traits::CandidateBlock;

/// 容器选择策略
pub trait ContentLocator: Send + Sync {
    fn name(&self) -> &'static str;

    /// 从候选中选出内容容器，候选为空时返回 `None`
    fn select<'a>(&self, label: &str, candidates: &'a [CandidateBlock]) -> Option<&'a CandidateBlock>;
}

/// 可见文本最长者胜出，长度相同时保留文档顺序靠前的
pub struct LargestText;

impl ContentLocator for LargestText {
    fn name(&self) -> &'static str {
        "largest"
    }

    fn select<'a>(&self, _label: &str, candidates: &'a [CandidateBlock]) -> Option<&'a CandidateBlock> {
        longest(candidates.iter())
    }
}

fn longest<'a>(blocks: impl Iterator<Item = &'a CandidateBlock>) -> Option<&'a CandidateBlock> {
    blocks.fold(None, |best: Option<&CandidateBlock>, c| match best {
        Some(b) if b.text_len() >= c.text_len() => Some(b),
        _ => Some(c),
    })
}

/// 最近祖先：DOM 最深的候选胜出，深度相同时取文本较长者
pub struct ClosestAncestor;

impl ContentLocator for ClosestAncestor {
    fn name(&self) -> &'static str {
        "closest"
    }

    fn select<'a>(&self, _label: &str, candidates: &'a [CandidateBlock]) -> Option<&'a CandidateBlock> {
        candidates.iter().fold(None, |best: Option<&CandidateBlock>, c| match best {
            Some(b) if (b.depth, b.text_len()) >= (c.depth, c.text_len()) => Some(b),
            _ => Some(c),
        })
    }
}

/// 结构角色：优先选择带手风琴面板语义的容器，没有则退回最长文本
pub struct StructuralRole;

impl StructuralRole {
    const ROLES: [&'static str; 3] = ["region", "tabpanel", "listitem"];

    fn is_panel(block: &CandidateBlock) -> bool {
        block.tag == "details"
            || block
                .role
                .as_deref()
                .is_some_and(|r| Self::ROLES.contains(&r))
    }
}

impl ContentLocator for StructuralRole {
    fn name(&self) -> &'static str {
        "role"
    }

    fn select<'a>(&self, _label: &str, candidates: &'a [CandidateBlock]) -> Option<&'a CandidateBlock> {
        longest(candidates.iter().filter(|c| Self::is_panel(c))).or_else(|| longest(candidates.iter()))
    }
}

/// 按名称创建策略
pub fn locator_by_name(name: &str) -> Option<Box<dyn ContentLocator>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "largest" | "largest_text" => Some(Box::new(LargestText)),
        "closest" | "closest_ancestor" => Some(Box::new(ClosestAncestor)),
        "role" | "structural_role" => Some(Box::new(StructuralRole)),
        _ => None,
    }
}
