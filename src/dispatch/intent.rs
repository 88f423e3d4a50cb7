//! 意图识别：有序路由表，先匹配者胜
//!
//! 匹配在小写文本上进行；URL 检测在原文上进行。顺序决定优先级（Recall 必须在 Store 之前，
//! 否则 “do you remember what I told you to store” 会被当成存储请求）。

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::AgentError;
use crate::dispatch::extract::{
    extract_compute, extract_general_qa, extract_hash, extract_recall, extract_retrieve, extract_store,
    ExtractedParams,
};

/// 路由目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Recall,
    Store,
    Compute,
    Retrieve,
    Hash,
    GeneralQa,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Recall => "recall",
            Intent::Store => "store",
            Intent::Compute => "compute",
            Intent::Retrieve => "retrieve",
            Intent::Hash => "hash",
            Intent::GeneralQa => "general_qa",
        }
    }
}

pub const RECALL_KEYWORDS: &[&str] = &[
    "do you remember",
    "what did i tell you",
    "check your memory",
    "what was paired with",
];

pub const STORE_KEYWORDS: &[&str] = &[
    "remember that",
    "remember this",
    "store this",
    "for future reference",
];

pub const COMPUTE_KEYWORDS: &[&str] = &[
    "calculate",
    "compute",
    "what is the result",
    "program for",
    "sum of squares",
];

pub(crate) fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").expect("static regex"))
}

fn contains_any(lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| lower.contains(k))
}

/// 路由表的一行：意图、命中谓词、参数抽取
pub struct Route {
    pub intent: Intent,
    /// (小写文本, 原文) → 是否命中
    pub matches: fn(&str, &str) -> bool,
    /// 在原文上抽取该意图的参数
    pub extract: fn(&str) -> Result<ExtractedParams, AgentError>,
}

pub const ROUTES: &[Route] = &[
    Route {
        intent: Intent::Recall,
        matches: |lower, _| contains_any(lower, RECALL_KEYWORDS),
        extract: extract_recall,
    },
    Route {
        intent: Intent::Store,
        matches: |lower, _| contains_any(lower, STORE_KEYWORDS),
        extract: extract_store,
    },
    Route {
        intent: Intent::Compute,
        matches: |lower, _| contains_any(lower, COMPUTE_KEYWORDS),
        extract: extract_compute,
    },
    Route {
        intent: Intent::Retrieve,
        matches: |lower, original| lower.contains("browse") || url_pattern().is_match(original),
        extract: extract_retrieve,
    },
    Route {
        intent: Intent::Hash,
        matches: |lower, _| lower.contains("hash"),
        extract: extract_hash,
    },
];

/// 路由表都不命中时使用
pub static FALLBACK_ROUTE: Route = Route {
    intent: Intent::GeneralQa,
    matches: |_, _| true,
    extract: extract_general_qa,
};

/// 按路由表顺序选出第一行命中的路由
pub fn select_route(text: &str) -> &'static Route {
    let lower = text.to_lowercase();
    ROUTES
        .iter()
        .find(|route| (route.matches)(&lower, text))
        .unwrap_or(&FALLBACK_ROUTE)
}

pub fn classify(text: &str) -> Intent {
    select_route(text).intent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recall_beats_store() {
        assert_eq!(
            classify("Do you remember what I told you to store this morning?"),
            Intent::Recall
        );
        assert_eq!(classify("Remember that 42 is blue"), Intent::Store);
    }

    #[test]
    fn test_route_order() {
        assert_eq!(classify("Calculate the sum of squares up to 10"), Intent::Compute);
        assert_eq!(classify("Go to https://ttt.puppy9.com and find the code"), Intent::Retrieve);
        assert_eq!(classify("please BROWSE the site"), Intent::Retrieve);
        assert_eq!(classify("hash the string \"a\" with md5"), Intent::Hash);
        assert_eq!(classify("compute the md5 hash"), Intent::Compute);
        assert_eq!(classify("Why is the sky blue?"), Intent::GeneralQa);
    }

    #[test]
    fn test_each_route_extracts_params_for_its_intent() {
        let samples = [
            (Intent::Recall, "What was paired with 42?"),
            (Intent::Store, "Remember that 42 is blue"),
            (Intent::Compute, "Calculate 2+2"),
            (Intent::Retrieve, "Go to https://ttt.puppy9.com, play the game."),
            (Intent::Hash, r#"hash the string "a" with md5"#),
            (Intent::GeneralQa, "Why is the sky blue?"),
        ];
        for (intent, text) in samples {
            let route = select_route(text);
            assert_eq!(route.intent, intent, "{text}");
            let params = (route.extract)(text).unwrap();
            let matched = match params {
                ExtractedParams::Recall { .. } => Intent::Recall,
                ExtractedParams::Store { .. } => Intent::Store,
                ExtractedParams::Compute { .. } => Intent::Compute,
                ExtractedParams::Retrieve { .. } => Intent::Retrieve,
                ExtractedParams::Hash { .. } => Intent::Hash,
                ExtractedParams::GeneralQa { .. } => Intent::GeneralQa,
            };
            assert_eq!(matched, intent, "{text}");
        }
    }

    #[test]
    fn test_url_match_is_case_sensitive_on_scheme() {
        assert_eq!(classify("HTTPS://EXAMPLE.COM"), Intent::GeneralQa);
    }
}
