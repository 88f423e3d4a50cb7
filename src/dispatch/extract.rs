//! 参数抽取：在原文上做正则匹配，缺必需字段时返回 ExtractionFailure

use std::sync::OnceLock;

use regex::Regex;

use crate::browse::page::trim_trailing_punctuation;
use crate::core::AgentError;
use crate::dispatch::intent::url_pattern;
use crate::tools::HashAlgorithm;

pub const RECALL_NEEDS_NUMBER: &str =
    "I'm sorry, please specify a number for me to search for in my memory.";
pub const RETRIEVE_NEEDS_URL: &str = "Please provide a URL to browse.";
pub const HASH_NEEDS_PARAMS: &str =
    "Regex failed to find the required string and algorithms in the prompt.";

/// 各路由的参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedParams {
    Recall { query: String, prompt: String },
    Store { request: String },
    Compute { prompt: String },
    Retrieve { url: String, query: String },
    Hash { input: String, algorithms: Vec<HashAlgorithm> },
    GeneralQa { prompt: String },
}

fn number_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("static regex"))
}

fn quoted_string_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"string "([^"]+)""#).expect("static regex"))
}

fn algorithm_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(sha512|md5)\b").expect("static regex"))
}

pub fn extract_store(text: &str) -> Result<ExtractedParams, AgentError> {
    Ok(ExtractedParams::Store {
        request: text.to_string(),
    })
}

pub fn extract_compute(text: &str) -> Result<ExtractedParams, AgentError> {
    Ok(ExtractedParams::Compute {
        prompt: text.to_string(),
    })
}

pub fn extract_general_qa(text: &str) -> Result<ExtractedParams, AgentError> {
    Ok(ExtractedParams::GeneralQa {
        prompt: text.to_string(),
    })
}

/// 第一个数字串作为检索词
pub fn extract_recall(text: &str) -> Result<ExtractedParams, AgentError> {
    let query = number_pattern()
        .find(text)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| AgentError::ExtractionFailure(RECALL_NEEDS_NUMBER.to_string()))?;
    Ok(ExtractedParams::Recall {
        query,
        prompt: text.to_string(),
    })
}

/// 第一个 URL（去掉句末标点）；问题为去掉 URL 后的原文
pub fn extract_retrieve(text: &str) -> Result<ExtractedParams, AgentError> {
    let url = url_pattern()
        .find(text)
        .map(|m| trim_trailing_punctuation(m.as_str()).to_string())
        .filter(|url| url_pattern().is_match(url))
        .ok_or_else(|| AgentError::ExtractionFailure(RETRIEVE_NEEDS_URL.to_string()))?;
    let query = text.replace(&url, "").trim().to_string();
    Ok(ExtractedParams::Retrieve { url, query })
}

/// `string "<输入>"` 加至少一个算法名（按出现顺序）
pub fn extract_hash(text: &str) -> Result<ExtractedParams, AgentError> {
    let input = quoted_string_pattern()
        .captures(text)
        .map(|caps| caps[1].to_string());
    let algorithms: Vec<HashAlgorithm> = algorithm_pattern()
        .find_iter(text)
        .filter_map(|m| HashAlgorithm::parse(m.as_str()))
        .collect();
    match input {
        Some(input) if !algorithms.is_empty() => Ok(ExtractedParams::Hash { input, algorithms }),
        _ => Err(AgentError::ExtractionFailure(HASH_NEEDS_PARAMS.to_string())),
    }
}
