//! 链式哈希：每一步对上一步的小写十六进制字符串再做摘要

use md5::Md5;
use sha2::{Digest, Sha512};

use crate::core::AgentError;

/// 支持的摘要算法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Md5,
    Sha512,
}

impl HashAlgorithm {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "md5" => Some(HashAlgorithm::Md5),
            "sha512" => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    pub fn hex_digest(self, input: &[u8]) -> String {
        match self {
            HashAlgorithm::Md5 => hex::encode(Md5::digest(input)),
            HashAlgorithm::Sha512 => hex::encode(Sha512::digest(input)),
        }
    }
}

/// 按顺序链式计算；算法列表为空时返回 ExtractionFailure
pub fn hash_chain(input: &str, algorithms: &[HashAlgorithm]) -> Result<String, AgentError> {
    if algorithms.is_empty() {
        return Err(AgentError::ExtractionFailure(
            "Regex failed to find the required string and algorithms in the prompt.".to_string(),
        ));
    }
    let digest = algorithms
        .iter()
        .fold(input.to_string(), |current, algo| algo.hex_digest(current.as_bytes()));
    tracing::debug!(steps = algorithms.len(), "hash chain computed");
    Ok(digest)
}
