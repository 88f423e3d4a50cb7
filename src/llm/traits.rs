//! LLM 客户端抽象
//!
//! 所有后端（Ollama / OpenAI 兼容 / Mock）实现 LlmClient：complete（文本补全）与 describe_image（图像理解）。

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::Message;

/// 单次补全参数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
}

impl CompletionOptions {
    /// temperature = 0.0：事实抽取、代码生成等需要稳定输出的场景
    pub fn deterministic() -> Self {
        Self {
            temperature: Some(0.0),
        }
    }
}

/// LLM 调用失败（超时、HTTP 错误、响应格式错误、后端不支持）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("request timed out")]
    Timeout,

    #[error("http error: {0}")]
    Http(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else if e.is_decode() {
            LlmError::Malformed(e.to_string())
        } else {
            LlmError::Http(e.to_string())
        }
    }
}

/// LLM 客户端 trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式补全，返回首条回复内容
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, LlmError>;

    /// 图像理解；默认不支持
    async fn describe_image(&self, prompt: &str, _image: &[u8]) -> Result<String, LlmError> {
        Err(LlmError::Unsupported(format!(
            "image understanding is not available for prompt '{prompt}'"
        )))
    }
}
