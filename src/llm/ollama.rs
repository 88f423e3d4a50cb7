//! Ollama 客户端（/api/chat，非流式）
//!
//! 默认本地 http://localhost:11434；文本模型默认 llama3，图像模型默认 moondream。
//! 图像以 base64 放入 user 消息的 images 字段。

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::llm::{CompletionOptions, LlmClient, LlmError};
use crate::memory::Message;

pub const OLLAMA_DEFAULT_HOST: &str = "http://localhost:11434";

/// Ollama 客户端：持有 reqwest Client、文本模型与图像模型名
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    timeout: Duration,
    base_url: String,
    model: String,
    vision_model: String,
}

impl OllamaClient {
    pub fn new(base_url: Option<&str>, model: &str, vision_model: &str, timeout_secs: u64) -> Self {
        let base_url = base_url
            .map(String::from)
            .or_else(|| std::env::var("OLLAMA_HOST").ok())
            .unwrap_or_else(|| OLLAMA_DEFAULT_HOST.to_string());
        let timeout = Duration::from_secs(timeout_secs);
        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "ollama http client build failed, using default client");
                reqwest::Client::new()
            }
        };
        Self {
            client,
            timeout,
            base_url,
            model: model.to_string(),
            vision_model: vision_model.to_string(),
        }
    }

    fn endpoint_chat(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    async fn chat(&self, req: &ChatRequest) -> Result<String, LlmError> {
        let resp = self
            .client
            .post(self.endpoint_chat())
            .timeout(self.timeout)
            .json(req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LlmError::Http(format!("ollama chat HTTP {status}")));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;
        Ok(parsed.message.content)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        let req = ChatRequest {
            model: self.model.clone(),
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                    images: None,
                })
                .collect(),
            stream: false,
            options: options.temperature.map(|temperature| ChatOptions { temperature }),
        };
        tracing::debug!(model = %self.model, messages = messages.len(), "ollama complete");
        self.chat(&req).await
    }

    async fn describe_image(&self, prompt: &str, image: &[u8]) -> Result<String, LlmError> {
        let req = ChatRequest {
            model: self.vision_model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
                images: Some(vec![BASE64_STANDARD.encode(image)]),
            }],
            stream: false,
            options: None,
        };
        tracing::debug!(model = %self.vision_model, bytes = image.len(), "ollama describe image");
        self.chat(&req).await
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

#[derive(Debug, Clone, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}
