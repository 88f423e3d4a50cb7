//! LLM 层：客户端抽象与实现（Ollama / OpenAI 兼容 / Mock）

pub mod mock;
pub mod ollama;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use crate::config::AppConfig;

pub use mock::{MockLlmClient, RecordedCall};
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use traits::{CompletionOptions, LlmClient, LlmError};

/// 按配置创建 LLM 客户端：provider = "openai" 走 OpenAI 兼容端点，其余默认 Ollama
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let llm = &cfg.llm;
    match llm.provider.to_lowercase().as_str() {
        "openai" => {
            tracing::info!(model = %llm.model, "using OpenAI-compatible backend");
            Arc::new(OpenAiClient::new(llm.base_url.as_deref(), &llm.model, None))
        }
        other => {
            if other != "ollama" {
                tracing::warn!(provider = %other, "unknown llm provider, falling back to ollama");
            }
            tracing::info!(model = %llm.model, vision_model = %llm.vision_model, "using Ollama backend");
            Arc::new(OllamaClient::new(
                llm.base_url.as_deref(),
                &llm.model,
                &llm.vision_model,
                llm.timeout_secs,
            ))
        }
    }
}
