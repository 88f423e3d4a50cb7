//! 通用问答

use std::sync::Arc;

use crate::core::AgentError;
use crate::llm::{CompletionOptions, LlmClient};
use crate::memory::Message;

/// 回答风格：先给结论，语言简洁
pub const AGENT_SYSTEM_PROMPT: &str = "Begin your response with a concise direct answer to the prompt's main question. \
Use clear, straightforward language and contractions. Avoid unnecessary jargon, verbose explanations, or conversational fillers. \
Structure the response logically. Use markdown headings (##) to create distinct sections if the response is more than a few paragraphs \
or covers different points, topics, or steps. If a response uses markdown headings, add horizontal lines to separate sections. \
Prioritize coherence over excessive fragmentation. When appropriate bold key words in the response.";

pub struct GeneralQa {
    llm: Arc<dyn LlmClient>,
}

impl GeneralQa {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn answer(&self, prompt: &str) -> Result<String, AgentError> {
        let messages = vec![Message::system(AGENT_SYSTEM_PROMPT), Message::user(prompt)];
        Ok(self.llm.complete(&messages, &CompletionOptions::default()).await?)
    }
}
