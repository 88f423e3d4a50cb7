//! 长期记忆能力：记住事实（Store）与回忆（Recall）

use std::sync::Arc;

use crate::core::AgentError;
use crate::llm::{CompletionOptions, LlmClient};
use crate::memory::{FactMemory, Message};

pub const STORED_REPLY: &str = "OK, I've remembered that.";
pub const NOTHING_RECALLED: &str = "I couldn't find any information about that in my memory.";

fn fact_extraction_prompt(request: &str) -> String {
    format!(
        "From the user's request, extract only the core fact or piece of information they want me to remember. \
         For example, from 'Please remember this for later: the secret code is 1234', you would extract 'the secret code is 1234'. \
         From the request '{request}', extract the core fact."
    )
}

pub struct MemoryCapability {
    memory: Arc<FactMemory>,
    llm: Arc<dyn LlmClient>,
}

impl MemoryCapability {
    pub fn new(memory: Arc<FactMemory>, llm: Arc<dyn LlmClient>) -> Self {
        Self { memory, llm }
    }

    /// 让 LLM 抽取核心事实（temperature 0），去掉首尾空白与双引号后追加为 fact_<n>
    pub async fn store(&self, request: &str) -> Result<String, AgentError> {
        let messages = vec![Message::user(fact_extraction_prompt(request))];
        let extracted = self
            .llm
            .complete(&messages, &CompletionOptions::deterministic())
            .await?;
        let fact = extracted.trim().replace('"', "");
        let key = self.memory.remember(&fact)?;
        tracing::info!(key = %key, "fact stored");
        Ok(STORED_REPLY.to_string())
    }

    /// 在所有事实中按子串（大小写不敏感）查找 query，再请 LLM 依据命中事实回答原问题
    pub async fn recall(&self, query: &str, prompt: &str) -> Result<String, AgentError> {
        let facts = self.memory.search(query)?;
        if facts.is_empty() {
            tracing::info!(query = %query, "no fact matched");
            return Ok(NOTHING_RECALLED.to_string());
        }
        let joined = facts.join("; ");
        let question = format!(
            "Based on the following stored fact(s): '{joined}', provide a direct answer to the user's original question: '{prompt}'"
        );
        tracing::info!(query = %query, hits = facts.len(), "facts recalled");
        let answer = self
            .llm
            .complete(&[Message::user(question)], &CompletionOptions::default())
            .await?;
        Ok(answer)
    }
}
