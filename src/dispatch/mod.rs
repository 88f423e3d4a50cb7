//! 意图分发：分类 → 抽取参数 → 调用能力处理器
//!
//! dispatch 永远返回文本；处理器错误被转换成面向用户的说明。每次调用输出一条 JSON 审计日志。

pub mod extract;
pub mod intent;

use std::time::Instant;

use crate::browse::RetrievalEscalator;
use crate::core::AgentError;
use crate::tools::{hash_chain, CodeInterpreter, GeneralQa, MemoryCapability};

pub use extract::ExtractedParams;
pub use intent::{classify, select_route, Intent, Route, FALLBACK_ROUTE, ROUTES};

/// 文本消息的能力集合
pub struct IntentDispatcher {
    memory: MemoryCapability,
    compute: CodeInterpreter,
    retrieval: RetrievalEscalator,
    qa: GeneralQa,
}

impl IntentDispatcher {
    pub fn new(
        memory: MemoryCapability,
        compute: CodeInterpreter,
        retrieval: RetrievalEscalator,
        qa: GeneralQa,
    ) -> Self {
        Self {
            memory,
            compute,
            retrieval,
            qa,
        }
    }

    pub async fn dispatch(&self, text: &str) -> String {
        let start = Instant::now();
        let route = select_route(text);
        let intent = route.intent;
        tracing::info!(intent = ?intent, "dispatching");

        let result = match (route.extract)(text) {
            Ok(params) => self.run(params).await,
            Err(e) => Err(e),
        };

        let (ok, outcome) = match &result {
            Ok(_) => (true, "ok"),
            Err(AgentError::ExtractionFailure(_)) => (false, "extraction_failure"),
            Err(_) => (false, "error"),
        };
        let audit = serde_json::json!({
            "event": "capability_audit",
            "intent": intent.as_str(),
            "ok": ok,
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
        });
        tracing::info!(audit = %audit.to_string(), "capability");

        match result {
            Ok(text) => text,
            Err(e) => degrade(intent, e),
        }
    }

    async fn run(&self, params: ExtractedParams) -> Result<String, AgentError> {
        match params {
            ExtractedParams::Recall { query, prompt } => self.memory.recall(&query, &prompt).await,
            ExtractedParams::Store { request } => self.memory.store(&request).await,
            ExtractedParams::Compute { prompt } => self.compute.solve(&prompt).await,
            ExtractedParams::Retrieve { url, query } => Ok(self.retrieval.retrieve(&url, &query).await),
            ExtractedParams::Hash { input, algorithms } => hash_chain(&input, &algorithms),
            ExtractedParams::GeneralQa { prompt } => self.qa.answer(&prompt).await,
        }
    }
}

/// 处理器错误 → 面向用户的文本
fn degrade(intent: Intent, err: AgentError) -> String {
    match (intent, err) {
        (_, AgentError::ExtractionFailure(msg)) => msg,
        (Intent::Compute, e) => format!("Code interpreter error: {e}"),
        (Intent::Hash, e) => format!("Hashing execution error: {e}"),
        (Intent::Store | Intent::Recall, e @ AgentError::Memory(_)) => {
            tracing::error!(error = %e, "fact store unavailable");
            format!("Memory error: {e}")
        }
        (_, e) => {
            tracing::warn!(intent = ?intent, error = %e, "capability failed");
            format!("Sorry, I couldn't complete that request. {e}")
        }
    }
}
