//! 第一阶段：静态分析
//!
//! 抓取一次页面源码，截断到 max_content_chars，交给 LLM 在「只依据给定内容回答」的约束下回答问题。
//! 有效性判定：不含「Information not found」且含 14 位数字（日期前缀码）。

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::browse::page::{truncate_chars, PageFetcher};
use crate::core::AgentError;
use crate::llm::{CompletionOptions, LlmClient};
use crate::memory::Message;

/// LLM 在内容中找不到答案时的固定回复
pub const NOT_FOUND_SENTINEL: &str = "Information not found.";

const ANALYSIS_SYSTEM_PROMPT: &str = "You are a web page analysis assistant. Based on the provided HTML SOURCE CODE, your job is to answer the user's QUERY. Respond with only the specific information requested. If the information cannot be found, respond with 'Information not found.'";

/// 答案来源阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Static,
    Interactive,
}

/// 某一阶段给出的候选答案
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerCandidate {
    pub text: String,
    pub stage: Stage,
}

impl AnswerCandidate {
    pub fn new(text: impl Into<String>, stage: Stage) -> Self {
        Self {
            text: text.into(),
            stage,
        }
    }

    /// 是否可以直接作为答案返回
    pub fn is_valid(&self) -> bool {
        is_valid_answer(&self.text)
    }
}

fn fourteen_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{14}").expect("static regex"))
}

/// 不含 not-found 哨兵（大小写不敏感）且包含 14 位连续数字
pub fn is_valid_answer(text: &str) -> bool {
    let sentinel = NOT_FOUND_SENTINEL.trim_end_matches('.').to_lowercase();
    !text.trim().is_empty()
        && !text.to_lowercase().contains(&sentinel)
        && fourteen_digits().is_match(text)
}

/// 静态分析器：PageFetcher + LLM
pub struct StaticAnalyzer {
    fetcher: Arc<dyn PageFetcher>,
    llm: Arc<dyn LlmClient>,
    max_content_chars: usize,
}

impl StaticAnalyzer {
    pub fn new(fetcher: Arc<dyn PageFetcher>, llm: Arc<dyn LlmClient>, max_content_chars: usize) -> Self {
        Self {
            fetcher,
            llm,
            max_content_chars,
        }
    }

    pub async fn analyze(&self, url: &str, query: &str) -> Result<AnswerCandidate, AgentError> {
        let source = self.fetcher.fetch_static(url).await?;
        if source.trim().is_empty() {
            return Err(AgentError::RetrievalFailure(
                "Could not extract any text from the page.".to_string(),
            ));
        }

        let content = truncate_chars(&source, self.max_content_chars);
        let prompt = format!("HTML SOURCE CODE: \"\"\"{content}\"\"\"\n\nQUERY: \"{query}\"");
        let messages = vec![Message::system(ANALYSIS_SYSTEM_PROMPT), Message::user(prompt)];

        let answer = self
            .llm
            .complete(&messages, &CompletionOptions::default())
            .await?;
        tracing::info!(url = %url, chars = content.chars().count(), "static analysis answered");
        Ok(AnswerCandidate::new(answer, Stage::Static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use async_trait::async_trait;

    struct FixedPage(String);

    #[async_trait]
    impl PageFetcher for FixedPage {
        async fn fetch_static(&self, _url: &str) -> Result<String, AgentError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_validity_requires_fourteen_digits() {
        assert!(is_valid_answer("The code is 20261014123456"));
        assert!(!is_valid_answer("The code is 2026101412"));
        assert!(!is_valid_answer("Information not found. 20261014123456"));
        assert!(!is_valid_answer("information NOT found"));
        assert!(!is_valid_answer(""));
    }

    #[tokio::test]
    async fn test_analyze_truncates_content_and_constrains_role() {
        let page = "z".repeat(10_000);
        let llm = Arc::new(MockLlmClient::with_responses(["Information not found."]));
        let analyzer = StaticAnalyzer::new(Arc::new(FixedPage(page)), llm.clone(), 8000);

        let candidate = analyzer.analyze("https://example.com", "what is the code?").await.unwrap();
        assert_eq!(candidate.stage, Stage::Static);
        assert!(!candidate.is_valid());

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].messages[0].content.contains("Information not found"));
        let user = &calls[0].messages[1].content;
        assert_eq!(user.matches('z').count(), 8000);
        assert!(user.contains("QUERY: \"what is the code?\""));
    }

    #[tokio::test]
    async fn test_empty_page_is_retrieval_failure() {
        let llm = Arc::new(MockLlmClient::new());
        let analyzer = StaticAnalyzer::new(Arc::new(FixedPage("  ".into())), llm.clone(), 8000);
        let err = analyzer.analyze("https://example.com", "q").await.unwrap_err();
        assert!(matches!(err, AgentError::RetrievalFailure(_)));
        assert_eq!(llm.call_count(), 0);
    }
}
