//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 按顺序弹出预设回复；预设用尽时回显最后一条 User 消息。记录每次调用，便于断言调用次数与 prompt。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{CompletionOptions, LlmClient, LlmError};
use crate::memory::{Message, Role};

/// 一次被记录的调用
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub options: CompletionOptions,
}

/// Mock 客户端
#[derive(Debug, Default)]
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预设若干条成功回复
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for r in responses {
            mock.push(Ok(r.into()));
        }
        mock
    }

    /// 追加一条预设结果（可为错误）
    pub fn push(&self, response: Result<String, LlmError>) {
        if let Ok(mut q) = self.responses.lock() {
            q.push_back(response);
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn next_response(&self, messages: &[Message]) -> Result<String, LlmError> {
        let scripted = self.responses.lock().ok().and_then(|mut q| q.pop_front());
        scripted.unwrap_or_else(|| {
            let last_user = messages
                .iter()
                .rev()
                .find(|m| matches!(m.role, Role::User))
                .map(|m| m.content.as_str())
                .unwrap_or("(no input)");
            Ok(format!("Echo from Mock: {last_user}"))
        })
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                messages: messages.to_vec(),
                options: options.clone(),
            });
        }
        self.next_response(messages)
    }

    async fn describe_image(&self, prompt: &str, image: &[u8]) -> Result<String, LlmError> {
        let messages = vec![Message::user(prompt)];
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                messages: messages.clone(),
                options: CompletionOptions::default(),
            });
        }
        let scripted = self.responses.lock().ok().and_then(|mut q| q.pop_front());
        scripted.unwrap_or_else(|| Ok(format!("Mock image of {} bytes", image.len())))
    }
}
