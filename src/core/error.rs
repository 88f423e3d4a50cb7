//! Agent 错误类型
//!
//! 每个能力处理器把自己的错误转成面向用户的文本；只有协议层（无可路由消息片段）才返回结构化错误。

use thiserror::Error;

use crate::llm::LlmError;

/// Agent 运行过程中可能出现的错误（参数抽取、网页抓取、浏览器自动化、LLM、存储等）
#[derive(Error, Debug)]
pub enum AgentError {
    /// 缺少必需参数：可由用户修正，原文回报
    #[error("{0}")]
    ExtractionFailure(String),

    /// 抓取页面失败（网络 / HTTP 状态）
    #[error("Retrieval failed: {0}")]
    RetrievalFailure(String),

    #[error("Session init failed: {0}")]
    SessionInitFailure(String),

    /// 点击了不存在或已占用的格子：求解器正确时不应出现，属于内部不变量被破坏
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Poll timeout: {0}")]
    PollTimeout(String),

    #[error("Completion failed: {0}")]
    CompletionFailure(#[from] LlmError),

    #[error("Memory store error: {0}")]
    Memory(String),

    #[error("Execution failed: {0}")]
    Execution(String),
}

impl AgentError {
    /// 是否为自动化层的不变量错误（需与普通超时 / 初始化失败区分记录）
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, AgentError::InvalidMove(_))
    }
}

impl From<rusqlite::Error> for AgentError {
    fn from(e: rusqlite::Error) -> Self {
        AgentError::Memory(e.to_string())
    }
}
