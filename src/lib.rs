//! APE - 意图路由智能体
//!
//! 模块划分：
//! - **agent**: 能力组装与请求路由（供 HTTP 入口调用）
//! - **browse**: 自适应网页检索（静态分析 → 井字棋交互会话）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、有界重试、优雅关闭
//! - **dispatch**: 意图识别、参数抽取与分发
//! - **llm**: LLM 客户端抽象与实现（Ollama / OpenAI 兼容 / Mock）
//! - **memory**: 消息类型与长期事实存储（SQLite）
//! - **protocol**: JSON-RPC 2.0 信封与 Agent Card
//! - **server**: axum 路由（feature "server"）
//! - **tools**: 能力处理器（问答、代码解释器、哈希、图像、记忆）

pub mod agent;
pub mod browse;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod llm;
pub mod memory;
pub mod protocol;
#[cfg(feature = "server")]
pub mod server;
pub mod tools;

pub use agent::{create_agent_components, Agent, AgentRequest};
pub use dispatch::{Intent, IntentDispatcher};
