//! 记忆层：LLM 消息类型、长期事实存储

pub mod fact_store;
pub mod message;

pub use fact_store::{FactMemory, FactStore, InMemoryFactStore, SqliteFactStore, FACT_KEY_PREFIX};
pub use message::{Message, Role};
