//! 核心层：错误类型、有界重试、优雅关闭

pub mod error;
pub mod retry;
pub mod shutdown;

pub use error::AgentError;
pub use retry::{Attempts, RetryPolicy};
pub use shutdown::{FactStoreCleanup, ShutdownCoordinator, ShutdownManager, ShutdownReason};
