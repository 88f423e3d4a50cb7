//! 有界重试原语
//!
//! 轮询类操作（状态区读取、会话就绪等待）统一使用 RetryPolicy：最大尝试次数、固定间隔、单次超时，
//! 由调用方按场景配置，不在各处手写 sleep 循环。

use std::future::Future;
use std::time::Duration;

use tokio::time::{error::Elapsed, sleep, timeout};

/// 重试策略：最多 max_attempts 次，相邻两次间隔 interval，每次尝试最多 attempt_timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            attempt_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// 返回尝试计数器；第一次 next() 立即返回，之后每次先等待 interval
    pub fn attempts(&self) -> Attempts {
        Attempts {
            policy: *self,
            taken: 0,
        }
    }

    /// 在单次超时内执行 fut
    pub async fn bounded<F: Future>(&self, fut: F) -> Result<F::Output, Elapsed> {
        timeout(self.attempt_timeout, fut).await
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1))
    }
}

/// 尝试计数器（由 RetryPolicy::attempts 创建）
#[derive(Debug)]
pub struct Attempts {
    policy: RetryPolicy,
    taken: u32,
}

impl Attempts {
    /// 下一次尝试的序号（从 1 开始）；次数用尽返回 None
    pub async fn next(&mut self) -> Option<u32> {
        if self.taken >= self.policy.max_attempts {
            return None;
        }
        if self.taken > 0 && !self.policy.interval.is_zero() {
            sleep(self.policy.interval).await;
        }
        self.taken += 1;
        Some(self.taken)
    }

    pub fn taken(&self) -> u32 {
        self.taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let mut attempts = policy.attempts();
        let mut seen = Vec::new();
        while let Some(n) = attempts.next().await {
            seen.push(n);
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(attempts.taken(), 3);
    }

    #[tokio::test]
    async fn test_zero_attempts_never_runs() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        let mut attempts = policy.attempts();
        assert!(attempts.next().await.is_none());
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let policy = RetryPolicy::new(1, Duration::ZERO)
            .with_attempt_timeout(Duration::from_millis(5));
        let result = policy.bounded(sleep(Duration::from_secs(5))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_bounded_passes_through_output() {
        let policy = RetryPolicy::default();
        let result = policy.bounded(async { 42 }).await;
        assert_eq!(result.ok(), Some(42));
    }
}
