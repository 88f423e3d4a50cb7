//! 第二阶段：交互式会话（状态机）
//!
//! Init → AwaitingMove → Polling → Found | Exhausted | Failed
//!
//! - AwaitingMove：读棋盘、minimax 选点、点击
//! - Polling：按 RetryPolicy 读取状态区，找到日期前缀为当天（UTC）的 14 位码即 Found
//! - 落子次数用尽或求解器无子可下 → Exhausted；任何意外错误 → Failed
//!
//! 无论以哪种终态结束，打开的会话都恰好 close 一次。

use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use regex::Regex;

use crate::browse::page::{LiveSession, PageDriver};
use crate::browse::solver::{best_move, Mark};
use crate::browse::static_analyzer::{AnswerCandidate, Stage};
use crate::config::BrowseSection;
use crate::core::{AgentError, RetryPolicy};

/// 会话参数
#[derive(Debug, Clone)]
pub struct InteractiveConfig {
    /// 最多落子次数
    pub turn_budget: u32,
    /// 每步之后读取状态区的策略（次数、间隔、单次超时）
    pub poll: RetryPolicy,
    /// 启动浏览器并导航到页面的上限
    pub launch_budget: Duration,
    /// 导航完成后等待棋盘出现的上限
    pub session_wait: Duration,
    /// 单次读棋盘 / 点击的上限
    pub action_timeout: Duration,
}

impl InteractiveConfig {
    pub fn from_section(browse: &BrowseSection) -> Self {
        let action_timeout = Duration::from_secs(browse.action_timeout_secs);
        Self {
            turn_budget: browse.turn_budget,
            poll: RetryPolicy::new(browse.poll_attempts, Duration::from_millis(browse.poll_interval_ms))
                .with_attempt_timeout(action_timeout),
            launch_budget: Duration::from_secs(browse.launch_timeout_secs),
            session_wait: Duration::from_secs(browse.session_wait_secs),
            action_timeout,
        }
    }

    /// open_session 整体上限：启动、导航与棋盘等待各占一份
    pub fn open_deadline(&self) -> Duration {
        self.launch_budget + self.session_wait
    }
}

impl Default for InteractiveConfig {
    fn default() -> Self {
        Self::from_section(&BrowseSection::default())
    }
}

/// 状态机状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Init,
    AwaitingMove { turn: u32 },
    Polling { turn: u32 },
    Found(String),
    Exhausted,
    Failed(String),
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Found(_) | SessionState::Exhausted | SessionState::Failed(_)
        )
    }
}

/// 一次运行的终态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// 交互阶段取得的答案（stage 恒为 Interactive）
    Found(AnswerCandidate),
    Exhausted,
    Failed(String),
}

fn code_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{14})\b").expect("static regex"))
}

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

fn live(session: &mut Option<Box<dyn LiveSession>>) -> Result<&mut dyn LiveSession, AgentError> {
    match session.as_deref_mut() {
        Some(live) => Ok(live),
        None => Err(AgentError::SessionInitFailure("session is not open".into())),
    }
}

/// 交互式会话：驱动 PageDriver 打开的页面，求解器执 X
pub struct InteractiveSession {
    driver: Arc<dyn PageDriver>,
    config: InteractiveConfig,
    player: Mark,
    today: fn() -> NaiveDate,
}

impl InteractiveSession {
    pub fn new(driver: Arc<dyn PageDriver>, config: InteractiveConfig) -> Self {
        Self {
            driver,
            config,
            player: Mark::X,
            today: utc_today,
        }
    }

    /// 替换「今天」的来源（新鲜度校验用）
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub async fn run(&self, url: &str) -> SessionOutcome {
        tracing::info!(url = %url, "interactive session start");

        let mut session: Option<Box<dyn LiveSession>> = None;
        let mut state = SessionState::Init;
        let outcome = loop {
            tracing::debug!(state = ?state, terminal = state.is_terminal(), "interactive state");
            let step = match state {
                SessionState::Found(code) => {
                    break SessionOutcome::Found(AnswerCandidate::new(code, Stage::Interactive))
                }
                SessionState::Exhausted => break SessionOutcome::Exhausted,
                SessionState::Failed(reason) => break SessionOutcome::Failed(reason),
                SessionState::Init => match self.open(url).await {
                    Ok(opened) => {
                        session = Some(opened);
                        Ok(SessionState::AwaitingMove { turn: 1 })
                    }
                    Err(e) => Err(e),
                },
                SessionState::AwaitingMove { turn } => match live(&mut session) {
                    Ok(live) => self.play(turn, live).await,
                    Err(e) => Err(e),
                },
                SessionState::Polling { turn } => match live(&mut session) {
                    Ok(live) => Ok(self.poll(turn, live).await),
                    Err(e) => Err(e),
                },
            };
            state = match step {
                Ok(next) => next,
                Err(e) if e.is_invariant_violation() => {
                    tracing::error!(url = %url, error = %e, "solver chose an unplayable cell");
                    SessionState::Failed(e.to_string())
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "interactive session failed");
                    SessionState::Failed(e.to_string())
                }
            };
        };

        if let Some(mut session) = session {
            if let Err(e) = session.close().await {
                tracing::warn!(url = %url, error = %e, "session close failed");
            }
        }
        tracing::info!(url = %url, outcome = ?outcome, "interactive session finished");
        outcome
    }

    /// Init：在 open_deadline 内拿到已就绪的会话
    async fn open(&self, url: &str) -> Result<Box<dyn LiveSession>, AgentError> {
        let deadline = self.config.open_deadline();
        tokio::time::timeout(deadline, self.driver.open_session(url))
            .await
            .map_err(|_| AgentError::SessionInitFailure(format!("board not ready after {deadline:?}")))?
    }

    /// AwaitingMove：读棋盘、选点、点击
    async fn play(&self, turn: u32, session: &mut dyn LiveSession) -> Result<SessionState, AgentError> {
        if turn > self.config.turn_budget {
            return Ok(SessionState::Exhausted);
        }
        let board = self.act("read board", session.read_board()).await?;
        match best_move(&board, self.player) {
            None => {
                tracing::info!(turn, board = %board, "no move left");
                Ok(SessionState::Exhausted)
            }
            Some(index) => {
                tracing::info!(turn, board = %board, index, "playing move");
                self.act("click cell", session.click_cell(index)).await?;
                Ok(SessionState::Polling { turn })
            }
        }
    }

    /// Polling：有新鲜码即 Found，否则进入下一步或用尽
    async fn poll(&self, turn: u32, session: &mut dyn LiveSession) -> SessionState {
        match self.poll_for_code(session).await {
            Some(code) => SessionState::Found(code),
            None if turn < self.config.turn_budget => SessionState::AwaitingMove { turn: turn + 1 },
            None => SessionState::Exhausted,
        }
    }

    /// 单步操作加超时；超时映射为 PollTimeout
    async fn act<T>(
        &self,
        what: &str,
        fut: impl Future<Output = Result<T, AgentError>>,
    ) -> Result<T, AgentError> {
        tokio::time::timeout(self.config.action_timeout, fut)
            .await
            .map_err(|_| {
                AgentError::PollTimeout(format!(
                    "{what} exceeded {}s",
                    self.config.action_timeout.as_secs()
                ))
            })?
    }

    /// 读取状态区直到出现新鲜码或次数用尽；读取失败视为「暂无」继续轮询
    async fn poll_for_code(&self, session: &mut dyn LiveSession) -> Option<String> {
        let mut attempts = self.config.poll.attempts();
        while let Some(attempt) = attempts.next().await {
            let status = match self.config.poll.bounded(session.read_status()).await {
                Ok(Ok(status)) => status,
                Ok(Err(e)) => {
                    tracing::debug!(attempt, error = %e, "status read failed");
                    None
                }
                Err(_) => {
                    tracing::debug!(attempt, "status read timed out");
                    None
                }
            };
            if let Some(code) = status.as_deref().and_then(|text| self.fresh_code(text)) {
                tracing::info!(attempt, code = %code, "success code found");
                return Some(code);
            }
        }
        None
    }

    /// 找出前 8 位等于当天 UTC 日期（YYYYMMDD）的 14 位码
    fn fresh_code(&self, text: &str) -> Option<String> {
        let expected = (self.today)().format("%Y%m%d").to_string();
        let mut stale = Vec::new();
        for caps in code_pattern().captures_iter(text) {
            let code = &caps[1];
            if code.starts_with(&expected) {
                return Some(code.to_string());
            }
            stale.push(code.to_string());
        }
        if !stale.is_empty() {
            // 跨零点运行时页面码可能仍是前一天的日期
            tracing::warn!(expected = %expected, found = ?stale, "code date prefix does not match current UTC date");
        }
        None
    }
}
