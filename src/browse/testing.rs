//! 测试用假页面：内存中的井字棋对局，对手总是下第一个空格

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::browse::page::{LiveSession, PageDriver};
use crate::browse::solver::{Board, Mark};
use crate::core::AgentError;

pub(crate) fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
}

/// 假页面的行为脚本
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeScript {
    /// 点击次数达到该值后状态区出现 status_text
    pub status_after_clicks: Option<usize>,
    pub status_text: String,
    pub fail_open: bool,
    pub reject_clicks: bool,
    pub hang_board: bool,
    /// 前 N 次读状态区返回错误
    pub failing_status_reads: usize,
    /// 错误之后再有 N 次读状态区挂起
    pub hanging_status_reads: usize,
    /// open_session 就绪前的耗时
    pub open_delay: Option<Duration>,
}

pub(crate) struct FakeDriver {
    script: FakeScript,
    pub opens: AtomicUsize,
    pub clicks: Arc<AtomicUsize>,
    pub status_reads: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl FakeDriver {
    pub fn new(script: FakeScript) -> Self {
        Self {
            script,
            opens: AtomicUsize::new(0),
            clicks: Arc::new(AtomicUsize::new(0)),
            status_reads: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn open_session(&self, _url: &str) -> Result<Box<dyn LiveSession>, AgentError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.script.open_delay {
            tokio::time::sleep(delay).await;
        }
        if self.script.fail_open {
            return Err(AgentError::SessionInitFailure("no board on page".into()));
        }
        Ok(Box::new(FakeSession {
            board: Board::empty(),
            clicks: 0,
            status_reads: 0,
            script: self.script.clone(),
            click_counter: self.clicks.clone(),
            status_counter: self.status_reads.clone(),
            close_counter: self.closes.clone(),
        }))
    }
}

struct FakeSession {
    board: Board,
    clicks: usize,
    status_reads: usize,
    script: FakeScript,
    click_counter: Arc<AtomicUsize>,
    status_counter: Arc<AtomicUsize>,
    close_counter: Arc<AtomicUsize>,
}

#[async_trait]
impl LiveSession for FakeSession {
    async fn read_board(&mut self) -> Result<Board, AgentError> {
        if self.script.hang_board {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(self.board)
    }

    async fn click_cell(&mut self, index: usize) -> Result<(), AgentError> {
        if self.script.reject_clicks {
            return Err(AgentError::InvalidMove(format!("cell {index} is disabled")));
        }
        self.board = self
            .board
            .with_move(index, Mark::X)
            .ok_or_else(|| AgentError::InvalidMove(format!("cell {index} is occupied")))?;
        self.clicks += 1;
        self.click_counter.fetch_add(1, Ordering::SeqCst);

        let reply = self.board.empty_cells().next();
        if let (false, Some(reply)) = (self.board.is_terminal(), reply) {
            if let Some(next) = self.board.with_move(reply, Mark::O) {
                self.board = next;
            }
        }
        Ok(())
    }

    async fn read_status(&mut self) -> Result<Option<String>, AgentError> {
        self.status_counter.fetch_add(1, Ordering::SeqCst);
        self.status_reads += 1;
        if self.status_reads <= self.script.failing_status_reads {
            return Err(AgentError::RetrievalFailure("status region detached".into()));
        }
        if self.status_reads - self.script.failing_status_reads <= self.script.hanging_status_reads {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        match self.script.status_after_clicks {
            Some(n) if self.clicks >= n => Ok(Some(self.script.status_text.clone())),
            _ => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<(), AgentError> {
        self.close_counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
