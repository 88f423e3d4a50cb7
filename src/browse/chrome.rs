//! Headless Chrome 驱动（feature "browser"）
//!
//! 需系统已安装 Chrome/Chromium。所有 headless_chrome 调用都是阻塞的，统一放进 spawn_blocking。
//! 棋盘格子为 `.cell`，成功提示区为 `#congratulations`。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::{Browser, Tab};

use crate::browse::page::{LiveSession, PageDriver};
use crate::browse::solver::Board;
use crate::core::AgentError;

const CELL_SELECTOR: &str = ".cell";
const STATUS_SELECTOR: &str = "#congratulations";

const READ_CELLS_JS: &str =
    "JSON.stringify(Array.from(document.querySelectorAll('.cell')).map(c => c.innerText || ''))";

const READ_STATUS_JS: &str =
    "(() => { const el = document.querySelector('#congratulations'); return el ? (el.innerText || '') : null; })()";

/// 点击第 index 个格子；返回 ok / missing / filled / disabled
fn click_js(index: usize) -> String {
    format!(
        r#"(() => {{
            const cells = document.querySelectorAll('.cell');
            const el = cells[{index}];
            if (!el) return 'missing';
            if (el.disabled || el.classList.contains('disabled')) return 'disabled';
            if ((el.innerText || '').trim() !== '') return 'filled';
            el.click();
            return 'ok';
        }})()"#
    )
}

async fn blocking<T, F>(f: F) -> Result<T, AgentError>
where
    F: FnOnce() -> Result<T, AgentError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AgentError::Execution(format!("Task join: {}", e)))?
}

fn eval_string(tab: &Tab, js: &str) -> Result<Option<String>, String> {
    let result = tab.evaluate(js, false).map_err(|e| e.to_string())?;
    Ok(result
        .value
        .and_then(|v| v.as_str().map(|s| s.to_string())))
}

/// 每个会话启动独立的 Chrome 进程
pub struct ChromePageDriver {
    board_wait: Duration,
}

impl ChromePageDriver {
    pub fn new(board_wait: Duration) -> Self {
        Self { board_wait }
    }
}

#[async_trait]
impl PageDriver for ChromePageDriver {
    async fn open_session(&self, url: &str) -> Result<Box<dyn LiveSession>, AgentError> {
        let url = url.to_string();
        let wait = self.board_wait;
        tracing::info!(url = %url, "launching headless chrome");

        let (browser, tab) = blocking(move || {
            let browser = Browser::default().map_err(|e| {
                AgentError::SessionInitFailure(format!("Chrome launch failed: {}. Install Chrome/Chromium.", e))
            })?;
            let tab = browser
                .new_tab()
                .map_err(|e| AgentError::SessionInitFailure(format!("Browser tab failed: {}", e)))?;
            tab.navigate_to(&url)
                .map_err(|e| AgentError::SessionInitFailure(format!("Navigate failed: {}", e)))?;
            // 启动与导航受调用方 launch_budget 约束，这里只计棋盘等待
            tab.wait_for_element_with_custom_timeout(CELL_SELECTOR, wait)
                .map_err(|e| AgentError::SessionInitFailure(format!("Board not ready: {}", e)))?;
            Ok((browser, tab))
        })
        .await?;

        Ok(Box::new(ChromeSession {
            browser: Some(browser),
            tab: Some(tab),
        }))
    }
}

pub struct ChromeSession {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
}

impl ChromeSession {
    fn tab(&self) -> Result<Arc<Tab>, AgentError> {
        self.tab
            .clone()
            .ok_or_else(|| AgentError::Execution("browser session already closed".to_string()))
    }
}

#[async_trait]
impl LiveSession for ChromeSession {
    async fn read_board(&mut self) -> Result<Board, AgentError> {
        let tab = self.tab()?;
        let raw = blocking(move || {
            eval_string(&tab, READ_CELLS_JS)
                .map_err(|e| AgentError::Execution(format!("Read board failed: {}", e)))
        })
        .await?
        .unwrap_or_default();

        let glyphs: Vec<String> = serde_json::from_str(&raw)
            .map_err(|e| AgentError::Execution(format!("Board payload invalid: {}", e)))?;
        Board::from_glyphs(&glyphs).ok_or_else(|| {
            AgentError::Execution(format!("Unreadable board: {:?}", glyphs))
        })
    }

    async fn click_cell(&mut self, index: usize) -> Result<(), AgentError> {
        let tab = self.tab()?;
        let verdict = blocking(move || {
            eval_string(&tab, &click_js(index))
                .map_err(|e| AgentError::Execution(format!("Click failed: {}", e)))
        })
        .await?;

        match verdict.as_deref() {
            Some("ok") => Ok(()),
            Some(reason) => Err(AgentError::InvalidMove(format!("cell {index} is {reason}"))),
            None => Err(AgentError::InvalidMove(format!("cell {index} did not respond"))),
        }
    }

    async fn read_status(&mut self) -> Result<Option<String>, AgentError> {
        let tab = self.tab()?;
        let status = blocking(move || {
            eval_string(&tab, READ_STATUS_JS)
                .map_err(|e| AgentError::Execution(format!("Read {} failed: {}", STATUS_SELECTOR, e)))
        })
        .await?;
        Ok(status.filter(|s| !s.trim().is_empty()))
    }

    async fn close(&mut self) -> Result<(), AgentError> {
        let tab = self.tab.take();
        let browser = self.browser.take();
        blocking(move || {
            if let Some(tab) = tab {
                if let Err(e) = tab.close(true) {
                    tracing::debug!(error = %e, "tab close failed");
                }
            }
            drop(browser);
            Ok(())
        })
        .await
    }
}
