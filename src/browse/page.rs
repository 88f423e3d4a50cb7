//! 页面接口：静态抓取与可交互会话
//!
//! 交互阶段只依赖这里的窄接口，不接触具体浏览器驱动。
//! - PageFetcher：一次性 GET，带超时与 User-Agent
//! - PageDriver / LiveSession：打开会话、读棋盘、点击格子、读状态区、关闭

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::browse::solver::Board;
use crate::core::AgentError;

/// 静态抓取：返回页面原始内容（HTML 源码）
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_static(&self, url: &str) -> Result<String, AgentError>;
}

/// 可交互会话的工厂
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 打开会话并等待棋盘就绪；失败或超时返回 SessionInitFailure
    async fn open_session(&self, url: &str) -> Result<Box<dyn LiveSession>, AgentError>;
}

/// 一个独占的实时页面会话；由打开它的 InteractiveSession 持有，结束时必须 close
#[async_trait]
pub trait LiveSession: Send {
    /// 读取 9 个格子
    async fn read_board(&mut self) -> Result<Board, AgentError>;

    /// 点击格子；格子不存在 / 已占用 / 已禁用返回 InvalidMove
    async fn click_cell(&mut self, index: usize) -> Result<(), AgentError>;

    /// 非阻塞读取状态区文本；不存在时返回 None（正常的轮询结果）
    async fn read_status(&mut self) -> Result<Option<String>, AgentError>;

    async fn close(&mut self) -> Result<(), AgentError>;
}

/// 使用现代浏览器 UA 的简化形式（部分站点拒绝无 UA 请求）
const USER_AGENT: &str = "Mozilla/5.0";

/// 基于 reqwest 的静态抓取
pub struct HttpPageFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpPageFetcher {
    pub fn new(timeout_secs: u64) -> Self {
        Self::with_timeout(Duration::from_secs(timeout_secs))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = match Client::builder().timeout(timeout).user_agent(USER_AGENT).build() {
            Ok(client) => client,
            Err(e) => {
                // 每个请求仍单独设置 timeout
                tracing::warn!(error = %e, "http client build failed, using default client");
                Client::new()
            }
        };
        Self { client, timeout }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_static(&self, url: &str) -> Result<String, AgentError> {
        tracing::info!(url = %url, "static fetch");
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AgentError::RetrievalFailure(format!("Request failed: {}", e)))?;
        if !resp.status().is_success() {
            return Err(AgentError::RetrievalFailure(format!("HTTP {}", resp.status())));
        }
        let mut body = resp
            .text()
            .await
            .map_err(|e| AgentError::RetrievalFailure(format!("Read body: {}", e)))?;

        // 去除 BOM
        if body.starts_with('\u{FEFF}') {
            body = body['\u{FEFF}'.len_utf8()..].to_string();
        }
        Ok(body)
    }
}

/// 未启用 feature "browser" 时使用：任何会话都无法打开
pub struct UnavailableDriver;

#[async_trait]
impl PageDriver for UnavailableDriver {
    async fn open_session(&self, url: &str) -> Result<Box<dyn LiveSession>, AgentError> {
        Err(AgentError::SessionInitFailure(format!(
            "no browser driver available for {url} (build with --features browser)"
        )))
    }
}

/// 句末常跟在 URL 后面、但不属于 URL 的字符
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '\'', '"'];

/// 去掉文本里 URL 后紧跟的标点（`https://a.com,` → `https://a.com`）
pub fn trim_trailing_punctuation(url: &str) -> &str {
    url.trim_end_matches(TRAILING_PUNCTUATION)
}

/// 从 URL 提取域名（小写，去掉端口与路径以及句末标点）
pub fn extract_domain(url: &str) -> Option<String> {
    let url = trim_trailing_punctuation(url.trim());
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let host = url.split(['/', '?', '#']).next()?;
    let host = host.rsplit('@').next()?;
    let host = trim_trailing_punctuation(host.split(':').next()?);
    if host.is_empty() {
        return None;
    }
    Some(host.to_lowercase())
}

/// 截断到前 max_chars 个字符（按字符而非字节）
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
