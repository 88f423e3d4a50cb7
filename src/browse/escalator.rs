//! 检索升级：先静态分析，答案无效且页面属于已知交互任务时才启动浏览器会话

use std::sync::Arc;

use crate::browse::interactive::{InteractiveSession, SessionOutcome};
use crate::browse::page::extract_domain;
use crate::browse::static_analyzer::StaticAnalyzer;

const EXHAUSTED_MESSAGE: &str = "Error: Played the game but did not find the code.";

pub struct RetrievalEscalator {
    analyzer: StaticAnalyzer,
    interactive: InteractiveSession,
    interactive_hosts: Vec<String>,
}

impl RetrievalEscalator {
    pub fn new(
        analyzer: StaticAnalyzer,
        interactive: InteractiveSession,
        interactive_hosts: Vec<String>,
    ) -> Self {
        let interactive_hosts = interactive_hosts
            .into_iter()
            .map(|h| h.trim().to_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        Self {
            analyzer,
            interactive,
            interactive_hosts,
        }
    }

    /// 域名是否在交互任务白名单中
    pub fn is_interactive_host(&self, url: &str) -> bool {
        extract_domain(url).is_some_and(|host| self.interactive_hosts.iter().any(|h| *h == host))
    }

    pub async fn retrieve(&self, url: &str, query: &str) -> String {
        match self.analyzer.analyze(url, query).await {
            Ok(candidate) if candidate.is_valid() => {
                tracing::info!(url = %url, stage = ?candidate.stage, "static answer accepted");
                return candidate.text;
            }
            Ok(candidate) => {
                tracing::info!(url = %url, answer = %candidate.text, "static answer inconclusive");
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "static analysis failed, treating as inconclusive");
            }
        }

        if !self.is_interactive_host(url) {
            return format!(
                "Static analysis did not find the answer ('{query}'). This page is not a known interactive task."
            );
        }

        tracing::info!(url = %url, "escalating to interactive session");
        match self.interactive.run(url).await {
            SessionOutcome::Found(candidate) if candidate.is_valid() => {
                tracing::info!(url = %url, stage = ?candidate.stage, "interactive answer accepted");
                candidate.text
            }
            SessionOutcome::Found(candidate) => {
                tracing::warn!(url = %url, answer = %candidate.text, "interactive answer rejected");
                EXHAUSTED_MESSAGE.to_string()
            }
            SessionOutcome::Exhausted => EXHAUSTED_MESSAGE.to_string(),
            SessionOutcome::Failed(reason) => format!("Interactive browsing error: {reason}"),
        }
    }
}
