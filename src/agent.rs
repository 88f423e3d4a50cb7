//! Headless Agent 运行时
//!
//! create_agent_components 按配置组装全部能力（LLM、事实库、检索升级、代码解释器、图像理解），
//! Agent::respond 对一条已解析的请求给出文本回复。HTTP 入口只依赖这里。

use std::sync::Arc;
use std::time::Duration;

use crate::browse::{
    HttpPageFetcher, InteractiveConfig, InteractiveSession, PageDriver, PageFetcher,
    RetrievalEscalator, StaticAnalyzer,
};
use crate::config::AppConfig;
use crate::dispatch::IntentDispatcher;
use crate::llm::{create_llm_from_config, LlmClient};
use crate::memory::FactMemory;
use crate::tools::{CodeInterpreter, GeneralQa, ImageDescriber, MemoryCapability};

/// 一条可路由的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentRequest {
    Text(String),
    /// data 为 None 表示图像片段里没有可识别的数据键
    Image { data: Option<String>, prompt: String },
}

/// 预构建的能力集合，可被多个请求共享
pub struct Agent {
    dispatcher: IntentDispatcher,
    vision: ImageDescriber,
}

impl Agent {
    pub async fn respond(&self, request: AgentRequest) -> String {
        match request {
            AgentRequest::Text(text) => self.dispatcher.dispatch(&text).await,
            AgentRequest::Image { data: None, .. } => {
                "Error: Image part received but no valid image data key was found.".to_string()
            }
            AgentRequest::Image {
                data: Some(data),
                prompt,
            } => self.vision.describe(&data, &prompt).await,
        }
    }
}

/// 交互阶段使用的驱动：启用 browser feature 时为 Headless Chrome，否则所有会话都无法打开
pub fn default_page_driver(cfg: &AppConfig) -> Arc<dyn PageDriver> {
    #[cfg(feature = "browser")]
    {
        Arc::new(crate::browse::ChromePageDriver::new(Duration::from_secs(
            cfg.browse.session_wait_secs,
        )))
    }
    #[cfg(not(feature = "browser"))]
    {
        tracing::warn!(
            session_wait = ?Duration::from_secs(cfg.browse.session_wait_secs),
            "built without the browser feature, interactive retrieval is unavailable"
        );
        Arc::new(crate::browse::UnavailableDriver)
    }
}

/// 按配置创建 Agent：LLM 后端、reqwest 抓取器、默认浏览器驱动
pub fn create_agent_components(cfg: &AppConfig, memory: Arc<FactMemory>) -> Agent {
    let llm = create_llm_from_config(cfg);
    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpPageFetcher::new(cfg.browse.static_timeout_secs));
    let driver = default_page_driver(cfg);
    create_agent_with(cfg, llm, memory, fetcher, driver)
}

/// 注入全部协作方（测试与自定义部署）
pub fn create_agent_with(
    cfg: &AppConfig,
    llm: Arc<dyn LlmClient>,
    memory: Arc<FactMemory>,
    fetcher: Arc<dyn PageFetcher>,
    driver: Arc<dyn PageDriver>,
) -> Agent {
    let retrieval = RetrievalEscalator::new(
        StaticAnalyzer::new(fetcher, llm.clone(), cfg.browse.max_content_chars),
        InteractiveSession::new(driver, InteractiveConfig::from_section(&cfg.browse)),
        cfg.browse.interactive_hosts.clone(),
    );
    let dispatcher = IntentDispatcher::new(
        MemoryCapability::new(memory, llm.clone()),
        CodeInterpreter::new(llm.clone(), cfg.compute.interpreter.clone(), cfg.compute.timeout_secs),
        retrieval,
        GeneralQa::new(llm.clone()),
    );
    Agent {
        dispatcher,
        vision: ImageDescriber::new(llm),
    }
}
