//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `APE__*` 覆盖（双下划线表示嵌套，如 `APE__LLM__PROVIDER=openai`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub llm: LlmSection,
    pub memory: MemorySection,
    pub browse: BrowseSection,
    pub compute: ComputeSection,
}

/// [server] 段：JSON-RPC 监听地址
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// [llm] 段：后端选择、模型与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：ollama / openai
    pub provider: String,
    pub model: String,
    /// 图像理解模型（仅 ollama）
    pub vision_model: String,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "llama3".to_string(),
            vision_model: "moondream".to_string(),
            base_url: None,
            timeout_secs: 60,
        }
    }
}

/// [memory] 段：事实库 SQLite 文件路径
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemorySection {
    pub path: PathBuf,
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("agent_memory.db"),
        }
    }
}

/// [browse] 段：静态抓取与交互式会话的超时、轮数、轮询参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowseSection {
    pub static_timeout_secs: u64,
    /// 交给 LLM 的页面源码最大字符数
    pub max_content_chars: usize,
    /// 已知交互式任务页面的域名白名单
    pub interactive_hosts: Vec<String>,
    /// 最多落子次数
    pub turn_budget: u32,
    /// 每次落子后读取状态区的次数
    pub poll_attempts: u32,
    pub poll_interval_ms: u64,
    /// 启动浏览器并导航到页面的上限
    pub launch_timeout_secs: u64,
    /// 导航完成后等待棋盘出现的上限
    pub session_wait_secs: u64,
    /// 单次读棋盘 / 点击 / 读状态的上限
    pub action_timeout_secs: u64,
}

impl Default for BrowseSection {
    fn default() -> Self {
        Self {
            static_timeout_secs: 10,
            max_content_chars: 8000,
            interactive_hosts: vec!["ttt.puppy9.com".to_string()],
            turn_budget: 5,
            poll_attempts: 5,
            poll_interval_ms: 1000,
            launch_timeout_secs: 30,
            session_wait_secs: 10,
            action_timeout_secs: 10,
        }
    }
}

/// [compute] 段：代码解释器
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ComputeSection {
    pub interpreter: String,
    pub timeout_secs: u64,
}

impl Default for ComputeSection {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            timeout_secs: 30,
        }
    }
}

/// 从 config 目录加载配置，环境变量 APE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 APE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("APE")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("browse.interactive_hosts")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_constants() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.llm.model, "llama3");
        assert_eq!(cfg.browse.max_content_chars, 8000);
        assert_eq!(cfg.browse.turn_budget, 5);
        assert_eq!(cfg.browse.poll_attempts, 5);
        assert_eq!(cfg.browse.launch_timeout_secs, 30);
        assert_eq!(cfg.browse.interactive_hosts, vec!["ttt.puppy9.com".to_string()]);
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ape.toml");
        std::fs::write(
            &path,
            "[browse]\nturn_budget = 3\n\n[llm]\nprovider = \"openai\"\n",
        )
        .unwrap();

        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.browse.turn_budget, 3);
        assert_eq!(cfg.browse.poll_attempts, 5);
        assert_eq!(cfg.llm.provider, "openai");
    }
}
