//! APE - 意图路由智能体
//!
//! 入口：初始化日志、加载配置、打开事实库，启动 JSON-RPC 服务，收到 Ctrl+C / SIGTERM 后优雅关闭。

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use ape::agent::create_agent_components;
use ape::config::load_config;
use ape::core::{FactStoreCleanup, ShutdownCoordinator, ShutdownManager};
use ape::memory::{FactMemory, SqliteFactStore};
use ape::server::{router, ServerState};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with(fmt::layer())
        .init();

    // 可选：第一个参数为额外的配置文件
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load config")?;

    let store = SqliteFactStore::open(&cfg.memory.path)
        .with_context(|| format!("Failed to open fact store at {}", cfg.memory.path.display()))?;
    let memory = Arc::new(FactMemory::new(Arc::new(store)));

    let agent = create_agent_components(&cfg, memory.clone());

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .context("Invalid server address")?;
    let state = Arc::new(ServerState {
        agent,
        public_url: format!("http://{}/", addr),
    });
    let app = router(state);

    let manager = Arc::new(ShutdownManager::new());
    manager.install_signal_handlers();
    let mut coordinator = ShutdownCoordinator::new();
    coordinator.register(FactStoreCleanup::new(memory));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("APE agent listening on http://{}", addr);

    let shutdown = Arc::clone(&manager);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.wait_for_shutdown().await })
        .await
        .context("Server error")?;

    coordinator.run_cleanup().await;
    Ok(())
}
