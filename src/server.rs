//! HTTP 入口（feature "server"）
//!
//! - POST / ：JSON-RPC 2.0 消息
//! - GET /.well-known/agent-card.json ：能力说明
//! - GET /health

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

use crate::agent::Agent;
use crate::protocol::{agent_card, handle_rpc};

pub struct ServerState {
    pub agent: Agent,
    /// 写进 Agent Card 的对外地址
    pub public_url: String,
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", post(handle_message))
        .route("/.well-known/agent-card.json", get(serve_agent_card))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}

async fn handle_message(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let (status, response) = handle_rpc(&state.agent, &body).await;
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response))
}

async fn serve_agent_card(State(state): State<Arc<ServerState>>) -> Json<Value> {
    Json(agent_card(&state.public_url))
}
