//! JSON-RPC 2.0 信封：请求解析、消息片段路由、回复规范化、Agent Card
//!
//! 与 HTTP 框架无关；server 模块只负责把 (状态码, JSON) 写回。

use serde::Deserialize;
use serde_json::{json, Value};

use crate::agent::{Agent, AgentRequest};
use crate::tools::vision::DEFAULT_IMAGE_PROMPT;

pub const INVALID_PARAMS: i64 = -32602;
pub const SERVER_ERROR: i64 = -32000;

/// 图像片段中依次尝试的数据键
const IMAGE_DATA_KEYS: [&str; 4] = ["base64", "data", "content", "image_data"];

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<RpcParams>,
    #[serde(default)]
    pub id: Value,
}

#[derive(Debug, Deserialize)]
pub struct RpcParams {
    #[serde(default)]
    pub message: Option<RpcMessage>,
}

#[derive(Debug, Deserialize)]
pub struct RpcMessage {
    #[serde(default, rename = "messageId")]
    pub message_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Value>,
}

/// 由消息片段决定路由：图像 + 文本 → 图像理解；仅文本 → 分发器；其他 → None
pub fn route_parts(parts: &[Value]) -> Option<AgentRequest> {
    let kind_of = |p: &&Value| p.get("kind").and_then(Value::as_str).map(str::to_string);
    let image = parts.iter().find(|p| kind_of(p).as_deref() == Some("image"));
    let text = parts.iter().find(|p| kind_of(p).as_deref() == Some("text"))?;

    match image {
        Some(image) => {
            let prompt = text
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_IMAGE_PROMPT)
                .to_string();
            let data = IMAGE_DATA_KEYS
                .iter()
                .find_map(|k| image.get(*k))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            Some(AgentRequest::Image { data, prompt })
        }
        None => {
            let text = text.get("text").and_then(Value::as_str).unwrap_or("");
            Some(AgentRequest::Text(text.to_string()))
        }
    }
}

/// 去掉 `*`、转小写、去首尾空白
pub fn normalize_reply(text: &str) -> String {
    text.replace('*', "").to_lowercase().trim().to_string()
}

fn rpc_error(code: i64, message: &str, id: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "error": { "code": code, "message": message },
        "id": id,
    })
}

/// 处理一次 POST /；返回 (HTTP 状态码, JSON-RPC 响应体)
pub async fn handle_rpc(agent: &Agent, body: &[u8]) -> (u16, Value) {
    let request: RpcRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "undecodable request body");
            return (500, rpc_error(SERVER_ERROR, &format!("Server error: {e}"), Value::Null));
        }
    };
    let id = request.id.clone();

    let routed = request
        .params
        .and_then(|p| p.message)
        .and_then(|m| {
            tracing::debug!(message_id = ?m.message_id, role = ?m.role, parts = m.parts.len(), "rpc message");
            route_parts(&m.parts)
        });
    let Some(routed) = routed else {
        return (
            400,
            rpc_error(INVALID_PARAMS, "Invalid params: No valid message parts found", id),
        );
    };

    tracing::info!(method = ?request.method, "handling message");
    let reply = normalize_reply(&agent.respond(routed).await);
    let message = json!({
        "messageId": uuid::Uuid::new_v4().to_string(),
        "role": "agent",
        "parts": [{ "kind": "text", "text": reply }],
    });
    (
        200,
        json!({ "jsonrpc": "2.0", "result": { "message": message }, "id": id }),
    )
}

/// GET /.well-known/agent-card.json
pub fn agent_card(endpoint_url: &str) -> Value {
    json!({
        "name": "APE AI Agent",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "An A2A agent with six basic capabilities for practicing agent design.",
        "endpoints": [{ "url": endpoint_url, "type": "JSON-RPC 2.0" }],
        "capabilities": [
            "llm-style general QA",
            "tool usage",
            "image understanding",
            "web browsing",
            "code execution",
            "memory"
        ]
    })
}
