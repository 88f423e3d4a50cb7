//! JSON-RPC 入口集成测试：axum Router + Mock LLM + 假页面

#[cfg(test)]
#[cfg(feature = "server")]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use ape::agent::create_agent_with;
    use ape::browse::{LiveSession, PageDriver, PageFetcher};
    use ape::config::AppConfig;
    use ape::core::AgentError;
    use ape::llm::MockLlmClient;
    use ape::memory::{FactMemory, InMemoryFactStore};
    use ape::server::{router, ServerState};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct StaticPage;

    #[async_trait]
    impl PageFetcher for StaticPage {
        async fn fetch_static(&self, _url: &str) -> Result<String, AgentError> {
            Ok("<html><p>today's code: 20261014120000</p></html>".to_string())
        }
    }

    #[derive(Default)]
    struct CountingDriver {
        opens: AtomicUsize,
    }

    #[async_trait]
    impl PageDriver for CountingDriver {
        async fn open_session(&self, _url: &str) -> Result<Box<dyn LiveSession>, AgentError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            Err(AgentError::SessionInitFailure("no browser in tests".into()))
        }
    }

    fn app(llm: Arc<MockLlmClient>, driver: Arc<CountingDriver>) -> axum::Router {
        let cfg = AppConfig::default();
        let memory = Arc::new(FactMemory::new(Arc::new(InMemoryFactStore::new())));
        let agent = create_agent_with(&cfg, llm, memory, Arc::new(StaticPage), driver);
        router(Arc::new(ServerState {
            agent,
            public_url: "http://127.0.0.1:8080/".to_string(),
        }))
    }

    fn message(parts: Value) -> Value {
        json!({
            "jsonrpc": "2.0",
            "method": "message/send",
            "params": { "message": { "messageId": "m-1", "role": "user", "parts": parts } },
            "id": 7
        })
    }

    async fn post(app: axum::Router, body: String) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn reply_text(v: &Value) -> &str {
        v["result"]["message"]["parts"][0]["text"].as_str().unwrap()
    }

    #[tokio::test]
    async fn test_text_reply_is_normalized() {
        let llm = Arc::new(MockLlmClient::with_responses(["  **Rayleigh** Scattering\n"]));
        let app = app(llm, Arc::new(CountingDriver::default()));

        let (status, v) = post(app, message(json!([{"kind": "text", "text": "Why is the sky blue?"}])).to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["id"], 7);
        assert_eq!(v["result"]["message"]["role"], "agent");
        assert_eq!(reply_text(&v), "rayleigh scattering");
        assert_eq!(v["result"]["message"]["messageId"].as_str().map(str::len), Some(36));
    }

    #[tokio::test]
    async fn test_no_parts_is_invalid_params() {
        let app = app(Arc::new(MockLlmClient::new()), Arc::new(CountingDriver::default()));
        let (status, v) = post(app, message(json!([])).to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["error"]["code"], -32602);
        assert_eq!(v["error"]["message"], "Invalid params: No valid message parts found");
        assert_eq!(v["id"], 7);
    }

    #[tokio::test]
    async fn test_missing_message_is_invalid_params() {
        let app = app(Arc::new(MockLlmClient::new()), Arc::new(CountingDriver::default()));
        let (status, v) = post(app, json!({"jsonrpc": "2.0", "id": 1, "params": {}}).to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_server_error() {
        let app = app(Arc::new(MockLlmClient::new()), Arc::new(CountingDriver::default()));
        let (status, v) = post(app, "{not json".to_string()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(v["error"]["code"], -32000);
    }

    #[tokio::test]
    async fn test_valid_static_answer_skips_interactive_session() {
        let llm = Arc::new(MockLlmClient::with_responses(["The code is 20261014120000"]));
        let driver = Arc::new(CountingDriver::default());
        let app = app(llm, driver.clone());

        let (status, v) = post(
            app,
            message(json!([{"kind": "text", "text": "What is the code at https://ttt.puppy9.com ?"}])).to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply_text(&v), "the code is 20261014120000");
        assert_eq!(driver.opens.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_interactive_failure_is_reported_as_text() {
        let llm = Arc::new(MockLlmClient::with_responses(["Information not found."]));
        let driver = Arc::new(CountingDriver::default());
        let app = app(llm, driver.clone());

        let (_, v) = post(
            app,
            message(json!([{"kind": "text", "text": "browse https://ttt.puppy9.com and get the code"}])).to_string(),
        )
        .await;
        assert!(reply_text(&v).starts_with("interactive browsing error: session init failed"));
        assert_eq!(driver.opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hash_over_rpc() {
        let app = app(Arc::new(MockLlmClient::new()), Arc::new(CountingDriver::default()));
        let (_, v) = post(
            app,
            message(json!([{"kind": "text", "text": "Hash the string \"abc\" with md5"}])).to_string(),
        )
        .await;
        assert_eq!(reply_text(&v), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[tokio::test]
    async fn test_image_part_with_text() {
        let llm = Arc::new(MockLlmClient::with_responses(["A Red Square"]));
        let app = app(llm, Arc::new(CountingDriver::default()));
        let (_, v) = post(
            app,
            message(json!([
                {"kind": "image", "base64": "iVBORw0KGgoAAAANSUhEUg=="},
                {"kind": "text", "text": "What is in this picture?"}
            ]))
            .to_string(),
        )
        .await;
        assert_eq!(reply_text(&v), "a red square");
    }

    #[tokio::test]
    async fn test_agent_card() {
        let app = app(Arc::new(MockLlmClient::new()), Arc::new(CountingDriver::default()));
        let req = Request::builder()
            .uri("/.well-known/agent-card.json")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let card: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(card["name"], "APE AI Agent");
        assert_eq!(card["endpoints"][0]["url"], "http://127.0.0.1:8080/");
    }
}
