//! Shared test harness: an in-process server over the in-memory store, with
//! the inference endpoint mocked by wiremock.

use axum_test::TestServer;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::json;
use std::sync::Arc;
use tradelens::db::MemoryStore;
use tradelens::extraction::HttpInferenceClient;
use tradelens::{AppState, Config, build_router};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub inference: MockServer,
    pub user_id: Uuid,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Spawn the app with a config tweak applied before wiring.
pub async fn spawn_app_with(mutate: impl FnOnce(&mut Config)) -> TestApp {
    let inference = MockServer::start().await;

    let mut config = Config::default();
    config.inference.base_url = inference.uri();
    config.inference.api_key = Some("test-key".to_string());
    mutate(&mut config);

    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(HttpInferenceClient::new(&config.inference).expect("inference client"));
    let state = AppState::new(config, store.clone(), client);
    let server = TestServer::new(build_router(state)).expect("test server");

    TestApp {
        server,
        store,
        inference,
        user_id: Uuid::new_v4(),
    }
}

impl TestApp {
    /// Mount a successful chat completion returning `content`.
    pub async fn mock_completion(&self, content: &str, tokens_in: u64, tokens_out: u64) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": content } }],
                "usage": { "prompt_tokens": tokens_in, "completion_tokens": tokens_out }
            })))
            .mount(&self.inference)
            .await;
    }

    /// Mount an upstream failure with the given status.
    pub async fn mock_completion_error(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body.to_string()))
            .mount(&self.inference)
            .await;
    }

    /// POST an extraction request as the harness user.
    pub async fn post_extraction(&self, body: serde_json::Value) -> axum_test::TestResponse {
        self.server
            .post("/api/v1/extractions")
            .add_header("x-tradelens-user", self.user_id.to_string())
            .json(&body)
            .await
    }

    pub async fn get_authed(&self, url: &str) -> axum_test::TestResponse {
        self.server
            .get(url)
            .add_header("x-tradelens-user", self.user_id.to_string())
            .await
    }
}

/// A tiny valid screenshot stand-in, base64-encoded.
pub fn sample_image() -> String {
    STANDARD.encode(b"fake png bytes for testing")
}

/// A single-trade model response body.
pub fn one_trade_json() -> &'static str {
    r#"[{"symbol":"BTCUSDT","side":"long","entry_price":42000.5,"exit_price":43750.0,"position_size":0.5,"realized_pnl":874.75,"opened_at":"2024-01-01 08:30","closed_at":"2024-01-02 11:00"}]"#
}
