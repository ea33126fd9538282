use adbhutam::config::{Config, ResponseMode};
use adbhutam::gateway::{MAX_BODY_SIZE, run_gateway_with_listener};
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct GatewayTestServer {
    port: u16,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
    _workspace: TempDir,
}

impl GatewayTestServer {
    async fn start(configure: impl FnOnce(&mut Config)) -> Self {
        let workspace = TempDir::new().expect("temp workspace should be created");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral gateway listener should bind");
        let port = listener
            .local_addr()
            .expect("ephemeral gateway listener should expose local address")
            .port();

        let mut config = Config {
            workspace_dir: workspace.path().to_path_buf(),
            config_path: workspace.path().join("config.toml"),
            api_key: Some("sk-test-key".to_string()),
            ..Config::default()
        };
        configure(&mut config);

        let handle = tokio::spawn(async move {
            run_gateway_with_listener("127.0.0.1", listener, config).await
        });

        wait_until_gateway_ready(port).await;

        Self {
            port,
            handle,
            _workspace: workspace,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{path}", self.port)
    }
}

impl Drop for GatewayTestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn wait_until_gateway_ready(port: u16) {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .expect("reqwest client should be built");

    for _ in 0..80 {
        let health = client
            .get(format!("http://127.0.0.1:{port}/health"))
            .send()
            .await;
        if matches!(health, Ok(resp) if resp.status() == StatusCode::OK) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("gateway did not become ready on port {port}");
}

async fn post_run(server: &GatewayTestServer, body: Value) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(server.url("/run"))
        .json(&body)
        .send()
        .await
        .expect("run request should be sent");
    let status = response.status();
    let json = response.json().await.expect("run response should be JSON");
    (status, json)
}

#[tokio::test]
async fn banner_and_health() {
    let server = GatewayTestServer::start(|_| {}).await;

    let banner = reqwest::get(server.url("/")).await.unwrap();
    assert_eq!(banner.status(), StatusCode::OK);
    assert_eq!(banner.text().await.unwrap(), "Adbhutam API is running");

    let health: Value = reqwest::get(server.url("/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"status": "ok"}));
}

#[tokio::test]
async fn run_returns_full_trace_for_clear_request() {
    let server = GatewayTestServer::start(|_| {}).await;

    let (status, body) = post_run(&server, json!({"input": "please fix this bug in my code"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let output = &body["output"];
    assert_eq!(output["pipeline"].as_array().unwrap().len(), 6);
    assert_eq!(output["trace"][0]["stage"], "understand");
    assert_eq!(output["trace"][0]["intent"]["action"], "fix");
    assert_eq!(output["trace"][0]["intent"]["target"], "code");
    assert_eq!(output["trace"][0]["intent"]["clarity"], "high");
    assert_eq!(output["trace"][1]["status"], "proceed");
    assert_eq!(output["trace"][2]["plan"]["steps"].as_array().unwrap().len(), 7);
    assert_eq!(output["trace"][3]["status"], "completed");
    assert_eq!(output["trace"][4]["status"], "passed");
    assert_eq!(output["result"]["stage"], "finalize");
    assert_eq!(output["result"]["status"], "success");
    assert_eq!(output["result"]["trusted"], true);
    assert!(output["reply"].as_str().unwrap().starts_with("✅ Done."));
}

#[tokio::test]
async fn run_with_empty_input_returns_guidance() {
    let server = GatewayTestServer::start(|_| {}).await;

    let (status, body) = post_run(&server, json!({"input": "   "})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["output"],
        json!({
            "stage": "ui",
            "error": "Input is empty",
            "reply": "Please type something first."
        })
    );
}

#[tokio::test]
async fn run_accepts_numeric_input() {
    let server = GatewayTestServer::start(|_| {}).await;

    let (status, body) = post_run(&server, json!({"input": 42})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    let output = &body["output"];
    assert_eq!(output["trace"][0]["raw"], "42");
    assert_eq!(output["trace"][0]["intent"]["action"], "ask");
    assert_eq!(output["trace"][1]["status"], "need_clarification");
}

#[tokio::test]
async fn run_rejects_malformed_json() {
    let server = GatewayTestServer::start(|_| {}).await;

    let response = reqwest::Client::new()
        .post(server.url("/run"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON"));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let server = GatewayTestServer::start(|_| {}).await;

    let input = "a".repeat(MAX_BODY_SIZE + 1);
    let response = reqwest::Client::new()
        .post(server.url("/run"))
        .json(&json!({ "input": input }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn sessions_accumulate_memory_across_requests() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "reply"}}]
        })))
        .expect(2)
        .mount(&upstream)
        .await;

    let uri = upstream.uri();
    let server = GatewayTestServer::start(move |config| {
        config.response.mode = ResponseMode::Provider;
        config.api_url = Some(uri);
        config.reliability.provider_retries = 0;
    })
    .await;

    post_run(&server, json!({"input": "build an app", "session": "alpha"})).await;
    post_run(&server, json!({"input": "explain the design", "session": "alpha"})).await;

    let chat_calls: Vec<_> = upstream
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|request| {
            request.method.as_str() == "POST"
                && request.url.path() == "/chat/completions"
        })
        .collect();
    assert_eq!(chat_calls.len(), 2);
    let second: Value = serde_json::from_slice(&chat_calls[1].body).unwrap();
    // system prompt, two remembered turns, then the new input
    let messages = second["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[1]["content"], "build an app");
    assert_eq!(messages[2]["content"], "reply");
    assert_eq!(messages[3]["content"], "explain the design");
    upstream.verify().await;
}

#[tokio::test]
async fn provider_mode_replies_with_generated_text() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Here is the fix."}}]
        })))
        .mount(&upstream)
        .await;

    let uri = upstream.uri();
    let server = GatewayTestServer::start(move |config| {
        config.response.mode = ResponseMode::Provider;
        config.api_url = Some(uri);
        config.reliability.provider_retries = 0;
    })
    .await;

    let (_, body) = post_run(&server, json!({"input": "please fix this bug in my code"})).await;
    assert_eq!(body["output"]["reply"], "Here is the fix.");
    assert_eq!(body["output"]["result"]["trusted"], true);
}

#[tokio::test]
async fn provider_failure_degrades_to_apology() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&upstream)
        .await;

    let uri = upstream.uri();
    let server = GatewayTestServer::start(move |config| {
        config.response.mode = ResponseMode::Provider;
        config.api_url = Some(uri);
        config.reliability.provider_retries = 0;
    })
    .await;

    let (status, body) = post_run(&server, json!({"input": "build an app"})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["output"]["reply"].as_str().unwrap().contains("Sorry"));
    assert_eq!(body["output"]["result"]["status"], "success");
}

#[tokio::test]
async fn test_llm_probes_the_provider() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "నమస్కారం"}}]
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let uri = upstream.uri();
    let server = GatewayTestServer::start(move |config| {
        config.api_url = Some(uri);
        config.reliability.provider_retries = 0;
    })
    .await;

    let response = reqwest::get(server.url("/test-llm")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"ok": true, "out": "నమస్కారం"}));
    upstream.verify().await;
}

#[tokio::test]
async fn test_llm_reports_upstream_failure() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key sk-leaked-123456"))
        .mount(&upstream)
        .await;

    let uri = upstream.uri();
    let server = GatewayTestServer::start(move |config| {
        config.api_url = Some(uri);
        config.reliability.provider_retries = 0;
    })
    .await;

    let response = reqwest::get(server.url("/test-llm")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert!(!body["error"].as_str().unwrap().contains("sk-leaked-123456"));
}
