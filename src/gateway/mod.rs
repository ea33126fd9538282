//! Axum HTTP gateway in front of the agent.
//!
//! - `GET /` banner
//! - `GET /health` liveness
//! - `POST /run` full pipeline run plus reply
//! - `GET /test-llm` direct provider probe
//!
//! Request bodies are capped at 64KB and every request times out after 30s.

mod handlers;

use handlers::{handle_health, handle_root, handle_run, handle_test_llm};

use crate::agent::Agent;
use crate::config::{Config, ResponseMode};
use crate::error::TransportError;
use anyhow::Result;
use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB)
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Session used when a `/run` caller does not name one.
pub const DEFAULT_SESSION: &str = "http";

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
}

/// `POST /run` request body
#[derive(Debug, Default, serde::Deserialize)]
pub struct RunBody {
    /// Any JSON value; see [`RunBody::input_text`].
    #[serde(default)]
    pub input: serde_json::Value,
    #[serde(default)]
    pub session: Option<String>,
}

impl RunBody {
    /// Text handed to the pipeline. Strings pass through, `null` or a missing
    /// field becomes empty, anything else is rendered as compact JSON.
    pub fn input_text(&self) -> String {
        match &self.input {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Loopback hosts are the only ones served without an explicit opt-in.
pub fn is_public_bind(host: &str) -> bool {
    !matches!(
        host,
        "127.0.0.1" | "localhost" | "::1" | "[::1]" | "0:0:0:0:0:0:0:1"
    )
}

/// Run the HTTP gateway on `host:port`.
pub async fn run_gateway(host: &str, port: u16, config: Config) -> Result<()> {
    if is_public_bind(host) && !config.gateway.allow_public_bind {
        tracing::error!(
            host,
            "refusing public bind; use --host 127.0.0.1 or set [gateway] allow_public_bind = true"
        );
        return Err(TransportError::PublicBind(host.to_string()).into());
    }

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    run_gateway_with_listener(host, listener, config).await
}

/// Run the HTTP gateway from a pre-bound listener.
pub async fn run_gateway_with_listener(
    host: &str,
    listener: tokio::net::TcpListener,
    config: Config,
) -> Result<()> {
    let agent = Arc::new(Agent::from_config(&config)?);

    if agent.responder().mode() == ResponseMode::Provider
        && let Some(provider) = agent.responder().provider()
        && let Err(e) = provider.warmup().await
    {
        tracing::warn!(provider = provider.name(), "Warmup failed (non-fatal): {e}");
    }

    serve_agent(host, listener, agent).await
}

/// Serve an already assembled agent.
pub async fn serve_agent(
    host: &str,
    listener: tokio::net::TcpListener,
    agent: Arc<Agent>,
) -> Result<()> {
    let actual_port = listener.local_addr()?.port();

    println!("◆ Adbhutam gateway listening on {host}:{actual_port}");
    println!("  GET  /          banner");
    println!("  GET  /health    liveness");
    println!("  POST /run       {{\"input\": \"...\", \"session\": \"...\"}}");
    println!("  GET  /test-llm  provider probe");
    println!("  Press Ctrl+C to stop.\n");
    tracing::info!(host, port = actual_port, "gateway started");

    axum::serve(listener, router(AppState { agent }))
        .await
        .map_err(|e| TransportError::Gateway(e.to_string()))?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/run", post(handle_run))
        .route("/test-llm", get(handle_test_llm))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRegistry;
    use crate::pipeline::Pipeline;
    use crate::response::Responder;

    #[test]
    fn security_body_limit_is_64kb() {
        assert_eq!(MAX_BODY_SIZE, 65_536);
    }

    #[test]
    fn security_timeout_is_30_seconds() {
        assert_eq!(REQUEST_TIMEOUT_SECS, 30);
    }

    #[test]
    fn loopback_hosts_are_private() {
        for host in ["127.0.0.1", "localhost", "::1", "[::1]"] {
            assert!(!is_public_bind(host), "{host}");
        }
        assert!(is_public_bind("0.0.0.0"));
        assert!(is_public_bind("192.168.1.10"));
    }

    #[test]
    fn run_body_fields_are_optional() {
        let body: RunBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.input_text(), "");
        assert!(body.session.is_none());

        let body: RunBody = serde_json::from_str(r#"{"input": "hi", "session": "s1"}"#).unwrap();
        assert_eq!(body.input_text(), "hi");
        assert_eq!(body.session.as_deref(), Some("s1"));
    }

    #[test]
    fn non_string_input_is_coerced_to_text() {
        let cases = [
            (r#"{"input": 42}"#, "42"),
            (r#"{"input": 1.5}"#, "1.5"),
            (r#"{"input": true}"#, "true"),
            (r#"{"input": null}"#, ""),
            (r#"{"input": ["fix", "code"]}"#, r#"["fix","code"]"#),
        ];
        for (raw, expected) in cases {
            let body: RunBody = serde_json::from_str(raw).unwrap();
            assert_eq!(body.input_text(), expected, "{raw}");
        }
    }

    #[tokio::test]
    async fn public_bind_is_refused_without_opt_in() {
        let err = run_gateway("0.0.0.0", 0, Config::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TransportError>(),
            Some(TransportError::PublicBind(host)) if host == "0.0.0.0"
        ));
    }

    #[test]
    fn router_builds_with_template_agent() {
        let agent = Agent::new(
            Pipeline::default(),
            Responder::template(),
            MemoryRegistry::new(4),
        );
        let _ = router(AppState {
            agent: Arc::new(agent),
        });
    }
}
