use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::providers::TaskKind;

use super::{AppState, DEFAULT_SESSION, RunBody};

/// Prompt sent by the provider probe.
pub(super) const PROBE_PROMPT: &str = "Hello in Telugu";

/// GET /
pub(super) async fn handle_root() -> &'static str {
    "Adbhutam API is running"
}

/// GET /health
pub(super) async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /run: pipeline plus reply for one input
pub(super) async fn handle_run(
    State(state): State<AppState>,
    body: Result<Json<RunBody>, JsonRejection>,
) -> impl IntoResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!("rejected /run body: {e}");
            let err = serde_json::json!({
                "ok": false,
                "error": format!("Invalid JSON: {e}. Expected: {{\"input\": \"...\"}}")
            });
            return (StatusCode::BAD_REQUEST, Json(err));
        }
    };

    let session = body
        .session
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_SESSION);
    let input = body.input_text();

    let output = state.agent.handle(session, &input).await;
    tracing::info!(session, trusted = output.trusted(), "run handled");

    (
        StatusCode::OK,
        Json(serde_json::json!({ "ok": true, "output": output })),
    )
}

/// GET /test-llm: calls the provider directly, bypassing the pipeline
pub(super) async fn handle_test_llm(State(state): State<AppState>) -> impl IntoResponse {
    let responder = state.agent.responder();
    let Some(provider) = responder.provider() else {
        let err = serde_json::json!({ "ok": false, "error": "No provider configured" });
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(err));
    };

    let model = responder.routing().model_for(TaskKind::Language);
    match provider
        .chat_with_system(None, PROBE_PROMPT, model, responder.temperature())
        .await
    {
        Ok(out) => (
            StatusCode::OK,
            Json(serde_json::json!({ "ok": true, "out": out })),
        ),
        Err(e) => {
            tracing::warn!(provider = provider.name(), "provider probe failed: {e:#}");
            let err = serde_json::json!({ "ok": false, "error": e.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::config::ResponseMode;
    use crate::memory::MemoryRegistry;
    use crate::pipeline::Pipeline;
    use crate::providers::{Provider, ProviderFuture, ProviderMessage};
    use crate::response::{ModelRouting, Responder};
    use axum::body::to_bytes;
    use std::sync::Arc;

    struct FixedProvider(Result<&'static str, &'static str>);

    impl Provider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn chat_with_history<'a>(
            &'a self,
            _system_prompt: Option<&'a str>,
            messages: &'a [ProviderMessage],
            _model: &'a str,
            _temperature: f64,
        ) -> ProviderFuture<'a, String> {
            Box::pin(async move {
                assert_eq!(messages.last().unwrap().content, PROBE_PROMPT);
                self.0
                    .map(str::to_string)
                    .map_err(|e| anyhow::anyhow!(e))
            })
        }
    }

    fn state(provider: Option<Arc<dyn Provider>>) -> AppState {
        let responder = Responder::new(
            ResponseMode::Template,
            provider,
            ModelRouting {
                language: "chat".into(),
                code: "code".into(),
            },
            0.4,
        );
        AppState {
            agent: Arc::new(Agent::new(
                Pipeline::default(),
                responder,
                MemoryRegistry::new(4),
            )),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn run_returns_trace_and_reply() {
        let body = RunBody {
            input: "hello".into(),
            session: None,
        };
        let response = handle_run(State(state(None)), Ok(Json(body)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["output"]["result"]["stage"], "plan");
        assert_eq!(json["output"]["result"]["status"], "blocked");
    }

    #[tokio::test]
    async fn run_without_input_is_the_empty_input_record() {
        let response = handle_run(State(state(None)), Ok(Json(RunBody::default())))
            .await
            .into_response();
        let json = body_json(response).await;
        assert_eq!(json["output"]["stage"], "ui");
        assert_eq!(json["output"]["error"], "Input is empty");
    }

    #[tokio::test]
    async fn run_remembers_the_named_session() {
        let state = state(None);
        let body = RunBody {
            input: "build an app".into(),
            session: Some("alpha".into()),
        };
        handle_run(State(state.clone()), Ok(Json(body))).await;
        assert_eq!(state.agent.memories().snapshot("alpha").len(), 2);
        assert!(state.agent.memories().snapshot(DEFAULT_SESSION).is_empty());
    }

    #[tokio::test]
    async fn probe_without_provider_is_500() {
        let response = handle_test_llm(State(state(None))).await.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["ok"], false);
    }

    #[tokio::test]
    async fn probe_returns_provider_text() {
        let provider: Arc<dyn Provider> = Arc::new(FixedProvider(Ok("నమస్కారం")));
        let response = handle_test_llm(State(state(Some(provider))))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["out"], "నమస్కారం");
    }

    #[tokio::test]
    async fn probe_failure_reports_error() {
        let provider: Arc<dyn Provider> = Arc::new(FixedProvider(Err("quota exceeded")));
        let response = handle_test_llm(State(state(Some(provider))))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "quota exceeded");
    }

    #[tokio::test]
    async fn health_is_ok() {
        let json = body_json(handle_health().await.into_response()).await;
        assert_eq!(json["status"], "ok");
    }
}
