//! Turns a pipeline outcome into the text a person reads.

use std::sync::Arc;

use crate::config::{Config, ResponseMode};
use crate::pipeline::understand::Target;
use crate::pipeline::{PipelineRun, PipelineTrace, StageName, StageRecord};
use crate::providers::{Provider, ProviderMessage, TaskKind};

pub const EMPTY_INPUT_REPLY: &str = "Please type something first.";
pub const GREETING_REPLY: &str = "Hello 👋 How can I help you today?";
pub const PROVIDER_FAILURE_REPLY: &str =
    "⚠ Sorry, I couldn't generate a reply right now. Please try again.";
const FALLBACK_SUCCESS_SUMMARY: &str = "Request processed successfully.";
const FALLBACK_HALT_SUMMARY: &str = "Request could not be completed.";

/// Which model answers which kind of request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRouting {
    pub language: String,
    pub code: String,
}

impl ModelRouting {
    pub fn from_config(config: &Config) -> Self {
        let language = config.model().to_string();
        let code = config.code_model.clone().unwrap_or_else(|| language.clone());
        Self { language, code }
    }

    pub fn model_for(&self, kind: TaskKind) -> &str {
        match kind {
            TaskKind::Language => &self.language,
            TaskKind::Code => &self.code,
        }
    }
}

pub struct Responder {
    mode: ResponseMode,
    provider: Option<Arc<dyn Provider>>,
    routing: ModelRouting,
    temperature: f64,
}

impl Responder {
    /// Local templates only; no provider is contacted.
    pub fn template() -> Self {
        Self {
            mode: ResponseMode::Template,
            provider: None,
            routing: ModelRouting {
                language: crate::config::schema::DEFAULT_MODEL.to_string(),
                code: crate::config::schema::DEFAULT_MODEL.to_string(),
            },
            temperature: crate::config::schema::DEFAULT_TEMPERATURE,
        }
    }

    pub fn new(
        mode: ResponseMode,
        provider: Option<Arc<dyn Provider>>,
        routing: ModelRouting,
        temperature: f64,
    ) -> Self {
        Self {
            mode,
            provider,
            routing,
            temperature,
        }
    }

    /// Template mode tolerates a provider that cannot be built, since the
    /// provider only backs the diagnostic probe there.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider: Option<Arc<dyn Provider>> =
            match crate::providers::create_resilient_provider(config) {
                Ok(provider) => Some(Arc::from(provider)),
                Err(e) if config.response.mode == ResponseMode::Template => {
                    tracing::warn!("provider unavailable, template replies only: {e}");
                    None
                }
                Err(e) => return Err(e),
            };

        Ok(Self::new(
            config.response.mode,
            provider,
            ModelRouting::from_config(config),
            config.default_temperature,
        ))
    }

    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    pub fn provider(&self) -> Option<&Arc<dyn Provider>> {
        self.provider.as_ref()
    }

    pub fn routing(&self) -> &ModelRouting {
        &self.routing
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Reply for a finished run. `history` holds earlier turns of the session.
    pub async fn reply(&self, run: &PipelineRun, raw: &str, history: &[ProviderMessage]) -> String {
        let PipelineRun::Traced(trace) = run else {
            return EMPTY_INPUT_REPLY.to_string();
        };

        match (self.mode, self.provider.as_ref()) {
            (ResponseMode::Provider, Some(provider)) => {
                self.provider_reply(provider.as_ref(), trace, raw, history)
                    .await
            }
            _ => template_reply(trace, raw),
        }
    }

    async fn provider_reply(
        &self,
        provider: &dyn Provider,
        trace: &PipelineTrace,
        raw: &str,
        history: &[ProviderMessage],
    ) -> String {
        let kind = task_kind(trace);
        let model = self.routing.model_for(kind);
        let system = system_prompt(trace);
        let mut messages = history.to_vec();
        messages.push(ProviderMessage::user(raw));

        match provider
            .chat_with_history(Some(&system), &messages, model, self.temperature)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(provider = provider.name(), model, %kind, "reply generation failed: {e:#}");
                PROVIDER_FAILURE_REPLY.to_string()
            }
        }
    }
}

/// Code-targeted requests go to the code model.
pub fn task_kind(trace: &PipelineTrace) -> TaskKind {
    match trace.get(StageName::Understand) {
        Some(StageRecord::Understand(u)) if u.intent.target == Target::Code => TaskKind::Code,
        _ => TaskKind::Language,
    }
}

/// Summary and routing hint of the record the run ended on.
fn outcome(trace: &PipelineTrace) -> (bool, String, String) {
    let Some(last) = trace.result() else {
        return (false, FALLBACK_HALT_SUMMARY.to_string(), "halt".to_string());
    };
    let next = last.next().map_or_else(|| "halt".to_string(), |n| n.humanized());

    let summary = match last {
        StageRecord::Finalize(f) => {
            let summary = if f.summary.is_empty() && f.trusted {
                FALLBACK_SUCCESS_SUMMARY.to_string()
            } else {
                f.summary.clone()
            };
            return (f.trusted, summary, next);
        }
        StageRecord::Decide(d) => Some(d.reason.clone()),
        StageRecord::Plan(p) => p
            .plan
            .as_ref()
            .and_then(|plan| plan.clarifications.first().cloned())
            .or_else(|| p.reason.clone()),
        StageRecord::Execute(e) => e.reason.clone(),
        StageRecord::Validate(v) => v.issues.first().cloned().or_else(|| v.reason.clone()),
        StageRecord::Understand(_) => None,
    };
    (
        false,
        summary.unwrap_or_else(|| FALLBACK_HALT_SUMMARY.to_string()),
        next,
    )
}

pub fn template_reply(trace: &PipelineTrace, raw: &str) -> String {
    if raw.trim().eq_ignore_ascii_case("hi") {
        return GREETING_REPLY.to_string();
    }

    let (trusted, summary, next) = outcome(trace);
    if trusted {
        format!("✅ Done.\n\nSummary:\n{summary}")
    } else {
        format!(
            "I understood your request, but something is missing.\n\nIssue: {summary}\nNext step: {next}"
        )
    }
}

fn system_prompt(trace: &PipelineTrace) -> String {
    let (trusted, summary, next) = outcome(trace);
    let stage = trace
        .result()
        .map_or("none", |record| record.stage().label());
    format!(
        "You are Adbhutam, a careful assistant. Each request is analysed by a staged \
         pipeline before it reaches you.\n\
         Last stage: {stage}\n\
         Trusted: {trusted}\n\
         Summary: {summary}\n\
         Next step: {next}\n\
         Answer in the language the user wrote in (Telugu, English or a mix). \
         If the verdict is not trusted, ask for what is missing instead of guessing, \
         and never claim work was completed."
    )
}
