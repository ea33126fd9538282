use crate::error::LlmError;
use crate::providers::{
    ProviderMessage, http_client::build_provider_client, scrub::api_error,
    scrub::scrub_secret_patterns,
    traits::{Provider, ProviderFuture},
};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAX_TOKENS: u32 = 800;

pub struct OpenAiProvider {
    base_url: String,
    /// Pre-computed `"Bearer <key>"` header value.
    cached_auth_header: Option<String>,
    max_tokens: u32,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(api_key: Option<&str>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cached_auth_header: api_key.map(|k| format!("Bearer {k}")),
            max_tokens: DEFAULT_MAX_TOKENS,
            client: build_provider_client(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_request<'a>(
        &self,
        system_prompt: Option<&str>,
        history: &[ProviderMessage],
        model: &'a str,
        temperature: f64,
    ) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(sys) = system_prompt {
            messages.push(Message {
                role: "system",
                content: sys.to_string(),
            });
        }
        messages.extend(history.iter().map(|m| Message {
            role: match m.role {
                crate::providers::MessageRole::System => "system",
                crate::providers::MessageRole::User => "user",
                crate::providers::MessageRole::Assistant => "assistant",
            },
            content: scrub_secret_patterns(&m.content).into_owned(),
        }));

        ChatRequest {
            model,
            messages,
            max_tokens: self.max_tokens,
            temperature,
        }
    }

    fn extract_text(response: ChatResponse) -> anyhow::Result<String> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| {
                LlmError::InvalidResponse {
                    provider: "openai".into(),
                    message: "Invalid LLM response format".into(),
                }
                .into()
            })
    }
}

impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn warmup(&self) -> ProviderFuture<'_, ()> {
        Box::pin(async move {
            if self.cached_auth_header.is_some() {
                self.client
                    .get(format!("{}/models", self.base_url))
                    .send()
                    .await?;
            }
            Ok(())
        })
    }

    fn chat_with_history<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        messages: &'a [ProviderMessage],
        model: &'a str,
        temperature: f64,
    ) -> ProviderFuture<'a, String> {
        Box::pin(async move {
            let auth_header =
                self.cached_auth_header
                    .as_deref()
                    .ok_or_else(|| LlmError::MissingCredentials {
                        provider: "openai".into(),
                        hint: "set OPENAI_API_KEY or api_key in config".into(),
                    })?;

            let request = self.build_request(system_prompt, messages, model, temperature);
            let response = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .header("Authorization", auth_header)
                .json(&request)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(api_error("openai", response).await);
            }

            let chat: ChatResponse = response.json().await?;
            Self::extract_text(chat)
        })
    }
}
