//! Google Gemini `generateContent` backend.

use crate::error::LlmError;
use crate::providers::{
    MessageRole, ProviderMessage,
    gemini_types::{
        Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    },
    http_client::build_provider_client,
    scrub::{api_error, scrub_secret_patterns},
    traits::{Provider, ProviderFuture},
};
use reqwest::Client;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 800;

pub struct GeminiProvider {
    base_url: String,
    api_key: Option<String>,
    max_output_tokens: u32,
    client: Client,
}

impl GeminiProvider {
    pub fn new(api_key: Option<&str>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.map(String::from),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
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
        self.max_output_tokens = max_tokens;
        self
    }

    fn model_name(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }

    /// Models from other vendors fall back to the Gemini default.
    fn resolve_model(model: &str) -> &str {
        let bare = model.trim_start_matches("models/");
        if bare.starts_with("gemini") {
            model
        } else {
            DEFAULT_MODEL
        }
    }

    fn build_request(
        system_prompt: Option<&str>,
        messages: &[ProviderMessage],
        temperature: f64,
        max_output_tokens: u32,
    ) -> GenerateContentRequest {
        let mut system_parts: Vec<Part> = system_prompt
            .map(|sys| Part::text(scrub_secret_patterns(sys).into_owned()))
            .into_iter()
            .collect();

        let mut contents = Vec::with_capacity(messages.len());
        for message in messages {
            let part = Part::text(scrub_secret_patterns(&message.content).into_owned());
            let role = match message.role {
                MessageRole::System => {
                    system_parts.push(part);
                    continue;
                }
                MessageRole::User => "user",
                MessageRole::Assistant => "model",
            };
            contents.push(Content {
                role: Some(role.to_string()),
                parts: vec![part],
            });
        }

        GenerateContentRequest {
            contents,
            system_instruction: (!system_parts.is_empty()).then(|| Content {
                role: None,
                parts: system_parts,
            }),
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens,
            },
        }
    }

    fn extract_text(response: GenerateContentResponse) -> anyhow::Result<String> {
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .filter(|text| !text.trim().is_empty());

        text.map(|t| t.trim().to_string()).ok_or_else(|| {
            LlmError::InvalidResponse {
                provider: "gemini".into(),
                message: "No response from Gemini".into(),
            }
            .into()
        })
    }
}

impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn chat_with_history<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        messages: &'a [ProviderMessage],
        model: &'a str,
        temperature: f64,
    ) -> ProviderFuture<'a, String> {
        Box::pin(async move {
            let api_key = self
                .api_key
                .as_deref()
                .ok_or_else(|| LlmError::MissingCredentials {
                    provider: "gemini".into(),
                    hint: "set GEMINI_API_KEY or api_key in config".into(),
                })?;

            let url = format!(
                "{}/{}:generateContent",
                self.base_url,
                Self::model_name(Self::resolve_model(model))
            );
            let request = Self::build_request(system_prompt, messages, temperature, self.max_output_tokens);
            let response = self
                .client
                .post(url)
                .header("x-goog-api-key", api_key)
                .json(&request)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(api_error("gemini", response).await);
            }

            let result: GenerateContentResponse = response.json().await?;
            Self::extract_text(result)
        })
    }
}
