use super::gemini::GeminiProvider;
use super::openai::OpenAiProvider;
use super::reliable::ReliableProvider;
use super::traits::Provider;
use crate::config::Config;
use crate::error::LlmError;

/// Per-call provider settings.
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions<'a> {
    pub api_key: Option<&'a str>,
    pub base_url: Option<&'a str>,
    pub max_tokens: Option<u32>,
}

/// Resolve API key for a provider from config and environment variables.
///
/// Resolution order:
/// 1. Explicitly provided `api_key` parameter (trimmed, filtered if empty)
/// 2. Provider-specific environment variable (`OPENAI_API_KEY`, `GEMINI_API_KEY`, ...)
/// 3. Generic fallback variables (`ADBHUTAM_API_KEY`, `API_KEY`)
pub fn resolve_api_key(name: &str, explicit_api_key: Option<&str>) -> Option<String> {
    if let Some(key) = explicit_api_key.map(str::trim).filter(|k| !k.is_empty()) {
        return Some(key.to_string());
    }

    let provider_env_candidates: &[&str] = match name {
        "openai" => &["OPENAI_API_KEY"],
        "gemini" | "google" | "google-gemini" => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
        _ => &[],
    };

    provider_env_candidates
        .iter()
        .chain(["ADBHUTAM_API_KEY", "API_KEY"].iter())
        .filter_map(|var| std::env::var(var).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

pub fn create_provider(name: &str, options: &ProviderOptions<'_>) -> anyhow::Result<Box<dyn Provider>> {
    let resolved_key = resolve_api_key(name, options.api_key);
    let api_key = resolved_key.as_deref();

    match name {
        "openai" => {
            let mut provider = OpenAiProvider::new(api_key);
            if let Some(url) = options.base_url {
                provider = provider.with_base_url(url);
            }
            if let Some(max_tokens) = options.max_tokens {
                provider = provider.with_max_tokens(max_tokens);
            }
            Ok(Box::new(provider))
        }
        "gemini" | "google" | "google-gemini" => {
            let mut provider = GeminiProvider::new(api_key);
            if let Some(url) = options.base_url {
                provider = provider.with_base_url(url);
            }
            if let Some(max_tokens) = options.max_tokens {
                provider = provider.with_max_tokens(max_tokens);
            }
            Ok(Box::new(provider))
        }
        _ => Err(LlmError::UnknownProvider(name.to_string()).into()),
    }
}

/// Default provider wrapped with retries, then each configured fallback.
///
/// The configured key and base URL apply to the default provider only;
/// fallbacks resolve their keys from the environment.
pub fn create_resilient_provider(config: &Config) -> anyhow::Result<Box<dyn Provider>> {
    let primary_name = config.provider_name();
    let mut providers: Vec<(String, Box<dyn Provider>)> = Vec::new();

    providers.push((
        primary_name.to_string(),
        create_provider(
            primary_name,
            &ProviderOptions {
                api_key: config.api_key.as_deref(),
                base_url: config.api_url.as_deref(),
                max_tokens: Some(config.max_tokens),
            },
        )?,
    ));

    for fallback in &config.reliability.fallback_providers {
        if fallback == primary_name {
            continue;
        }

        match create_provider(
            fallback,
            &ProviderOptions {
                max_tokens: Some(config.max_tokens),
                ..ProviderOptions::default()
            },
        ) {
            Ok(provider) => providers.push((fallback.clone(), provider)),
            Err(e) => {
                tracing::warn!(
                    fallback_provider = fallback.as_str(),
                    "Ignoring invalid fallback provider: {e}"
                );
            }
        }
    }

    Ok(Box::new(ReliableProvider::new(
        providers,
        config.reliability.provider_retries,
        config.reliability.provider_backoff_ms,
    )))
}
