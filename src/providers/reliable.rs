use super::traits::{Provider, ProviderFuture};
use super::types::ProviderMessage;
use crate::error::LlmError;
use std::time::Duration;

const MAX_BACKOFF_MS: u64 = 10_000;

/// Client errors that will not resolve on retry.
fn is_non_retryable(err: &anyhow::Error) -> bool {
    if matches!(
        err.downcast_ref::<LlmError>(),
        Some(LlmError::MissingCredentials { .. } | LlmError::UnknownProvider(_))
    ) {
        return true;
    }

    if let Some(reqwest_err) = err.downcast_ref::<reqwest::Error>()
        && let Some(status) = reqwest_err.status()
    {
        let code = status.as_u16();
        return status.is_client_error() && code != 429 && code != 408;
    }

    // Sanitized API errors carry the status in their message.
    let msg = err.to_string();
    for word in msg.split(|c: char| !c.is_ascii_digit()) {
        if let Ok(code) = word.parse::<u16>()
            && (400..500).contains(&code)
        {
            return code != 429 && code != 408;
        }
    }
    false
}

/// Provider wrapper with retry + fallback behavior.
pub struct ReliableProvider {
    providers: Vec<(String, Box<dyn Provider>)>,
    max_retries: u32,
    base_backoff_ms: u64,
}

impl ReliableProvider {
    pub fn new(
        providers: Vec<(String, Box<dyn Provider>)>,
        max_retries: u32,
        base_backoff_ms: u64,
    ) -> Self {
        Self {
            providers,
            max_retries,
            base_backoff_ms: base_backoff_ms.max(10),
        }
    }
}

impl Provider for ReliableProvider {
    fn name(&self) -> &str {
        self.providers
            .first()
            .map_or("reliable", |(name, _)| name.as_str())
    }

    fn warmup(&self) -> ProviderFuture<'_, ()> {
        Box::pin(async move {
            for (name, provider) in &self.providers {
                if let Err(e) = provider.warmup().await {
                    tracing::warn!(provider = name.as_str(), "Warmup failed (non-fatal): {e}");
                }
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
            let mut failures = Vec::new();

            for (provider_name, provider) in &self.providers {
                let mut backoff_ms = self.base_backoff_ms;

                for attempt in 0..=self.max_retries {
                    match provider
                        .chat_with_history(system_prompt, messages, model, temperature)
                        .await
                    {
                        Ok(reply) => {
                            if attempt > 0 {
                                tracing::info!(
                                    provider = provider_name.as_str(),
                                    attempt,
                                    "Provider recovered after retries"
                                );
                            }
                            return Ok(reply);
                        }
                        Err(e) => {
                            let non_retryable = is_non_retryable(&e);
                            failures.push(format!(
                                "{provider_name} attempt {}/{}: {e}",
                                attempt + 1,
                                self.max_retries + 1
                            ));

                            if non_retryable {
                                tracing::warn!(
                                    provider = provider_name.as_str(),
                                    "Non-retryable error, switching provider"
                                );
                                break;
                            }

                            if attempt < self.max_retries {
                                tracing::warn!(
                                    provider = provider_name.as_str(),
                                    attempt = attempt + 1,
                                    max_retries = self.max_retries,
                                    "Provider call failed, retrying"
                                );
                                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                                backoff_ms = backoff_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
                            }
                        }
                    }
                }
            }

            Err(LlmError::Request {
                provider: self.name().to_string(),
                message: format!("all providers failed:\n{}", failures.join("\n")),
            }
            .into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockProvider {
        calls: Arc<AtomicUsize>,
        fail_until_attempt: usize,
        response: &'static str,
        error: &'static str,
    }

    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn chat_with_history<'a>(
            &'a self,
            _system_prompt: Option<&'a str>,
            _messages: &'a [ProviderMessage],
            _model: &'a str,
            _temperature: f64,
        ) -> ProviderFuture<'a, String> {
            Box::pin(async move {
                let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt <= self.fail_until_attempt {
                    anyhow::bail!(self.error);
                }
                Ok(self.response.to_string())
            })
        }
    }

    fn mock(
        calls: &Arc<AtomicUsize>,
        fail_until_attempt: usize,
        response: &'static str,
        error: &'static str,
    ) -> Box<dyn Provider> {
        Box::new(MockProvider {
            calls: Arc::clone(calls),
            fail_until_attempt,
            response,
            error,
        })
    }

    #[tokio::test]
    async fn succeeds_without_retry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ReliableProvider::new(
            vec![("primary".into(), mock(&calls, 0, "ok", "boom"))],
            2,
            1,
        );

        let result = provider.chat_with_system(None, "hello", "test", 0.0).await.unwrap();
        assert_eq!(result, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_then_recovers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ReliableProvider::new(
            vec![("primary".into(), mock(&calls, 1, "recovered", "temporary"))],
            2,
            1,
        );

        let result = provider.chat_with_system(None, "hello", "test", 0.0).await.unwrap();
        assert_eq!(result, "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn falls_back_after_retries_exhausted() {
        let primary_calls = Arc::new(AtomicUsize::new(0));
        let fallback_calls = Arc::new(AtomicUsize::new(0));
        let provider = ReliableProvider::new(
            vec![
                ("primary".into(), mock(&primary_calls, usize::MAX, "never", "503 down")),
                ("fallback".into(), mock(&fallback_calls, 0, "from fallback", "boom")),
            ],
            1,
            1,
        );

        let result = provider.chat_with_system(None, "hello", "test", 0.0).await.unwrap();
        assert_eq!(result, "from fallback");
        assert_eq!(primary_calls.load(Ordering::SeqCst), 2);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn client_errors_skip_retries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ReliableProvider::new(
            vec![(
                "primary".into(),
                mock(&calls, usize::MAX, "never", "API error (401 Unauthorized): bad key"),
            )],
            3,
            1,
        );

        let err = provider
            .chat_with_system(None, "hello", "test", 0.0)
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(err.to_string().contains("all providers failed"));
    }

    #[test]
    fn rate_limits_and_timeouts_stay_retryable() {
        assert!(!is_non_retryable(&anyhow::anyhow!("API error (429 Too Many Requests)")));
        assert!(!is_non_retryable(&anyhow::anyhow!("API error (408 Request Timeout)")));
        assert!(!is_non_retryable(&anyhow::anyhow!("API error (500 Internal Server Error)")));
        assert!(is_non_retryable(&anyhow::anyhow!("API error (404 Not Found)")));
    }

    #[test]
    fn missing_credentials_are_not_retried() {
        let err: anyhow::Error = LlmError::MissingCredentials {
            provider: "openai".into(),
            hint: "set key".into(),
        }
        .into();
        assert!(is_non_retryable(&err));
    }
}
