use super::types::{MessageRole, ProviderMessage};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by provider calls.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// Flatten a history into one prompt for backends without structured turns.
pub fn messages_to_text(messages: &[ProviderMessage]) -> String {
    messages
        .iter()
        .map(|msg| {
            let role_label = match msg.role {
                MessageRole::User => "User:",
                MessageRole::Assistant => "Assistant:",
                MessageRole::System => "System:",
            };
            format!("{role_label} {}", msg.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub trait Provider: Send + Sync {
    /// Provider identifier (e.g. "openai", "gemini").
    fn name(&self) -> &str;

    fn chat_with_system<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        message: &'a str,
        model: &'a str,
        temperature: f64,
    ) -> ProviderFuture<'a, String> {
        Box::pin(async move {
            let messages = [ProviderMessage::user(message)];
            self.chat_with_history(system_prompt, &messages, model, temperature)
                .await
        })
    }

    /// Send prior turns followed by the newest user message, last in `messages`.
    fn chat_with_history<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        messages: &'a [ProviderMessage],
        model: &'a str,
        temperature: f64,
    ) -> ProviderFuture<'a, String>;

    /// Warm up the HTTP connection pool.
    fn warmup(&self) -> ProviderFuture<'_, ()> {
        Box::pin(async move { Ok(()) })
    }
}
