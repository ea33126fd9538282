use crate::error::LlmError;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

const MAX_API_ERROR_CHARS: usize = 200;
const REDACTED: &str = "[REDACTED]";

/// Bare key shapes issued by the supported backends and common neighbours.
static PREFIXED_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:sk-|sk_|AIza|ya29\.|ghp_|github_pat_|hf_|xox[abps]-)[A-Za-z0-9_\-\.]+")
        .unwrap_or_else(|e| unreachable!("static pattern: {e}"))
});

/// `key=value`, `"key":"value"` and bearer-header forms; the value is group 1.
static MARKED_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:bearer\s+|(?:api_key|access_token|refresh_token|id_token|key)=|"(?:api_key|access_token|refresh_token|id_token|token)"\s*:\s*")([A-Za-z0-9_\-\.:+/=]+)"#,
    )
    .unwrap_or_else(|e| unreachable!("static pattern: {e}"))
});

/// Redact secret-looking tokens from text that may reach logs or callers.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    let prefixed = PREFIXED_TOKEN.replace_all(input, REDACTED);
    if !MARKED_TOKEN.is_match(&prefixed) {
        return prefixed;
    }

    let marked = MARKED_TOKEN.replace_all(&prefixed, |caps: &regex::Captures<'_>| {
        let whole = &caps[0];
        let value = &caps[1];
        format!("{}{REDACTED}", &whole[..whole.len() - value.len()])
    });
    Cow::Owned(marked.into_owned())
}

/// Scrub secrets, then truncate to a log-friendly length.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);
    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed.into_owned();
    }

    let truncated: String = scrubbed.chars().take(MAX_API_ERROR_CHARS).collect();
    format!("{truncated}...")
}

/// Build a sanitized provider error from a failed HTTP response.
pub async fn api_error(provider: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read provider error body>".to_string());
    LlmError::Request {
        provider: provider.to_string(),
        message: format!("API error ({status}): {}", sanitize_api_error(&body)),
    }
    .into()
}
