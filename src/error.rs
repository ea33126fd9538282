use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `Adbhutam`.
///
/// Pipeline stages never return these: stage failures are expressed as record
/// statuses. These errors cover the collaborators around the pipeline
/// (configuration, providers, storage, engines, transport). Library callers can
/// match on them; internal plumbing continues to use `anyhow::Result` for ad-hoc
/// context chains.
#[derive(Debug, Error)]
pub enum AdbhutamError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── LLM / Provider ──────────────────────────────────────────────────
    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    // ── Project storage ─────────────────────────────────────────────────
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    // ── Step engines ────────────────────────────────────────────────────
    #[error("engine: {0}")]
    Engine(#[from] EngineError),

    // ── Transport ───────────────────────────────────────────────────────
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── LLM / Provider errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider {provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("provider {provider} credentials missing: {hint}")]
    MissingCredentials { provider: String, hint: String },

    #[error("provider {provider} returned an unrecognized response: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

// ─── Storage errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("store file is corrupt: {0}")]
    Corrupt(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Engine errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid code generation task parameters: {0}")]
    InvalidTask(&'static str),
}

// ─── Transport errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("refusing public bind to {0}")]
    PublicBind(String),

    #[error("gateway: {0}")]
    Gateway(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, AdbhutamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_displays_correctly() {
        let err = AdbhutamError::Config(ConfigError::Validation("bad temp".into()));
        assert!(err.to_string().contains("validation failed"));
    }

    #[test]
    fn llm_missing_credentials_names_provider() {
        let err = AdbhutamError::Llm(LlmError::MissingCredentials {
            provider: "openai".into(),
            hint: "set OPENAI_API_KEY".into(),
        });
        assert!(err.to_string().contains("openai"));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn anyhow_interop() {
        let anyhow_err = anyhow::anyhow!("something went wrong");
        let err: AdbhutamError = anyhow_err.into();
        assert!(err.to_string().contains("something went wrong"));
    }

    #[test]
    fn storage_missing_field_displays_correctly() {
        let err = AdbhutamError::Storage(StorageError::MissingField("chunk_id"));
        assert_eq!(err.to_string(), "storage: missing required field: chunk_id");
    }

    #[test]
    fn llm_error_survives_anyhow_round_trip() {
        let err: anyhow::Error = LlmError::InvalidResponse {
            provider: "gemini".into(),
            message: "no candidates".into(),
        }
        .into();
        assert!(matches!(
            err.downcast_ref::<LlmError>(),
            Some(LlmError::InvalidResponse { .. })
        ));
    }
}
