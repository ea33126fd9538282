use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.4;
pub const DEFAULT_MAX_TOKENS: u32 = 800;

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Workspace directory - computed from home, not serialized
    #[serde(skip)]
    pub workspace_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,
    pub api_key: Option<String>,
    /// Override for the provider base URL (proxies, tests)
    #[serde(default)]
    pub api_url: Option<String>,
    pub default_provider: Option<String>,
    pub default_model: Option<String>,
    /// Model used for code-oriented replies; falls back to `default_model`
    #[serde(default)]
    pub code_model: Option<String>,
    pub default_temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub response: ResponseConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub reliability: ReliabilityConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

// ── Gateway ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway port (default: 3000)
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    /// Gateway host (default: 127.0.0.1)
    #[serde(default = "default_gateway_host")]
    pub host: String,
    /// Allow binding to non-localhost addresses (default: false)
    #[serde(default)]
    pub allow_public_bind: bool,
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_gateway_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            host: default_gateway_host(),
            allow_public_bind: false,
        }
    }
}

// ── Conversation memory ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Messages kept per session, user and assistant turns counted separately
    #[serde(default = "default_memory_capacity")]
    pub capacity: usize,
    /// Sessions remembered at once; the least recently used is dropped first
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_memory_capacity() -> usize {
    crate::memory::DEFAULT_MEMORY_CAPACITY
}

fn default_max_sessions() -> usize {
    crate::memory::DEFAULT_MAX_SESSIONS
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_memory_capacity(),
            max_sessions: default_max_sessions(),
        }
    }
}

// ── Response ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    #[default]
    Template,
    Provider,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseConfig {
    #[serde(default)]
    pub mode: ResponseMode,
}

// ── Pipeline ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Stub,
    Codegen,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub engine: EngineKind,
    /// Target language for prepared code-generation tasks
    #[serde(default = "default_codegen_language")]
    pub codegen_language: String,
}

fn default_codegen_language() -> String {
    "rust".into()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            codegen_language: default_codegen_language(),
        }
    }
}

// ── Reliability ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    #[serde(default = "default_provider_retries")]
    pub provider_retries: u32,
    #[serde(default = "default_provider_backoff_ms")]
    pub provider_backoff_ms: u64,
    /// Providers tried in order after the default one gives up
    #[serde(default)]
    pub fallback_providers: Vec<String>,
}

fn default_provider_retries() -> u32 {
    2
}

fn default_provider_backoff_ms() -> u64 {
    500
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            provider_retries: default_provider_retries(),
            provider_backoff_ms: default_provider_backoff_ms(),
            fallback_providers: Vec::new(),
        }
    }
}

// ── Project storage ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Project store file name, relative to the workspace
    #[serde(default = "default_store_file")]
    pub file: String,
}

fn default_store_file() -> String {
    "projects.json".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            file: default_store_file(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
        let adbhutam_dir = home.join(".adbhutam");

        Self {
            workspace_dir: adbhutam_dir.join("workspace"),
            config_path: adbhutam_dir.join("config.toml"),
            api_key: None,
            api_url: None,
            default_provider: Some(DEFAULT_PROVIDER.to_string()),
            default_model: Some(DEFAULT_MODEL.to_string()),
            code_model: None,
            default_temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            gateway: GatewayConfig::default(),
            memory: MemoryConfig::default(),
            response: ResponseConfig::default(),
            pipeline: PipelineConfig::default(),
            reliability: ReliabilityConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        Self::load_or_init_in(&home.join(".adbhutam"))
    }

    /// Load `config.toml` from `dir`, writing defaults there on first run.
    pub fn load_or_init_in(dir: &Path) -> Result<Self> {
        let config_path = dir.join("config.toml");
        let workspace_dir = dir.join("workspace");

        if !workspace_dir.exists() {
            fs::create_dir_all(&workspace_dir)
                .with_context(|| format!("Failed to create {}", workspace_dir.display()))?;
        }

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config = toml::from_str(&contents)
                .map_err(|e| ConfigError::Load(e.to_string()))
                .context("Failed to parse config file")?;
            // Set computed paths that are skipped during serialization
            config.config_path = config_path;
            config.workspace_dir = workspace_dir;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self {
                config_path,
                workspace_dir,
                ..Self::default()
            };
            config.validate()?;
            config.save()?;
            tracing::info!(path = %config.config_path.display(), "wrote default config");
            Ok(config)
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::Validation(format!(
                "default_temperature must be within 0.0..=2.0, got {}",
                self.default_temperature
            )));
        }
        if self.memory.capacity < 2 || self.memory.capacity % 2 != 0 {
            return Err(ConfigError::Validation(format!(
                "memory.capacity must be an even number of at least 2 (whole exchanges), got {}",
                self.memory.capacity
            )));
        }
        if self.memory.max_sessions == 0 {
            return Err(ConfigError::Validation(
                "memory.max_sessions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        // API Key: ADBHUTAM_API_KEY or API_KEY
        if let Ok(key) = std::env::var("ADBHUTAM_API_KEY").or_else(|_| std::env::var("API_KEY"))
            && !key.is_empty()
        {
            self.api_key = Some(key);
        }

        if let Ok(provider) = std::env::var("ADBHUTAM_PROVIDER")
            && !provider.is_empty()
        {
            self.default_provider = Some(provider);
        }

        if let Ok(model) = std::env::var("ADBHUTAM_MODEL")
            && !model.is_empty()
        {
            self.default_model = Some(model);
        }

        if let Ok(workspace) = std::env::var("ADBHUTAM_WORKSPACE")
            && !workspace.is_empty()
        {
            self.workspace_dir = PathBuf::from(workspace);
        }

        // Gateway port: ADBHUTAM_GATEWAY_PORT or PORT
        if let Ok(port_str) =
            std::env::var("ADBHUTAM_GATEWAY_PORT").or_else(|_| std::env::var("PORT"))
            && let Ok(port) = port_str.parse::<u16>()
        {
            self.gateway.port = port;
        }

        // Gateway host: ADBHUTAM_GATEWAY_HOST or HOST
        if let Ok(host) =
            std::env::var("ADBHUTAM_GATEWAY_HOST").or_else(|_| std::env::var("HOST"))
            && !host.is_empty()
        {
            self.gateway.host = host;
        }

        if let Ok(temp_str) = std::env::var("ADBHUTAM_TEMPERATURE")
            && let Ok(temp) = temp_str.parse::<f64>()
            && (0.0..=2.0).contains(&temp)
        {
            self.default_temperature = temp;
        }
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }

    pub fn provider_name(&self) -> &str {
        self.default_provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    pub fn model(&self) -> &str {
        self.default_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn store_path(&self) -> PathBuf {
        self.workspace_dir.join(&self.storage.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    const ENV_VARS: [&str; 10] = [
        "ADBHUTAM_API_KEY",
        "API_KEY",
        "ADBHUTAM_PROVIDER",
        "ADBHUTAM_MODEL",
        "ADBHUTAM_WORKSPACE",
        "ADBHUTAM_GATEWAY_PORT",
        "PORT",
        "ADBHUTAM_GATEWAY_HOST",
        "HOST",
        "ADBHUTAM_TEMPERATURE",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            // SAFETY: serialized by ENV_LOCK.
            unsafe { std::env::remove_var(var) };
        }
    }

    // ── Defaults ─────────────────────────────────────────────

    #[test]
    fn config_default_has_sane_values() {
        let c = Config::default();
        assert_eq!(c.provider_name(), "openai");
        assert_eq!(c.model(), "gpt-4o-mini");
        assert!((c.default_temperature - 0.4).abs() < f64::EPSILON);
        assert_eq!(c.max_tokens, 800);
        assert_eq!(c.memory.capacity, 12);
        assert_eq!(c.response.mode, ResponseMode::Template);
        assert_eq!(c.pipeline.engine, EngineKind::Stub);
        assert_eq!(c.gateway.port, 3000);
        assert!(!c.gateway.allow_public_bind);
        assert!(c.config_path.to_string_lossy().contains("config.toml"));
        c.validate().unwrap();
    }

    // ── Serde ────────────────────────────────────────────────

    #[test]
    fn minimal_toml_fills_section_defaults() {
        let config: Config = toml::from_str(
            r#"
default_provider = "gemini"
default_temperature = 0.2

[response]
mode = "provider"
"#,
        )
        .unwrap();
        assert_eq!(config.provider_name(), "gemini");
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.response.mode, ResponseMode::Provider);
        assert_eq!(config.reliability.provider_retries, 2);
        assert_eq!(config.storage.file, "projects.json");
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r#"
default_temperature = 0.2

[pipeline]
engine = "turbo"
"#,
        );
        assert!(result.is_err());
    }

    // ── Validation ───────────────────────────────────────────

    #[test]
    fn validate_rejects_out_of_range_temperature() {
        let config = Config {
            default_temperature: 2.5,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_temperature"));
    }

    #[test]
    fn validate_rejects_memory_smaller_than_a_pair() {
        let mut config = Config::default();
        config.memory.capacity = 1;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_odd_memory_capacity() {
        let mut config = Config::default();
        config.memory.capacity = 7;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("even"));

        config.memory.capacity = 8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_sessions() {
        let mut config = Config::default();
        config.memory.max_sessions = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    // ── Load / save ──────────────────────────────────────────

    #[test]
    fn load_or_init_writes_defaults_then_reads_them_back() {
        let tmp = tempfile::tempdir().unwrap();
        let first = Config::load_or_init_in(tmp.path()).unwrap();
        assert!(first.config_path.exists());
        assert!(first.workspace_dir.is_dir());

        let mut edited = first.clone();
        edited.default_model = Some("gpt-4o".into());
        edited.save().unwrap();

        let second = Config::load_or_init_in(tmp.path()).unwrap();
        assert_eq!(second.model(), "gpt-4o");
        assert_eq!(second.config_path, first.config_path);
    }

    #[test]
    fn load_rejects_invalid_file() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "default_temperature = 9.0\n",
        )
        .unwrap();
        assert!(Config::load_or_init_in(tmp.path()).is_err());
    }

    // ── Env overrides ────────────────────────────────────────

    #[test]
    fn env_overrides_apply() {
        let _guard = env_lock();
        clear_env();
        // SAFETY: serialized by ENV_LOCK.
        unsafe {
            std::env::set_var("ADBHUTAM_API_KEY", "sk-env");
            std::env::set_var("ADBHUTAM_PROVIDER", "gemini");
            std::env::set_var("ADBHUTAM_GATEWAY_PORT", "8181");
            std::env::set_var("ADBHUTAM_TEMPERATURE", "1.1");
        }

        let mut config = Config::default();
        config.apply_env_overrides();
        clear_env();

        assert_eq!(config.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.provider_name(), "gemini");
        assert_eq!(config.gateway.port, 8181);
        assert!((config.default_temperature - 1.1).abs() < f64::EPSILON);
    }

    #[test]
    fn env_overrides_ignore_invalid_values() {
        let _guard = env_lock();
        clear_env();
        // SAFETY: serialized by ENV_LOCK.
        unsafe {
            std::env::set_var("PORT", "not-a-port");
            std::env::set_var("ADBHUTAM_TEMPERATURE", "7");
        }

        let mut config = Config::default();
        config.apply_env_overrides();
        clear_env();

        assert_eq!(config.gateway.port, 3000);
        assert!((config.default_temperature - DEFAULT_TEMPERATURE).abs() < f64::EPSILON);
    }
}
