//! Configuration system.
//!
//! Layered configuration: defaults, then an optional `lodgen.toml` file,
//! then `LODGEN_`-prefixed environment variables, then CLI flags (applied
//! by the binary). Validated before use; a bad configuration never
//! produces a partially-started run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::batch::BatchConfig;
use crate::error::AppError;
use crate::logging::LoggingConfig;
use crate::provider::{ClientOptions, IdentifierPolicy};

pub const CONFIG_FILE_NAME: &str = "lodgen.toml";
const API_KEY_ENV: &str = "LODGEN_API_KEY";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LodgenConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub batch: BatchSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// External provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// API key. Falls back to the `LODGEN_API_KEY` environment variable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Custom endpoint base URL (OpenAI-compatible).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: None,
            temperature: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Resolve the API key from config or environment.
    pub fn resolve_api_key(&self) -> Result<String, AppError> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.to_string());
        }
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config(format!(
                    "no API key configured: set provider.api_key or the {} environment variable",
                    API_KEY_ENV
                ))
            })
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.model.trim().is_empty() {
            return Err(AppError::Config("provider.model must not be empty".to_string()));
        }
        if let Some(url) = self.base_url.as_deref() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AppError::Config(format!(
                    "provider.base_url must be an http(s) URL, got '{}'",
                    url
                )));
            }
        }
        Ok(())
    }

    /// Build client construction options, resolving the API key.
    pub fn client_options(&self, policy: IdentifierPolicy) -> Result<ClientOptions, AppError> {
        Ok(ClientOptions {
            model: self.model.clone(),
            api_key: self.resolve_api_key()?,
            base_url: self.base_url.clone(),
            temperature: self.temperature,
            connect_timeout: Some(Duration::from_secs(self.connect_timeout_secs)),
            request_timeout: Some(Duration::from_secs(self.request_timeout_secs)),
            identifier_policy: policy,
        })
    }
}

/// Batch-run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Pause-wait poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Cooldown before the CLI resumes a rate-limit pause, in seconds.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Whether a missing external identifier fails the task.
    #[serde(default)]
    pub identifier_policy: IdentifierPolicy,
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_cooldown_secs() -> u64 {
    30
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            cooldown_secs: default_cooldown_secs(),
            identifier_policy: IdentifierPolicy::default(),
        }
    }
}

impl BatchSettings {
    pub fn runner_config(&self) -> BatchConfig {
        BatchConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

/// Loads configuration from files and environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from an explicit file path. The file must exist.
    pub fn load_from_file(path: &Path) -> Result<LodgenConfig, AppError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()))
            .add_source(Self::env_source())
            .build()?;
        let loaded: LodgenConfig = settings.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Load with discovery: `lodgen.toml` in the working directory if
    /// present, environment overrides on top, defaults otherwise.
    pub fn load(working_dir: &Path) -> Result<LodgenConfig, AppError> {
        let file: PathBuf = working_dir.join(CONFIG_FILE_NAME);
        let settings = config::Config::builder()
            .add_source(config::File::from(file).required(false))
            .add_source(Self::env_source())
            .build()?;
        let loaded: LodgenConfig = settings.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    fn env_source() -> config::Environment {
        // LODGEN_PROVIDER__MODEL=... style overrides.
        config::Environment::with_prefix("LODGEN").separator("__")
    }

    /// Write a starter `lodgen.toml` with the default settings into
    /// `dir`. Refuses to overwrite an existing file unless `force`.
    pub fn write_starter(dir: &Path, force: bool) -> Result<PathBuf, AppError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() && !force {
            return Err(AppError::Config(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }
        let content = toml::to_string_pretty(&LodgenConfig::default())
            .map_err(|e| AppError::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

impl LodgenConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        self.provider.validate()?;
        if self.batch.poll_interval_ms == 0 {
            return Err(AppError::Config(
                "batch.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
