//! Centralized configuration management for sembed
//!
//! Type-safe, validated configuration for the encoder service with support
//! for multiple sources. Configuration follows a simple hierarchy:
//! 1. Safe defaults (defined as constants)
//! 2. Environment variable overrides (`SEMBED_*`)
//! 3. The JSON config file, which is authoritative for the model identifier
//! 4. Runtime validation

pub mod error;
pub mod source;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use source::{ConfigurationLoader, ConfigurationSource, EnvironmentSource, JsonFileSource};

use crate::validation::Validate;

// =============================================================================
// SAFE DEFAULTS
// =============================================================================

// Embedding Model Configuration
const DEFAULT_MODEL_ID: &str = "all-mpnet-base-v2";
const DEFAULT_MODEL_MAX_TOKENS: usize = 512;

// Model Resolution Configuration
const DEFAULT_BUNDLED_MODELS_DIR: &str = "/usr/src/app/bundled-models";

// Config File Location
const DEFAULT_CONFIG_FILE: &str = "config/encoder_config.json";

// API Server Configuration
const DEFAULT_API_HOST: &str = "0.0.0.0"; // Container deployment binds all interfaces
const DEFAULT_API_PORT: u16 = 8000;

// Telemetry Configuration
const DEFAULT_TRACING_LEVEL: &str = "info";

/// Core configuration for the encoder service
///
/// All settings have safe defaults and can be overridden via environment
/// variables. The config file supplies the model identifier.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApplicationConfig {
    /// Embedding model configuration
    pub model: ModelConfig,

    /// Model resolution configuration
    pub resolver: ResolverConfig,

    /// API server configuration
    pub api: ApiConfig,

    /// Telemetry configuration
    pub telemetry: TelemetryConfig,
}

/// Model configuration - defines the sentence-embedding model to load
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelConfig {
    /// Model identifier, either a bare name ("all-mpnet-base-v2") or a
    /// namespaced path ("sentence-transformers/all-mpnet-base-v2")
    pub id: String,

    /// Maximum tokens per input; longer inputs are truncated by the tokenizer
    pub max_tokens: usize,
}

/// Model resolution configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResolverConfig {
    /// Root directory for bundled model artifacts. Populated at build time by
    /// `sembed-fetch`; doubles as the download cache for the fallback load.
    pub bundled_models_dir: String,
}

/// API server configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApiConfig {
    /// Listen address
    pub host: String,

    /// Listen port
    pub port: u16,
}

/// Telemetry configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetryConfig {
    /// Default tracing level when `RUST_LOG` is unset
    pub tracing_level: String,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ApplicationConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let model_id = env_var("SEMBED_MODEL").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());

        let max_tokens = env_var("SEMBED_MODEL_MAX_TOKENS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MODEL_MAX_TOKENS);

        let bundled_models_dir = env_var("SEMBED_BUNDLED_MODELS_DIR")
            .unwrap_or_else(|| DEFAULT_BUNDLED_MODELS_DIR.to_string());

        let host = env_var("SEMBED_API_HOST").unwrap_or_else(|| DEFAULT_API_HOST.to_string());

        let port = env_var("SEMBED_API_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_API_PORT);

        let tracing_level =
            env_var("SEMBED_TRACING_LEVEL").unwrap_or_else(|| DEFAULT_TRACING_LEVEL.to_string());

        Self {
            model: ModelConfig {
                id: model_id,
                max_tokens,
            },
            resolver: ResolverConfig { bundled_models_dir },
            api: ApiConfig { host, port },
            telemetry: TelemetryConfig { tracing_level },
        }
    }

    /// Load the full configuration: defaults, environment, then the JSON
    /// config file named by `SEMBED_CONFIG_FILE` (default
    /// `config/encoder_config.json`).
    ///
    /// # Errors
    /// Returns an error if the config file is missing or malformed, or if the
    /// merged configuration fails validation. The caller is expected to treat
    /// this as fatal.
    pub fn load() -> ConfigResult<Self> {
        let path = env_var("SEMBED_CONFIG_FILE").unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        ConfigurationLoader::new()
            .add_source(Box::new(EnvironmentSource))
            .add_source(Box::new(JsonFileSource::new(path)))
            .load()
    }
}

impl Validate for ApplicationConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.model.id, "model.id")?;
        validation::validate_range(self.model.max_tokens as u64, 1, 100_000, "model.max_tokens")?;
        validation::validate_non_empty(&self.resolver.bundled_models_dir, "resolver.bundled_models_dir")?;
        validation::validate_non_empty(&self.api.host, "api.host")?;
        validation::validate_port(self.api.port, "api.port")?;
        validation::validate_non_empty(&self.telemetry.tracing_level, "telemetry.tracing_level")?;
        Ok(())
    }
}
