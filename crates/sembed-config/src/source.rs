//! Configuration source loading and composition

use crate::validation::Validate;
use crate::{ApplicationConfig, ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Trait for loading configuration from different sources
pub trait ConfigurationSource {
    /// Apply this source's settings on top of the given configuration
    ///
    /// # Errors
    /// Returns configuration loading errors
    fn apply(&self, config: &mut ApplicationConfig) -> ConfigResult<()>;

    /// Get the name of this configuration source
    fn name(&self) -> &str;

    /// Get the priority of this source (higher number = higher priority)
    fn priority(&self) -> u8;
}

/// Load configuration from environment variables
pub struct EnvironmentSource;

impl ConfigurationSource for EnvironmentSource {
    fn apply(&self, config: &mut ApplicationConfig) -> ConfigResult<()> {
        *config = ApplicationConfig::from_env();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "environment"
    }

    fn priority(&self) -> u8 {
        50
    }
}

/// The on-disk config file: a small JSON document supplying the model
/// identifier, e.g. `{"model": "all-mpnet-base-v2"}`.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    model: String,
}

/// Load the model identifier from the JSON config file
///
/// The file is authoritative for the model identifier: it is applied after
/// the environment source and overrides `SEMBED_MODEL`.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigurationSource for JsonFileSource {
    fn apply(&self, config: &mut ApplicationConfig) -> ConfigResult<()> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|source| ConfigError::FileRead {
                path: self.path.display().to_string(),
                source,
            })?;

        let file: ConfigFile = serde_json::from_str(&content)?;
        config.model.id = file.model;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "json_file"
    }

    fn priority(&self) -> u8 {
        100
    }
}

/// Type alias for configuration sources
type ConfigSources = Vec<Box<dyn ConfigurationSource>>;

/// Configuration loader that combines multiple sources
pub struct ConfigurationLoader {
    sources: ConfigSources,
}

impl ConfigurationLoader {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    #[must_use]
    pub fn add_source(mut self, source: Box<dyn ConfigurationSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Load configuration from all sources in priority order
    ///
    /// A source that fails to apply is fatal: the service must not start on a
    /// half-read configuration.
    ///
    /// # Errors
    /// Returns the first source or validation error encountered
    pub fn load(&self) -> ConfigResult<ApplicationConfig> {
        let mut config = ApplicationConfig::from_env();

        // Sort sources by priority (lowest first, so highest priority overwrites)
        let mut sorted_sources = self.sources.iter().collect::<Vec<_>>();
        sorted_sources.sort_by_key(|source| source.priority());

        for source in sorted_sources {
            source.apply(&mut config)?;
            tracing::debug!("Applied configuration source: {}", source.name());
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("encoder_config.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn file_source_supplies_the_model_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"model": "all-MiniLM-L6-v2"}"#);

        let config = ConfigurationLoader::new()
            .add_source(Box::new(EnvironmentSource))
            .add_source(Box::new(JsonFileSource::new(path)))
            .load()
            .unwrap();

        assert_eq!(config.model.id, "all-MiniLM-L6-v2");
    }

    #[test]
    fn missing_config_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigurationLoader::new()
            .add_source(Box::new(JsonFileSource::new(
                dir.path().join("does-not-exist.json"),
            )))
            .load();

        assert!(matches!(result, Err(ConfigError::FileRead { .. })));
    }

    #[test]
    fn malformed_config_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"model": 42}"#);

        let result = ConfigurationLoader::new()
            .add_source(Box::new(JsonFileSource::new(path)))
            .load();

        assert!(matches!(result, Err(ConfigError::JsonParsing(_))));
    }

    #[test]
    fn file_model_must_still_validate() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"model": ""}"#);

        let result = ConfigurationLoader::new()
            .add_source(Box::new(JsonFileSource::new(path)))
            .load();

        assert!(matches!(result, Err(ConfigError::MissingField { .. })));
    }
}
