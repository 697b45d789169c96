//! Configuration file loader.

use super::error::{ConfigError, ConfigResult};
use super::types::AppConfig;
use super::validation::{ValidationResult, Validator};
use std::path::Path;
use tracing::warn;

/// Configuration loader with validation support.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Validators to run on loaded configuration.
    validators: Vec<Box<dyn Validator>>,
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validator to the loader.
    #[must_use]
    pub fn with_validator<V: Validator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Load configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The TOML is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(&self, path: P) -> ConfigResult<AppConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        self.load_str(&content)
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TOML is malformed
    /// - Validation fails
    pub fn load_str(&self, content: &str) -> ConfigResult<AppConfig> {
        let config: AppConfig = toml::from_str(content)?;
        self.validate(&config)?;
        Ok(config)
    }

    /// Validate a configuration against all registered validators.
    ///
    /// Warnings are logged; any error fails the whole configuration.
    /// Every validator runs, so all problems are reported together.
    pub fn validate(&self, config: &AppConfig) -> ConfigResult<()> {
        let mut result = ValidationResult::new();
        for validator in &self.validators {
            result.merge(validator.validate(config));
        }

        for warning in result.warnings() {
            warn!(field = %warning.field, "{}", warning.message);
        }
        if !result.is_valid() {
            let errors: Vec<String> = result
                .errors_only()
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            return Err(ConfigError::ValidationError(errors.join("; ")));
        }
        Ok(())
    }

    /// Load configuration or return default if file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default<P: AsRef<Path>>(&self, path: P) -> ConfigResult<AppConfig> {
        let path = path.as_ref();
        if path.exists() {
            self.load(path)
        } else {
            Ok(AppConfig::default())
        }
    }

    /// Save configuration to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if validation, serialization or writing fails.
    pub fn save<P: AsRef<Path>>(&self, config: &AppConfig, path: P) -> ConfigResult<()> {
        self.validate(config)?;

        let path = path.as_ref();
        let content = toml::to_string_pretty(config)?;
        std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }
}
