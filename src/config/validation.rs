//! Configuration validation system.

use super::types::AppConfig;
use crate::access_control::{CountryMode, ListKind};

/// A single validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// Error message.
    pub message: String,
    /// Severity level.
    pub severity: ValidationSeverity,
}

impl ValidationError {
    /// Create a new error.
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: ValidationSeverity::Error,
        }
    }

    /// Create a new warning.
    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: ValidationSeverity::Warning,
        }
    }
}

/// Severity of validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    /// Error - configuration is invalid.
    Error,
    /// Warning - configuration may have issues.
    Warning,
}

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty (valid) result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Check if the validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self
            .errors
            .iter()
            .any(|e| e.severity == ValidationSeverity::Error)
    }

    /// Get all validation issues.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Get only errors (not warnings).
    #[must_use]
    pub fn errors_only(&self) -> Vec<&ValidationError> {
        self.errors
            .iter()
            .filter(|e| e.severity == ValidationSeverity::Error)
            .collect()
    }

    /// Get only warnings.
    #[must_use]
    pub fn warnings(&self) -> Vec<&ValidationError> {
        self.errors
            .iter()
            .filter(|e| e.severity == ValidationSeverity::Warning)
            .collect()
    }

    /// Merge another validation result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }
}

/// Trait for configuration validators.
pub trait Validator: std::fmt::Debug + Send + Sync {
    /// Validate a configuration and return any errors.
    fn validate(&self, config: &AppConfig) -> ValidationResult;
}

/// Built-in validator for basic configuration checks.
#[derive(Debug, Default)]
pub struct BasicValidator;

impl BasicValidator {
    /// Create a new basic validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Validator for BasicValidator {
    fn validate(&self, config: &AppConfig) -> ValidationResult {
        let mut result = ValidationResult::new();
        let settings = &config.restrict_ip;

        if let Err(message) = settings.validate() {
            result.add_error(ValidationError::error("restrict_ip", message));
        }

        if settings.country_mode != CountryMode::Disabled && settings.country_list.is_empty() {
            result.add_error(ValidationError::warning(
                "restrict_ip.country_list",
                "Country mode is set but no countries are listed",
            ));
        }

        if settings.country_mode != CountryMode::Disabled && config.geo.is_none() {
            result.add_error(ValidationError::warning(
                "geo",
                "Country mode is set but no country table is configured",
            ));
        }

        // Static allowlist entries share the stored list's syntax.
        for (i, entry) in settings.ip_allowlist.iter().enumerate() {
            if entry.trim().is_empty() {
                result.add_error(ValidationError::error(
                    format!("restrict_ip.ip_allowlist[{i}]"),
                    format!("Empty entry in {}", ListKind::AllowedAddresses),
                ));
            }
        }

        if config.store.lists_path.as_os_str().is_empty() {
            result.add_error(ValidationError::error(
                "store.lists_path",
                "List store path cannot be empty",
            ));
        }

        if let Some(ref geo) = config.geo {
            for (token, country) in &geo.entries {
                let code = country.trim();
                if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
                    result.add_error(ValidationError::error(
                        format!("geo.entries.{token}"),
                        format!("'{country}' is not a two-letter country code"),
                    ));
                }
            }
        }

        result
    }
}
