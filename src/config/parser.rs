//! Loading the TOML configuration file

use super::validator::{ConfigValidator, ValidationIssue};
use super::StrataConfig;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ConfigParseError {
    #[error("File IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Validation error: {message}")]
    Validation { message: String },
}

/// Reads and validates configuration files
pub struct ConfigParser {
    validator: ConfigValidator,
    warnings: Vec<ValidationIssue>,
}

impl ConfigParser {
    pub fn new(validator: ConfigValidator) -> Self {
        Self {
            validator,
            warnings: Vec::new(),
        }
    }

    /// Parse and validate a file
    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P) -> Result<StrataConfig, ConfigParseError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "Parsing configuration file");
        self.parse_str(&content)
    }

    /// Parse the file when it exists, otherwise use defaults
    pub fn load_or_default<P: AsRef<Path>>(&mut self, path: P) -> Result<StrataConfig, ConfigParseError> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No configuration file found, using defaults");
            return Ok(StrataConfig::default());
        }
        self.parse_file(path)
    }

    pub fn parse_str(&mut self, content: &str) -> Result<StrataConfig, ConfigParseError> {
        let config: StrataConfig = toml::from_str(content)?;
        self.check(&config)?;
        Ok(config)
    }

    /// Warnings collected by the last successful parse
    pub fn warnings(&self) -> &[ValidationIssue] {
        &self.warnings
    }

    /// Validate a configuration that did not come from a file
    pub fn check(&mut self, config: &StrataConfig) -> Result<(), ConfigParseError> {
        let issues = self.validator.validate(config);
        let errors: Vec<String> = ConfigValidator::errors(&issues)
            .map(ToString::to_string)
            .collect();
        if !errors.is_empty() {
            return Err(ConfigParseError::Validation {
                message: errors.join("; "),
            });
        }

        for issue in &issues {
            warn!(location = %issue.location, "{}", issue.message);
        }
        self.warnings = issues;
        Ok(())
    }
}
