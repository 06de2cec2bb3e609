//! # Design
//!
//! - Structured, constant-message errors for settings loading and validation.
//! - Carry the offending field/value so failures are reproducible in tests.

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was absent.
    #[error("missing environment configuration")]
    MissingEnv {
        /// Name of the missing environment variable.
        name: &'static str,
    },
    /// An environment variable held a value that could not be parsed.
    #[error("unparseable environment configuration")]
    ParseEnv {
        /// Name of the environment variable.
        name: &'static str,
        /// Raw value that failed to parse.
        value: String,
    },
    /// A settings field failed validation.
    #[error("invalid configuration value")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_render_constant_messages() {
        let missing = ConfigError::MissingEnv { name: "ARKIVA_X" };
        assert_eq!(missing.to_string(), "missing environment configuration");

        let invalid = ConfigError::InvalidField {
            field: "batch_size",
            reason: "zero",
            value: Some("0".to_string()),
        };
        assert_eq!(invalid.to_string(), "invalid configuration value");
    }
}
