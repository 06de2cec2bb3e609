//! Environment loading for pipeline settings.
//!
//! # Design
//! - All knobs arrive through the environment, as the binary entrypoint
//!   expects; defaults cover the tunables, paths are mandatory.
//! - Loading always ends in validation so a `Settings` in hand is usable.

use std::env;
use std::path::PathBuf;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{DEFAULT_BATCH_SIZE, DEFAULT_QUEUE_CAPACITY, Settings};
use crate::validate;

/// Environment variable naming the staging directory.
pub const ENV_SOURCE_DIR: &str = "ARKIVA_SOURCE_DIR";
/// Environment variable naming the destination base directory.
pub const ENV_LIBRARY_ROOT: &str = "ARKIVA_LIBRARY_ROOT";
/// Environment variable overriding the lookup batch size.
pub const ENV_BATCH_SIZE: &str = "ARKIVA_BATCH_SIZE";
/// Environment variable overriding the bounded queue capacity.
pub const ENV_QUEUE_CAPACITY: &str = "ARKIVA_QUEUE_CAPACITY";
/// Environment variable holding the metadata store connection string.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

impl Settings {
    /// Load and validate settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a mandatory variable is missing, a numeric
    /// override fails to parse, or validation rejects a value.
    pub fn from_env() -> ConfigResult<Self> {
        let settings = Self {
            source_dir: PathBuf::from(require_env(ENV_SOURCE_DIR)?),
            library_root: PathBuf::from(require_env(ENV_LIBRARY_ROOT)?),
            batch_size: optional_usize(ENV_BATCH_SIZE)?.unwrap_or(DEFAULT_BATCH_SIZE),
            queue_capacity: optional_usize(ENV_QUEUE_CAPACITY)?.unwrap_or(DEFAULT_QUEUE_CAPACITY),
            database_url: require_env(ENV_DATABASE_URL)?,
        };
        validate::validate(&settings)?;
        Ok(settings)
    }
}

fn require_env(name: &'static str) -> ConfigResult<String> {
    env::var(name).map_err(|_| ConfigError::MissingEnv { name })
}

fn optional_usize(name: &'static str) -> ConfigResult<Option<usize>> {
    match env::var(name) {
        Ok(raw) => parse_usize(name, raw).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_usize(name: &'static str, raw: String) -> ConfigResult<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::ParseEnv { name, value: raw })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_usize_accepts_padded_digits() -> ConfigResult<()> {
        assert_eq!(parse_usize("ARKIVA_BATCH_SIZE", " 250 ".to_string())?, 250);
        Ok(())
    }

    #[test]
    fn parse_usize_rejects_non_numeric_values() {
        let err = parse_usize("ARKIVA_BATCH_SIZE", "many".to_string())
            .expect_err("non-numeric value should fail");
        assert!(matches!(
            err,
            ConfigError::ParseEnv { name: "ARKIVA_BATCH_SIZE", .. }
        ));
    }

    #[test]
    fn unset_variables_report_the_missing_name() {
        let err = require_env("ARKIVA_TEST_NEVER_SET").expect_err("variable is unset");
        assert!(matches!(
            err,
            ConfigError::MissingEnv { name: "ARKIVA_TEST_NEVER_SET" }
        ));
    }
}
