//! Validation of loaded settings.

use crate::error::{ConfigError, ConfigResult};
use crate::model::Settings;

/// Reject settings that would stall or misdirect a pipeline run.
///
/// # Errors
///
/// Returns an error when a path is empty, a queue or batch knob is zero,
/// or the store connection string is blank.
pub fn validate(settings: &Settings) -> ConfigResult<()> {
    if settings.source_dir.as_os_str().is_empty() {
        return Err(invalid("source_dir", "must not be empty", None));
    }
    if settings.library_root.as_os_str().is_empty() {
        return Err(invalid("library_root", "must not be empty", None));
    }
    if settings.batch_size == 0 {
        return Err(invalid(
            "batch_size",
            "must be at least 1",
            Some(settings.batch_size.to_string()),
        ));
    }
    if settings.queue_capacity == 0 {
        return Err(invalid(
            "queue_capacity",
            "must be at least 1",
            Some(settings.queue_capacity.to_string()),
        ));
    }
    if settings.database_url.trim().is_empty() {
        return Err(invalid("database_url", "must not be blank", None));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: &'static str, value: Option<String>) -> ConfigError {
    ConfigError::InvalidField {
        field,
        reason,
        value,
    }
}
