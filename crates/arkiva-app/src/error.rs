//! # Design
//!
//! - Centralize application-level errors for bootstrap and orchestration.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: arkiva_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: arkiva_telemetry::TelemetryError,
    },
    /// Connecting to or migrating the metadata database failed.
    #[error("metadata database unavailable")]
    Database {
        /// Operation identifier.
        operation: &'static str,
        /// Source database error.
        source: sqlx::Error,
    },
    /// Metadata store operations failed.
    #[error("metadata store operation failed")]
    Store {
        /// Operation identifier.
        operation: &'static str,
        /// Source store error.
        source: arkiva_store::StoreError,
    },
    /// Pipeline execution failed.
    #[error("pipeline operation failed")]
    Pipeline {
        /// Operation identifier.
        operation: &'static str,
        /// Source pipeline error.
        source: arkiva_pipeline::PipelineError,
    },
    /// Joining the pipeline runner task failed.
    #[error("pipeline runner task failed")]
    Join {
        /// Operation identifier.
        operation: &'static str,
        /// Source join error.
        source: tokio::task::JoinError,
    },
}

impl AppError {
    /// Wrap a configuration error with an operation tag.
    #[must_use]
    pub const fn config(operation: &'static str, source: arkiva_config::ConfigError) -> Self {
        Self::Config { operation, source }
    }

    /// Wrap a telemetry error with an operation tag.
    #[must_use]
    pub const fn telemetry(
        operation: &'static str,
        source: arkiva_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    /// Wrap a database error with an operation tag.
    #[must_use]
    pub const fn database(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Database { operation, source }
    }

    /// Wrap a store error with an operation tag.
    #[must_use]
    pub const fn store(operation: &'static str, source: arkiva_store::StoreError) -> Self {
        Self::Store { operation, source }
    }

    /// Wrap a pipeline error with an operation tag.
    #[must_use]
    pub const fn pipeline(operation: &'static str, source: arkiva_pipeline::PipelineError) -> Self {
        Self::Pipeline { operation, source }
    }

    /// Wrap a join error with an operation tag.
    #[must_use]
    pub const fn join(operation: &'static str, source: tokio::task::JoinError) -> Self {
        Self::Join { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_render_constant_messages() {
        let config = AppError::config(
            "settings.from_env",
            arkiva_config::ConfigError::MissingEnv {
                name: "DATABASE_URL",
            },
        );
        assert_eq!(config.to_string(), "configuration operation failed");
        assert!(matches!(
            config,
            AppError::Config {
                operation: "settings.from_env",
                ..
            }
        ));

        let store = AppError::store(
            "store.new",
            arkiva_store::StoreError::FolderExists {
                full_path: "/base".to_string(),
            },
        );
        assert_eq!(store.to_string(), "metadata store operation failed");
    }
}
