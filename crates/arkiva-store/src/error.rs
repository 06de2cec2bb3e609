//! # Design
//!
//! - Structured, constant-message errors with context fields, so callers can
//!   match on the failure kind without parsing strings.
//! - `FolderExists` is a contract, not a defect: concurrent creators race on
//!   the same full path and exactly one wins.

use thiserror::Error;

/// Result alias for metadata-store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by metadata-store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database query failed.
    #[error("metadata store query failed")]
    Query {
        /// Operation tag identifying the failing query.
        operation: &'static str,
        /// Underlying database error.
        #[source]
        source: sqlx::Error,
    },
    /// Applying schema migrations failed.
    #[error("metadata store migration failed")]
    Migrate {
        /// Underlying migration error.
        #[source]
        source: sqlx::migrate::MigrateError,
    },
    /// A folder with the same full path already exists.
    #[error("folder already exists")]
    FolderExists {
        /// Full path that collided.
        full_path: String,
    },
}

pub(crate) fn query_error(operation: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |source| StoreError::Query { operation, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_render_constant_messages() {
        let conflict = StoreError::FolderExists {
            full_path: "/base/a".to_string(),
        };
        assert_eq!(conflict.to_string(), "folder already exists");

        let query = query_error("find_folder")(sqlx::Error::RowNotFound);
        assert_eq!(query.to_string(), "metadata store query failed");
        assert!(matches!(
            query,
            StoreError::Query {
                operation: "find_folder",
                ..
            }
        ));
    }
}
