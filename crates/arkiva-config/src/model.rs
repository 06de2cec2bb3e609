//! Typed settings consumed by the relocation pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default number of queued items drained into a single metadata lookup.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default capacity of the bounded file and move queues.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Settings for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Flat staging directory enumerated by the walker.
    pub source_dir: PathBuf,
    /// Base directory under which the destination tree is laid out.
    pub library_root: PathBuf,
    /// Upper bound on the number of items drained per metadata lookup.
    pub batch_size: usize,
    /// Capacity of the bounded file and move queues.
    pub queue_capacity: usize,
    /// Connection string for the metadata store.
    pub database_url: String,
}

impl Settings {
    /// Base folder rendered as a forward-slash path string, the form stored
    /// on folder nodes and document records.
    #[must_use]
    pub fn library_root_str(&self) -> String {
        self.library_root
            .to_string_lossy()
            .trim_end_matches(['/', '\\'])
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_root_str_strips_trailing_separators() {
        let settings = Settings {
            source_dir: PathBuf::from("/staging"),
            library_root: PathBuf::from("/library/base/"),
            batch_size: DEFAULT_BATCH_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            database_url: "postgres://localhost/arkiva".to_string(),
        };
        assert_eq!(settings.library_root_str(), "/library/base");
    }
}
