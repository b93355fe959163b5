//! Runtime configuration.
//!
//! The tool has no flags or config file; this is the single place the fixed
//! defaults live before being handed to the store and the logger.

use std::path::PathBuf;

/// Task file name, resolved against the working directory.
pub const DEFAULT_DATA_FILE: &str = "tasks.json";

/// Log filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_file: PathBuf,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}
