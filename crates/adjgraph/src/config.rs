//! Store configuration.

use crate::error::{GraphError, Result};
use crate::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for opening a [`GraphStore`](crate::GraphStore).
///
/// Can be built in code or loaded from JSON:
///
/// ```
/// use adjgraph::StoreConfig;
///
/// let config = StoreConfig::from_json_str(r#"{ "in_memory": true, "max_attempts": 3 }"#).unwrap();
/// assert!(config.in_memory);
/// assert_eq!(config.retry_policy().max_attempts, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory of the persistent database. Ignored when `in_memory` is set.
    pub path: Option<PathBuf>,

    /// Keep all data in memory; nothing survives the store.
    pub in_memory: bool,

    /// Attempts made by [`GraphStore::update`](crate::GraphStore::update) before
    /// a conflict is returned to the caller.
    pub max_attempts: u32,

    /// Create the database directory if it does not exist.
    pub create_if_missing: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            in_memory: false,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            create_if_missing: true,
        }
    }
}

impl StoreConfig {
    /// Config for an ephemeral in-memory store.
    pub fn in_memory() -> Self {
        Self {
            in_memory: true,
            ..Default::default()
        }
    }

    /// Config for a persistent store at `path`.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Set the retry budget for [`GraphStore::update`](crate::GraphStore::update).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set whether a missing database directory is created.
    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Retry policy derived from `max_attempts`.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts)
    }

    /// Parse a config from a JSON string. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Config`] if the JSON is malformed.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| GraphError::config("Failed to parse store config", Some(e)))
    }

    /// Load a config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Config`] if the file cannot be read or parsed.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            GraphError::config(
                format!("Failed to read config file {:?}", path.as_ref()),
                Some(e),
            )
        })?;
        Self::from_json_str(&contents)
    }

    /// Check that the config describes an openable store.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Config`] if neither a path nor in-memory mode is set.
    pub fn validate(&self) -> Result<()> {
        if !self.in_memory && self.path.is_none() {
            return Err(GraphError::config(
                "Persistent store requires a path (or set in_memory)",
                None::<std::io::Error>,
            ));
        }
        Ok(())
    }
}
