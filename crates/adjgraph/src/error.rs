//! Error types for adjgraph operations.
//!
//! All fallible operations return [`Result<T>`] with context-rich error messages.
//! Only [`GraphError::Conflict`] is worth retrying; everything else is final
//! for the operation that produced it.

use thiserror::Error;

/// Result type alias for adjgraph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Error type for all graph store operations.
#[derive(Error, Debug)]
pub enum GraphError {
    /// The source node has no adjacency record.
    #[error("Node not found: {node_id}")]
    NotFound {
        /// Lossy UTF-8 rendering of the missing node identifier
        node_id: String,
    },

    /// Commit failed because a concurrent transaction touched the same keys.
    #[error("Transaction conflict: {message}")]
    Conflict {
        /// Engine-specific description of the conflict
        message: String,
    },

    /// Storage engine error (RocksDB, file I/O, etc.)
    #[error("Storage error: {message}")]
    Storage {
        /// Detailed error message
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid operation (e.g., writing through a read-only transaction)
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of what went wrong
        message: String,
    },

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// Error details
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl GraphError {
    /// Create a storage error from a message and optional source.
    pub fn storage<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Create a configuration error from a message and optional source.
    pub fn config<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Create a not-found error for the given node identifier.
    pub fn not_found(node_id: &[u8]) -> Self {
        Self::NotFound {
            node_id: String::from_utf8_lossy(node_id).into_owned(),
        }
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Returns `true` if retrying the whole transaction may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` if this is a missing adjacency record.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
