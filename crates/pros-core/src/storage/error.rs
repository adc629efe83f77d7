use thiserror::Error;

use crate::catalogue::{ModelManagerError, RecordError};

/// Errors that can occur while talking to a graph store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Database returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The database rejected the statement.
    #[error("Database error {code}: {message}")]
    Database { code: String, message: String },

    /// The response body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// A record failed validation before being stored.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// The catalogue has no entry for the requested type.
    #[error(transparent)]
    Lookup(#[from] ModelManagerError),

    /// No stored node carries this identifier.
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// A node with this identifier is already stored.
    #[error("Duplicate node identifier: {0}")]
    DuplicateUid(String),

    /// The driver cannot run this operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// A lock guarding in-memory state was poisoned.
    #[error("Graph state lock poisoned")]
    Poisoned,
}
