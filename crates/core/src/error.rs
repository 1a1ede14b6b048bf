//! Error types for the core library

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// A row did not match the schema of its collection
    #[error("Failed to decode {table} row: {message}")]
    Decode { table: String, message: String },

    #[error("No user is signed in")]
    NotAuthenticated,

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a Decode error for the given collection
    pub fn decode(table: &str, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            table: table.to_string(),
            message: message.to_string(),
        }
    }

    /// Whether this error came from an attempt running past its deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
