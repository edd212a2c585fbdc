//! Custom error types specific to the `adapters` crate.
//!
//! This module defines errors that can occur while building or sending a
//! request, or while reading and writing the persisted cache, providing a
//! unified error type for every adapter implementation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// No response was received (connection refused, DNS, TLS, reset...).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The request could not be built from the given parts.
    #[error("invalid request: {0}")]
    Request(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<std::io::Error> for AdapterError {
    fn from(err: std::io::Error) -> Self {
        AdapterError::Storage(err.to_string())
    }
}
