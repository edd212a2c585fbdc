//! Global client error types.
//!
//! Every failure the client can surface is translated into one `ApiError`
//! carrying a human-readable message, whatever layer it came from. Services
//! propagate it unchanged, except for the lookups that treat a 404 as an
//! absent value.

use ballotbox_adapters::{AdapterError, ApiResponse};
use serde_json::Value;
use thiserror::Error;

pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

pub const AUTHENTICATION_FALLBACK_MESSAGE: &str = "Authentication failed";

/// Body fields that may carry a server-side error message, in priority order.
const MESSAGE_FIELDS: [&str; 3] = ["message", "error", "detail"];

pub type ApiResult<T> = Result<T, ApiError>;

/// Uniform error shape of the client.
///
/// `Clone` so that the outcome of a single session refresh can be handed to
/// every request that waited for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// A 401 on login/registration/refresh, or a 401 after the one retry.
    #[error("{message}")]
    Authentication { message: String },

    /// Any other non-2xx response.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// No response was received.
    #[error("{message}")]
    Network { message: String },

    #[error("unexpected response shape: {message}")]
    Decode { message: String },

    #[error("local storage error: {message}")]
    Storage { message: String },

    /// A client-side rule rejected the operation before anything was sent.
    #[error("{message}")]
    Validation { message: String },
}

impl ApiError {
    pub fn authentication(message: impl Into<String>) -> Self {
        ApiError::Authentication {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
        }
    }

    pub fn network() -> Self {
        ApiError::Network {
            message: NETWORK_ERROR_MESSAGE.to_string(),
        }
    }

    /// Authentication error for a 401 response.
    pub fn unauthenticated(response: &ApiResponse) -> Self {
        Self::authentication(
            extract_message(&response.body)
                .unwrap_or_else(|| AUTHENTICATION_FALLBACK_MESSAGE.to_string()),
        )
    }

    /// HTTP error for any other non-2xx response.
    pub fn from_response(response: &ApiResponse) -> Self {
        ApiError::Http {
            status: response.status,
            message: extract_message(&response.body)
                .unwrap_or_else(|| format!("HTTP error! status: {}", response.status)),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Authentication { message }
            | ApiError::Http { message, .. }
            | ApiError::Network { message }
            | ApiError::Decode { message }
            | ApiError::Storage { message }
            | ApiError::Validation { message } => message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Pulls a human-readable message out of an error response body.
pub fn extract_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let object = value.as_object()?;
    MESSAGE_FIELDS.iter().find_map(|field| {
        object
            .get(*field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
    })
}

impl From<AdapterError> for ApiError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Transport(reason) => {
                tracing::debug!("transport failure: {}", reason);
                ApiError::network()
            }
            AdapterError::Request(message) => ApiError::Validation { message },
            AdapterError::Storage(message) => ApiError::Storage { message },
            AdapterError::Serialization(err) => ApiError::Decode {
                message: err.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode {
            message: err.to_string(),
        }
    }
}
