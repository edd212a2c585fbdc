//! Core `adapters` crate for abstracting the I/O edges of the ballotbox client.
//!
//! This crate defines the `HttpTransport` trait, which outlines how a request
//! reaches the voting platform's REST API, and the `KeyValueStore` trait, which
//! outlines where the client keeps its persisted cache. It provides concrete
//! implementations of both (reqwest, file system, memory) plus a scripted
//! transport for tests.

pub mod errors;
pub mod http;
pub mod mock;
pub mod models;
pub mod store;

use async_trait::async_trait;

pub use errors::AdapterError;
pub use http::ReqwestTransport;
pub use mock::MockTransport;
pub use models::{ApiRequest, ApiResponse, FilePart, Method, MultipartForm, RequestBody};
pub use store::{FileStore, MemoryStore};

/// Sends a single request and hands back whatever the server answered.
///
/// Implementations must not interpret the status code: a 401 or a 500 is a
/// successful exchange at this layer. `AdapterError::Transport` is reserved
/// for the case where no response was received at all.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, AdapterError>;

    /// Returns the transport name for logging.
    fn name(&self) -> &'static str;
}

/// String-keyed persisted storage, in the spirit of a browser's local storage.
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when the key has never been written or was removed.
    fn get(&self, key: &str) -> Result<Option<String>, AdapterError>;

    fn set(&self, key: &str, value: &str) -> Result<(), AdapterError>;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), AdapterError>;
}
