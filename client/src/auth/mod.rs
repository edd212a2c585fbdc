//! Authentication module for signing users in and keeping their session alive.
//!
//! This module provides the public interface for authentication-related
//! functionality: the auth endpoints, the session state every view reads
//! from, and the coordinator that keeps concurrent session refreshes down to
//! one.

pub mod middleware;
pub mod models;
pub mod service;
pub mod session;

// Re-exports for convenience
pub use middleware::*;
pub use models::*;
pub use service::*;
pub use session::*;
