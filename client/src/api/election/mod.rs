//! Module for elections.
//!
//! This module defines the election records returned by the API, the drafts
//! submitted when creating or editing one, and the service that reaches the
//! election and ballot endpoints.

pub mod models;
pub mod service;

pub use models::*;
pub use service::*;
