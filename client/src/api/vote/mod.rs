//! Module for the generic vote resource.

pub mod models;
pub mod service;

pub use models::*;
pub use service::*;
