//! Module for user profiles and a user's voting history.

pub mod models;
pub mod service;

pub use models::*;
pub use service::*;
