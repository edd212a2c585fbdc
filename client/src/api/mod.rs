//! Central module for the application's domain endpoints.
//!
//! This module acts as a top-level container for the API domains the client
//! talks to: elections, generic votes, and user profiles. Authentication
//! endpoints live in `crate::auth`.

pub mod election;
pub mod user;
pub mod vote;
