//! Module for client-wide services.
//!
//! This module holds the request pipeline every domain service sends
//! through, and the aggregation applied to raw election votes.

pub mod api_client;
pub mod results;

pub use api_client::ApiClient;
pub use results::ElectionResults;
