//! Biblio server library
//!
//! The HTTP API and the background overdue sweep, split from the `biblio`
//! binary so integration tests can mount the router directly.

pub mod api;
pub mod sweep;

pub use api::{router, serve, ApiState};
