//! Reroll — HTTP API library surface.
//!
//! Exposes the route builders, shared state, and error mapping so the
//! integration tests can assemble the exact router the binary serves.

pub mod error;
pub mod routes;
pub mod state;
