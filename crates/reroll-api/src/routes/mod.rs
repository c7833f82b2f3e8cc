//! HTTP route builders.

pub mod health;
pub mod sessions;
