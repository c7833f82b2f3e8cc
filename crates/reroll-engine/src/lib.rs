//! Reroll — Turn Engine bounded context.
//!
//! Responsible for the session state machine: allocation, slot
//! assignment, turn advancement, action-point accounting, and the
//! generation boundary handshake.

pub mod application;
pub mod domain;
