//! Reroll — content-generation boundary.
//!
//! The turn generator is an external collaborator: given the accumulated
//! career so far, it produces the next turn's story template, option
//! words, and effects. This crate defines the request/response contract,
//! the async [`TurnGenerator`] seam, and a Gemini REST implementation.

pub mod gemini;
pub mod generator;
pub mod prompt;
pub mod request;

pub use gemini::GeminiClient;
pub use generator::{GenerationError, TurnGenerator};
pub use request::{LifeStage, Semester, TurnRequest};
