//! Shared test mocks and utilities for the Reroll school-life engine.

mod clock;
mod content;
mod generator;
mod repository;
mod rng;

pub use clock::FixedClock;
pub use content::{turn_content, turn_option};
pub use generator::{FailingGenerator, ScriptedGenerator};
pub use repository::{EmptyEventRepository, FailingEventRepository, RecordingEventRepository};
pub use rng::{MockRng, SequenceRng};
