//! Test generators — deterministic `TurnGenerator` implementations.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reroll_generation::{GenerationError, TurnGenerator, TurnRequest};
use reroll_story::TurnContent;

/// A generator that replays a scripted sequence of outcomes and records
/// every request it receives. Panics when the script is exhausted.
#[derive(Debug)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<TurnContent, String>>>,
    requests: Mutex<Vec<TurnRequest>>,
}

impl ScriptedGenerator {
    /// Creates a generator that yields the given outcomes in order; an
    /// `Err(message)` entry becomes a `GenerationError::RequestFailed`.
    #[must_use]
    pub fn new(script: Vec<Result<TurnContent, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a generator that yields the given contents in order.
    #[must_use]
    pub fn with_contents(contents: Vec<TurnContent>) -> Self {
        Self::new(contents.into_iter().map(Ok).collect())
    }

    /// Returns a snapshot of every request received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<TurnRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TurnGenerator for ScriptedGenerator {
    async fn generate_turn(&self, request: &TurnRequest) -> Result<TurnContent, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedGenerator script exhausted");
        outcome.map_err(GenerationError::RequestFailed)
    }
}

/// A generator that always fails with a transport error.
#[derive(Debug)]
pub struct FailingGenerator;

#[async_trait]
impl TurnGenerator for FailingGenerator {
    async fn generate_turn(&self, _request: &TurnRequest) -> Result<TurnContent, GenerationError> {
        Err(GenerationError::RequestFailed(
            "generator unreachable".to_owned(),
        ))
    }
}
