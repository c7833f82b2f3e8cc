//! Shared application state.

use std::sync::{Arc, Mutex};

use reroll_core::clock::Clock;
use reroll_core::repository::EventRepository;
use reroll_core::rng::DeterministicRng;
use reroll_engine::application::resolution_gate::ResolutionGate;
use reroll_generation::TurnGenerator;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Wall clock for event timestamps.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// RNG for action-point recovery rolls.
    pub rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    /// The event stream store.
    pub event_repository: Arc<dyn EventRepository>,
    /// The story generator backend.
    pub generator: Arc<dyn TurnGenerator>,
    /// Per-session resolution gate.
    pub gate: Arc<ResolutionGate>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock + Send + Sync>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
        event_repository: Arc<dyn EventRepository>,
        generator: Arc<dyn TurnGenerator>,
    ) -> Self {
        Self {
            clock,
            rng,
            event_repository,
            generator,
            gate: Arc::new(ResolutionGate::new()),
        }
    }
}
