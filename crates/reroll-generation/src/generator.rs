//! The async turn-generator seam.

use async_trait::async_trait;
use reroll_story::TurnContent;
use thiserror::Error;

use crate::request::TurnRequest;

/// Failures at the generation boundary. All variants are recoverable:
/// the engine rolls back to the pre-call state and the caller may simply
/// re-invoke the same operation.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The request never produced a usable HTTP response.
    #[error("generation request failed: {0}")]
    RequestFailed(String),

    /// The backend answered, but the body was not usable.
    #[error("invalid generation response: {0}")]
    InvalidResponse(String),
}

/// Port for the external content generator.
#[async_trait]
pub trait TurnGenerator: Send + Sync {
    /// Produces the next turn's content for the given career state.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] when the backend is unreachable or its
    /// response cannot be validated against the turn-content schema.
    async fn generate_turn(&self, request: &TurnRequest) -> Result<TurnContent, GenerationError>;
}
