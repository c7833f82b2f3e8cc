//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A session was not found.
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on session {session_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The session that had the conflict.
        session_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// A content-generation call is already in flight for the session.
    #[error("a turn is already resolving for session {0}")]
    ResolutionInFlight(Uuid),

    /// The content-generation backend failed. Recoverable: no session
    /// state is mutated when this is returned.
    #[error("generation error: {0}")]
    Generation(String),

    /// An infrastructure error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
