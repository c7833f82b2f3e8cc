//! The per-session resolution gate.
//!
//! At most one content-generation call may be in flight per session, and
//! every mutating operation is suspended while one is. A second
//! invocation is rejected, never queued.

use std::collections::HashSet;
use std::sync::Mutex;

use reroll_core::error::DomainError;
use uuid::Uuid;

/// Tracks which sessions currently have a generation call in flight.
#[derive(Debug, Default)]
pub struct ResolutionGate {
    in_flight: Mutex<HashSet<Uuid>>,
}

impl ResolutionGate {
    /// Creates an idle gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a session as resolving. The returned guard releases the
    /// session when dropped.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ResolutionInFlight` when the session is
    /// already resolving.
    pub fn begin(&self, session_id: Uuid) -> Result<ResolutionGuard<'_>, DomainError> {
        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("gate lock poisoned: {e}")))?;
        if !in_flight.insert(session_id) {
            return Err(DomainError::ResolutionInFlight(session_id));
        }
        Ok(ResolutionGuard {
            gate: self,
            session_id,
        })
    }

    /// Verifies that no generation call is in flight for the session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ResolutionInFlight` when one is.
    pub fn ensure_idle(&self, session_id: Uuid) -> Result<(), DomainError> {
        let in_flight = self
            .in_flight
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("gate lock poisoned: {e}")))?;
        if in_flight.contains(&session_id) {
            return Err(DomainError::ResolutionInFlight(session_id));
        }
        Ok(())
    }
}

/// Releases a session's in-flight marker on drop.
#[derive(Debug)]
pub struct ResolutionGuard<'a> {
    gate: &'a ResolutionGate,
    session_id: Uuid,
}

impl Drop for ResolutionGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.gate.in_flight.lock() {
            in_flight.remove(&self.session_id);
        }
    }
}
