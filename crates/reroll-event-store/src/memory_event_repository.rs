//! Process-local `EventRepository` backed by a mutex-guarded map.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use reroll_core::error::DomainError;
use reroll_core::repository::{EventRepository, StoredEvent};

/// Memory-backed event repository with optimistic concurrency.
#[derive(Debug, Default)]
pub struct MemoryEventRepository {
    streams: Mutex<HashMap<Uuid, Vec<StoredEvent>>>,
}

impl MemoryEventRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for MemoryEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let streams = self
            .streams
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("event store lock poisoned: {e}")))?;
        Ok(streams.get(&aggregate_id).cloned().unwrap_or_default())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        let mut streams = self
            .streams
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("event store lock poisoned: {e}")))?;
        let stream = streams.entry(aggregate_id).or_default();

        let actual = i64::try_from(stream.len())
            .map_err(|e| DomainError::Infrastructure(format!("stream length overflow: {e}")))?;
        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                session_id: aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        stream.extend_from_slice(events);
        Ok(())
    }
}
