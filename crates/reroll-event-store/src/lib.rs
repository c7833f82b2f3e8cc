//! In-memory implementation of the `EventRepository` trait.
//!
//! Session state is process-local by design: runs are discarded on
//! restart, so event streams live in a mutex-guarded map rather than a
//! database.

pub mod memory_event_repository;

pub use memory_event_repository::MemoryEventRepository;
