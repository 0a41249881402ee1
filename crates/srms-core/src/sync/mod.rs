//! Roster synchronization between the remote store and the local cache.
//!
//! `SyncCoordinator` owns the in-memory roster mirror and applies one policy
//! everywhere: try the remote store, fall back to local state, and report
//! which of the two answered.

pub mod coordinator;

pub use coordinator::{AddStudentError, Source, StorageOutcome, SyncCoordinator};
