use async_trait::async_trait;
use tracing::debug;

use crate::models::{Roster, StudentRecord};

/// A remote collection of student records.
///
/// Implementations never fail past this boundary: an unreachable store, a
/// rejected write and a missing record all collapse to `false` / `None`.
/// A caller cannot tell "not found" from "unreachable".
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Push a new record. Returns whether the store accepted it.
    async fn create(&self, record: &StudentRecord) -> bool;

    /// Fetch one record by roll number.
    async fn fetch_by_id(&self, roll_no: u32) -> Option<StudentRecord>;

    /// Fetch the whole roster.
    async fn fetch_all(&self) -> Option<Roster>;
}

/// Remote store used in offline mode. Every call fails immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineStore;

#[async_trait]
impl RemoteStore for OfflineStore {
    async fn create(&self, record: &StudentRecord) -> bool {
        debug!(roll_no = record.roll_no, "Offline mode, not pushing record");
        false
    }

    async fn fetch_by_id(&self, _roll_no: u32) -> Option<StudentRecord> {
        None
    }

    async fn fetch_all(&self) -> Option<Roster> {
        None
    }
}
