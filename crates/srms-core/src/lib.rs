//! Core library for the student result management system.
//!
//! Turns raw subject marks into graded student records, keeps the roster in a
//! local cache, and mirrors it to a remote store that may be unreachable.
//!
//! - [`models`]: `StudentRecord`, `Grade`, `Roster` and the grading rules
//! - [`cache`]: the on-disk roster slot
//! - [`api`]: the remote store seam and its HTTP client
//! - [`sync`]: `SyncCoordinator`, the try-remote-else-local policy
//! - [`stats`]: dashboard and analytics figures over a roster

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod stats;
pub mod sync;
pub mod utils;

pub use api::{ApiClient, OfflineStore, RemoteStore};
pub use cache::{CacheManager, PersistenceError};
pub use config::Config;
pub use models::{
    compute_result, validate, Grade, Roster, StudentInput, StudentRecord, ValidatedInput,
    ValidationError,
};
pub use stats::RosterSummary;
pub use sync::{AddStudentError, Source, StorageOutcome, SyncCoordinator};
