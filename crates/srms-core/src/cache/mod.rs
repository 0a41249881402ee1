//! Local roster cache for offline access.
//!
//! The whole roster lives in one JSON slot (`srms-students.json`) inside
//! the cache directory and is rewritten atomically on every save. A missing
//! or unreadable slot loads as an empty roster.

pub mod manager;

pub use manager::{CacheAge, CacheManager, PersistenceError, ROSTER_CACHE_KEY};
