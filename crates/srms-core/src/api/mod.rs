//! Remote student store.
//!
//! `RemoteStore` is the seam the sync coordinator talks to. Every operation
//! reports failure as a sentinel (`false` / `None`) rather than an error, so
//! callers apply one fallback policy. `ApiClient` is the HTTP implementation;
//! `OfflineStore` stands in when the remote is switched off.

pub mod client;
pub mod error;
pub mod store;

pub use client::ApiClient;
pub use error::ApiError;
pub use store::{OfflineStore, RemoteStore};
