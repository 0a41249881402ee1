use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, OfflineStore, RemoteStore};
use crate::cache::{CacheManager, PersistenceError};
use crate::config::Config;
use crate::models::{compute_result, validate, Grade, Roster, StudentInput, StudentRecord, ValidationError};
use crate::stats::RosterSummary;

/// Where a newly added record ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOutcome {
    /// Accepted by the remote store and cached locally.
    Remote,
    /// Cached locally only; lost if the cache is lost.
    LocalOnly,
}

/// Which side answered a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Remote,
    Local,
}

#[derive(Error, Debug)]
pub enum AddStudentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Roll number {0} already exists")]
    DuplicateRollNumber(u32),

    #[error("Student could not be saved locally: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Owns the roster mirror and reconciles it with the remote store and cache.
///
/// Operations take `&mut self` where they touch the mirror, so mutations are
/// serialized by the borrow checker. Wrap in `tokio::sync::Mutex` to share.
pub struct SyncCoordinator {
    remote: Box<dyn RemoteStore>,
    cache: CacheManager,
    roster: Roster,
    remote_timeout: Duration,
}

/// Default bound on a single remote call.
const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(15);

impl SyncCoordinator {
    /// Create a coordinator whose mirror starts from the cached roster.
    pub fn new(remote: Box<dyn RemoteStore>, cache: CacheManager) -> Self {
        let roster = cache.load();
        info!(count = roster.len(), "Roster mirror initialized from cache");
        Self {
            remote,
            cache,
            roster,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    /// Build the remote client and cache described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = CacheManager::new(config.cache_dir()?)?;
        let remote: Box<dyn RemoteStore> = if config.offline_mode {
            info!("Offline mode, remote store disabled");
            Box::new(OfflineStore)
        } else {
            Box::new(ApiClient::new(&config.api_base_url, config.request_timeout())?)
        };
        Ok(Self::new(remote, cache).with_remote_timeout(config.remote_timeout()))
    }

    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// The current roster mirror.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn summary(&self) -> RosterSummary {
        RosterSummary::from_roster(&self.roster)
    }

    /// Run a remote call under the coordinator's timeout. Expiry is a miss.
    async fn bounded<T>(&self, op: &'static str, call: impl Future<Output = T>) -> Option<T> {
        match tokio::time::timeout(self.remote_timeout, call).await {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(op, timeout_ms = self.remote_timeout.as_millis() as u64, "Remote store timed out");
                None
            }
        }
    }

    /// Validate, grade and store a new student.
    ///
    /// The record is kept locally whether or not the remote store accepts it;
    /// the outcome says which happened. A failed local save undoes the append.
    pub async fn add_student(
        &mut self,
        input: &StudentInput,
    ) -> Result<(StudentRecord, StorageOutcome), AddStudentError> {
        let validated = validate(input)?;

        if self.roster.contains(validated.roll_no()) {
            return Err(AddStudentError::DuplicateRollNumber(validated.roll_no()));
        }

        let record = compute_result(validated);

        let accepted = self
            .bounded("create", self.remote.create(&record))
            .await
            .unwrap_or(false);
        let outcome = if accepted {
            StorageOutcome::Remote
        } else {
            StorageOutcome::LocalOnly
        };

        if self.roster.insert(record.clone()).is_err() {
            return Err(AddStudentError::DuplicateRollNumber(record.roll_no));
        }
        if let Err(e) = self.cache.save(&self.roster) {
            self.roster.pop();
            return Err(e.into());
        }

        info!(roll_no = record.roll_no, grade = %record.grade, ?outcome, "Student added");
        Ok((record, outcome))
    }

    /// Look a student up, preferring the remote store over the mirror.
    pub async fn search_by_roll(&self, roll_no: u32) -> Option<(StudentRecord, Source)> {
        if let Some(record) = self
            .bounded("fetch_by_id", self.remote.fetch_by_id(roll_no))
            .await
            .flatten()
        {
            return Some((record, Source::Remote));
        }

        debug!(roll_no, "Falling back to local roster for search");
        self.roster
            .find(roll_no)
            .cloned()
            .map(|record| (record, Source::Local))
    }

    /// Refresh the mirror from the remote store.
    ///
    /// A non-empty remote roster replaces the mirror and is cached. An empty
    /// or failed fetch leaves the mirror as it was.
    pub async fn list_all(&mut self) -> (&Roster, Source) {
        let fetched = self
            .bounded("fetch_all", self.remote.fetch_all())
            .await
            .flatten();

        match fetched {
            Some(remote) if !remote.is_empty() => {
                self.roster = Roster::from_records(remote.into_iter().collect());
                if let Err(e) = self.cache.save(&self.roster) {
                    warn!(error = %e, "Failed to cache remote roster");
                }
                info!(count = self.roster.len(), "Roster replaced from remote store");
                (&self.roster, Source::Remote)
            }
            Some(_) => {
                debug!("Remote store returned no students, keeping local roster");
                (&self.roster, Source::Local)
            }
            None => (&self.roster, Source::Local),
        }
    }

    /// Records in `roster` with the given grade. No fetch.
    pub fn filter_by_grade(roster: &Roster, grade: Grade) -> Roster {
        roster.filter_by_grade(grade)
    }
}
