use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Roster, StudentRecord};

/// Name of the single slot holding the serialized roster.
pub const ROSTER_CACHE_KEY: &str = "srms-students";

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to write roster cache {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize roster: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// When the roster slot was last written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheAge {
    pub written_at: DateTime<Utc>,
}

impl CacheAge {
    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.written_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Includes negative ages from clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// Parse one stored entry and recompute its derived fields from the marks.
fn regrade_entry(entry: serde_json::Value) -> Result<StudentRecord, String> {
    let record: StudentRecord = serde_json::from_value(entry).map_err(|e| e.to_string())?;
    let fresh = record.regrade().map_err(|e| e.to_string())?;
    if fresh != record {
        warn!(roll_no = record.roll_no, "Cached student had stale grading, recomputed");
    }
    Ok(fresh)
}

pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    pub fn roster_path(&self) -> PathBuf {
        self.cache_path(ROSTER_CACHE_KEY)
    }

    /// Load the persisted roster. Absent or corrupt data yields an empty roster.
    ///
    /// Each entry is regraded from its marks; entries that fail validation
    /// are dropped, and a repeated roll number keeps its first occurrence.
    pub fn load(&self) -> Roster {
        let path = self.roster_path();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No roster cache yet");
                return Roster::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read roster cache");
                return Roster::new();
            }
        };

        let entries = match serde_json::from_str::<Vec<serde_json::Value>>(&contents) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Roster cache is corrupt, ignoring it");
                return Roster::new();
            }
        };

        let stored = entries.len();
        let records: Vec<StudentRecord> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match regrade_entry(entry) {
                Ok(record) => Some(record),
                Err(error) => {
                    warn!(index, %error, "Dropping unreadable student from roster cache");
                    None
                }
            })
            .collect();

        let roster = Roster::from_records(records);
        debug!(stored, count = roster.len(), "Loaded roster from cache");
        roster
    }

    /// Overwrite the persisted roster with `roster`.
    ///
    /// The payload goes to a sibling temp file first and is renamed over the
    /// slot, so readers see either the old roster or the new one.
    pub fn save(&self, roster: &Roster) -> Result<(), PersistenceError> {
        let path = self.roster_path();
        let contents = serde_json::to_string_pretty(roster)?;
        let tmp = path.with_extension("json.tmp");

        let io_err = |source| PersistenceError::Io {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.cache_dir).map_err(io_err)?;
        std::fs::write(&tmp, contents).map_err(io_err)?;
        std::fs::rename(&tmp, &path).map_err(io_err)?;

        debug!(count = roster.len(), "Saved roster to cache");
        Ok(())
    }

    /// Age of the roster slot, if one has been written.
    pub fn age(&self) -> Option<CacheAge> {
        let modified = std::fs::metadata(self.roster_path())
            .and_then(|m| m.modified())
            .ok()?;
        Some(CacheAge {
            written_at: DateTime::<Utc>::from(modified),
        })
    }

    /// Remove the roster slot. Missing slots are not an error.
    pub fn clear(&self) -> Result<(), PersistenceError> {
        let path = self.roster_path();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistenceError::Io { path, source }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{compute_result_on, validate, StudentInput};
    use chrono::{Duration, NaiveDate};
    use tempfile::tempdir;

    fn sample_roster() -> Roster {
        let date = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let records = [(1, "Asha", [95, 91, 99]), (2, "Ben", [40, 41, 39])]
            .into_iter()
            .map(|(roll, name, marks)| {
                compute_result_on(validate(&StudentInput::new(roll, name, marks)).unwrap(), date)
            })
            .collect();
        Roster::from_records(records)
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().join("nested")).unwrap();
        assert!(cache.load().is_empty());
        assert!(cache.age().is_none());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        let roster = sample_roster();

        cache.save(&roster).unwrap();
        assert_eq!(cache.load(), roster);
        assert!(!cache.roster_path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_save_of_load_leaves_slot_unchanged() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        cache.save(&sample_roster()).unwrap();
        let before = std::fs::read_to_string(cache.roster_path()).unwrap();

        cache.save(&cache.load()).unwrap();
        let after = std::fs::read_to_string(cache.roster_path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_corrupt_cache_loads_empty() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(cache.roster_path(), "{not json").unwrap();
        assert!(cache.load().is_empty());
    }

    #[test]
    fn test_load_regrades_and_dedupes_entries() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        let slot = r#"[
            {"rollNo":1,"name":"Lia","subject1":10,"subject2":10,"subject3":10,"total":300,"percentage":100.0,"grade":"A+","dateAdded":"2024-05-20"},
            {"rollNo":1,"name":"Lia Again","subject1":99,"subject2":99,"subject3":99,"total":297,"percentage":99.0,"grade":"A+"},
            {"rollNo":2,"name":"Max","subject1":250,"subject2":0,"subject3":0,"total":250,"percentage":83.33,"grade":"A"},
            {"rollNo":3,"name":"Ned","subject1":101,"subject2":0,"subject3":0,"total":101,"percentage":33.67,"grade":"F"},
            {"rollNo":4,"name":"Ora","subject1":60,"subject2":60,"subject3":60,"total":180,"percentage":60.0,"grade":"B"}
        ]"#;
        std::fs::write(cache.roster_path(), slot).unwrap();

        let roster = cache.load();
        let rolls: Vec<u32> = roster.iter().map(|r| r.roll_no).collect();
        assert_eq!(rolls, vec![1, 4]);

        let lia = roster.find(1).unwrap();
        assert_eq!(lia.name, "Lia");
        assert_eq!(lia.total, 30);
        assert_eq!(lia.percentage, 10.0);
        assert_eq!(lia.grade, crate::models::Grade::F);
        assert_eq!(lia.date_added, NaiveDate::from_ymd_opt(2024, 5, 20));
        assert!(roster.iter().all(StudentRecord::is_consistent));
    }

    #[test]
    fn test_non_array_slot_loads_empty() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(cache.roster_path(), r#"{"rollNo":1}"#).unwrap();
        assert!(cache.load().is_empty());
    }

    #[test]
    fn test_slot_is_plain_array() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        cache.save(&sample_roster()).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("srms-students.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_clear_removes_slot() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        cache.save(&sample_roster()).unwrap();
        assert!(cache.age().is_some());

        cache.clear().unwrap();
        assert!(cache.load().is_empty());
        cache.clear().unwrap();
    }

    #[test]
    fn test_cache_age_display() {
        let at = |minutes| CacheAge {
            written_at: Utc::now() - Duration::minutes(minutes),
        };
        assert_eq!(at(0).age_display(), "just now");
        assert_eq!(at(-5).age_display(), "just now");
        assert_eq!(at(5).age_display(), "5m ago");
        assert_eq!(at(60 + 20).age_display(), "1h ago");
        assert_eq!(at(60 + 40).age_display(), "2h ago");
        assert_eq!(at(1440 + 60).age_display(), "1d ago");
        assert_eq!(at(1440 + 13 * 60).age_display(), "2d ago");
    }
}
