use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use super::{Grade, StudentRecord};

/// Ordered collection of student records, keyed by roll number.
///
/// Serializes as a plain JSON array. Display order is insertion order.
/// There is no direct `Deserialize`: stored rosters are read back through
/// [`crate::cache::CacheManager::load`], which regrades every entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Roster(Vec<StudentRecord>);

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from records of unknown provenance. Later records that
    /// repeat a roll number are dropped.
    pub fn from_records(records: Vec<StudentRecord>) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let mut kept = Vec::with_capacity(records.len());

        for record in records {
            if seen.insert(record.roll_no) {
                kept.push(record);
            } else {
                warn!(roll_no = record.roll_no, "Dropping duplicate roll number");
            }
        }

        Self(kept)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StudentRecord> {
        self.0.iter()
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.0
    }

    pub fn find(&self, roll_no: u32) -> Option<&StudentRecord> {
        self.0.iter().find(|s| s.roll_no == roll_no)
    }

    pub fn contains(&self, roll_no: u32) -> bool {
        self.find(roll_no).is_some()
    }

    /// Append a record. Returns the record back if its roll number is taken.
    ///
    /// The record must come from grading; stale derived fields are a bug.
    pub fn insert(&mut self, record: StudentRecord) -> Result<(), StudentRecord> {
        debug_assert!(
            record.is_consistent(),
            "inserted record {} has stale derived fields",
            record.roll_no
        );
        if self.contains(record.roll_no) {
            return Err(record);
        }
        self.0.push(record);
        Ok(())
    }

    /// Remove the most recently appended record.
    pub(crate) fn pop(&mut self) -> Option<StudentRecord> {
        self.0.pop()
    }

    /// Records with the given grade, in roster order.
    pub fn filter_by_grade(&self, grade: Grade) -> Roster {
        Roster(self.0.iter().filter(|s| s.grade == grade).cloned().collect())
    }

    /// The last `n` records added, most recent first.
    pub fn recent(&self, n: usize) -> Vec<&StudentRecord> {
        self.0.iter().rev().take(n).collect()
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a StudentRecord;
    type IntoIter = std::slice::Iter<'a, StudentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Roster {
    type Item = StudentRecord;
    type IntoIter = std::vec::IntoIter<StudentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
