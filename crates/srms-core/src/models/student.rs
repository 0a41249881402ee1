use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Grade;

/// Highest mark a subject can carry.
pub const MAX_MARK: i64 = 100;

/// Minimum name length, counted after trimming.
pub const MIN_NAME_LENGTH: usize = 2;

/// Display names of the three fixed subjects, in field order.
pub const SUBJECT_NAMES: [&str; 3] = ["Mathematics", "Science", "English"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a valid roll number")]
    InvalidRollNumber,

    #[error("Please enter a valid name (at least 2 characters)")]
    InvalidName,

    #[error("Marks should be between 0 and 100")]
    InvalidMarks,
}

/// Unchecked form input. Fields are signed so that out-of-range entries
/// survive long enough to be rejected by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentInput {
    pub roll_no: i64,
    pub name: String,
    pub subject1: i64,
    pub subject2: i64,
    pub subject3: i64,
}

impl StudentInput {
    pub fn new(roll_no: i64, name: impl Into<String>, marks: [i64; 3]) -> Self {
        Self {
            roll_no,
            name: name.into(),
            subject1: marks[0],
            subject2: marks[1],
            subject3: marks[2],
        }
    }

    /// Build input from raw text fields.
    ///
    /// A roll number that is not an integer is `InvalidRollNumber`; a mark
    /// that is not an integer is `InvalidMarks`. Range checks are left to
    /// [`validate`].
    pub fn parse(roll_no: &str, name: &str, marks: [&str; 3]) -> Result<Self, ValidationError> {
        let roll_no = roll_no
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidRollNumber)?;

        let mut parsed = [0i64; 3];
        for (slot, raw) in parsed.iter_mut().zip(marks) {
            *slot = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| ValidationError::InvalidMarks)?;
        }

        Ok(Self::new(roll_no, name, parsed))
    }

    fn marks(&self) -> [i64; 3] {
        [self.subject1, self.subject2, self.subject3]
    }
}

/// Input that passed [`validate`]. Only constructible through validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    roll_no: u32,
    name: String,
    marks: [u8; 3],
}

impl ValidatedInput {
    pub fn roll_no(&self) -> u32 {
        self.roll_no
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn marks(&self) -> [u8; 3] {
        self.marks
    }
}

/// Check raw input. Checks run roll number, name, marks; first failure wins.
pub fn validate(input: &StudentInput) -> Result<ValidatedInput, ValidationError> {
    let roll_no = u32::try_from(input.roll_no)
        .ok()
        .filter(|&r| r > 0)
        .ok_or(ValidationError::InvalidRollNumber)?;

    let name = input.name.trim();
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(ValidationError::InvalidName);
    }

    let mut marks = [0u8; 3];
    for (slot, mark) in marks.iter_mut().zip(input.marks()) {
        if !(0..=MAX_MARK).contains(&mark) {
            return Err(ValidationError::InvalidMarks);
        }
        *slot = mark as u8;
    }

    Ok(ValidatedInput {
        roll_no,
        name: name.to_string(),
        marks,
    })
}

/// A graded student record.
///
/// Total, percentage and grade are derived from the marks by
/// [`compute_result`]. Records read back from storage go through
/// [`StudentRecord::regrade`] so stale derived fields never survive a load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub roll_no: u32,
    pub name: String,
    pub subject1: u8,
    pub subject2: u8,
    pub subject3: u8,
    pub total: u16,
    pub percentage: f64,
    pub grade: Grade,
    /// Absent for records that came from a store which does not track it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<NaiveDate>,
}

impl StudentRecord {
    pub fn marks(&self) -> [u8; 3] {
        [self.subject1, self.subject2, self.subject3]
    }

    /// Marks paired with their subject names.
    pub fn subject_marks(&self) -> impl Iterator<Item = (&'static str, u8)> {
        SUBJECT_NAMES.into_iter().zip(self.marks())
    }

    /// Re-check identity and marks, then recompute the derived fields.
    /// The creation date is kept.
    pub fn regrade(&self) -> Result<StudentRecord, ValidationError> {
        let input = StudentInput::new(
            i64::from(self.roll_no),
            self.name.clone(),
            self.marks().map(i64::from),
        );
        Ok(derive_record(validate(&input)?, self.date_added))
    }

    /// Whether the derived fields match what the marks produce.
    pub fn is_consistent(&self) -> bool {
        self.regrade().is_ok_and(|fresh| fresh == *self)
    }
}

/// Grade a validated input, stamping it with today's local date.
pub fn compute_result(input: ValidatedInput) -> StudentRecord {
    derive_record(input, Some(Local::now().date_naive()))
}

/// Same as [`compute_result`] with an explicit creation date.
pub fn compute_result_on(input: ValidatedInput, date_added: NaiveDate) -> StudentRecord {
    derive_record(input, Some(date_added))
}

pub(crate) fn derive_record(input: ValidatedInput, date_added: Option<NaiveDate>) -> StudentRecord {
    let [subject1, subject2, subject3] = input.marks;
    let total = u16::from(subject1) + u16::from(subject2) + u16::from(subject3);
    let percentage = round_2_decimals(f64::from(total) / 3.0);

    StudentRecord {
        roll_no: input.roll_no,
        name: input.name,
        subject1,
        subject2,
        subject3,
        total,
        percentage,
        grade: Grade::from_percentage(percentage),
        date_added,
    }
}

/// Round half away from zero to 2 decimal places.
fn round_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
