//! Data models for student results.
//!
//! - `StudentInput` / `ValidatedInput`: raw form input and its checked form
//! - `StudentRecord`: the canonical graded record
//! - `Grade`: the A+..F scale derived from a percentage
//! - `Roster`: the ordered collection persisted as a unit

pub mod grade;
pub mod roster;
pub mod student;

pub use grade::Grade;
pub use roster::Roster;
pub use student::{
    compute_result, compute_result_on, validate, StudentInput, StudentRecord, ValidatedInput,
    ValidationError, MAX_MARK, MIN_NAME_LENGTH, SUBJECT_NAMES,
};
