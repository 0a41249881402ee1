use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Letter grade derived from a percentage.
///
/// Variants are declared best-first, so `Grade::APlus < Grade::F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    F,
}

/// Lower bound (inclusive) of each passing grade, evaluated top-down.
const THRESHOLDS: [(f64, Grade); 4] = [
    (90.0, Grade::APlus),
    (75.0, Grade::A),
    (60.0, Grade::B),
    (40.0, Grade::C),
];

impl Grade {
    /// Every grade in display order.
    pub const ALL: [Grade; 5] = [Grade::APlus, Grade::A, Grade::B, Grade::C, Grade::F];

    /// Map a percentage onto the grade scale. First matching threshold wins.
    pub fn from_percentage(percentage: f64) -> Self {
        THRESHOLDS
            .iter()
            .find(|(min, _)| percentage >= *min)
            .map(|(_, grade)| *grade)
            .unwrap_or(Grade::F)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::F => "F",
        }
    }

    /// Anything above F counts as a pass.
    pub fn is_passing(&self) -> bool {
        !matches!(self, Grade::F)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown grade: {0}")]
pub struct ParseGradeError(String);

impl FromStr for Grade {
    type Err = ParseGradeError;

    /// Case-insensitive; accepts "A+" as well as "A-plus" / "aplus".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "");
        match normalized.as_str() {
            "A+" | "APLUS" => Ok(Grade::APlus),
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            "F" => Ok(Grade::F),
            _ => Err(ParseGradeError(s.to_string())),
        }
    }
}
