//! Dashboard and analytics figures over a roster.

use serde::Serialize;

use crate::models::{Grade, Roster};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterSummary {
    pub total_students: usize,
    /// Students graded A+.
    pub top_performers: usize,
    /// Students graded F.
    pub failed: usize,
    /// Mean percentage, 1 decimal. Zero for an empty roster.
    pub average_percentage: f64,
    pub highest_percentage: Option<f64>,
    pub lowest_percentage: Option<f64>,
    /// Share of non-F students as a percentage, 1 decimal.
    pub pass_rate: Option<f64>,
    /// Count per grade in `Grade::ALL` order, zero counts included.
    pub grade_distribution: Vec<(Grade, usize)>,
}

impl RosterSummary {
    pub fn from_roster(roster: &Roster) -> Self {
        let total_students = roster.len();
        let count = |grade: Grade| roster.iter().filter(|s| s.grade == grade).count();

        let grade_distribution: Vec<(Grade, usize)> =
            Grade::ALL.iter().map(|&g| (g, count(g))).collect();

        let percentages = || roster.iter().map(|s| s.percentage);
        let highest_percentage = percentages().reduce(f64::max);
        let lowest_percentage = percentages().reduce(f64::min);

        let (average_percentage, pass_rate) = if total_students == 0 {
            (0.0, None)
        } else {
            let n = total_students as f64;
            let passing = roster.iter().filter(|s| s.grade.is_passing()).count();
            (
                round_1_decimal(percentages().sum::<f64>() / n),
                Some(round_1_decimal(passing as f64 / n * 100.0)),
            )
        };

        Self {
            total_students,
            top_performers: count(Grade::APlus),
            failed: count(Grade::F),
            average_percentage,
            highest_percentage,
            lowest_percentage,
            pass_rate,
            grade_distribution,
        }
    }

    /// Largest per-grade count, used to scale distribution bars.
    pub fn max_grade_count(&self) -> usize {
        self.grade_distribution
            .iter()
            .map(|(_, n)| *n)
            .max()
            .unwrap_or(0)
    }
}

fn round_1_decimal(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{compute_result_on, validate, StudentInput};
    use chrono::NaiveDate;

    fn roster(marks: &[[i64; 3]]) -> Roster {
        let date = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let records = marks
            .iter()
            .zip(1..)
            .map(|(m, roll)| {
                compute_result_on(validate(&StudentInput::new(roll, "Student", *m)).unwrap(), date)
            })
            .collect();
        Roster::from_records(records)
    }

    #[test]
    fn test_empty_roster_summary() {
        let summary = RosterSummary::from_roster(&Roster::new());
        assert_eq!(summary.total_students, 0);
        assert_eq!(summary.average_percentage, 0.0);
        assert_eq!(summary.highest_percentage, None);
        assert_eq!(summary.lowest_percentage, None);
        assert_eq!(summary.pass_rate, None);
        assert_eq!(summary.grade_distribution.len(), 5);
        assert_eq!(summary.max_grade_count(), 0);
    }

    #[test]
    fn test_summary_figures() {
        // 95.0 A+, 95.0 A+, 50.0 C, 30.0 F
        let summary = RosterSummary::from_roster(&roster(&[
            [95, 95, 95],
            [95, 95, 95],
            [50, 50, 50],
            [30, 30, 30],
        ]));

        assert_eq!(summary.total_students, 4);
        assert_eq!(summary.top_performers, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.average_percentage, 67.5);
        assert_eq!(summary.highest_percentage, Some(95.0));
        assert_eq!(summary.lowest_percentage, Some(30.0));
        assert_eq!(summary.pass_rate, Some(75.0));
        assert_eq!(
            summary.grade_distribution,
            vec![
                (Grade::APlus, 2),
                (Grade::A, 0),
                (Grade::B, 0),
                (Grade::C, 1),
                (Grade::F, 1),
            ]
        );
        assert_eq!(summary.max_grade_count(), 2);
    }

    #[test]
    fn test_pass_rate_rounds_to_one_decimal() {
        // 2 of 3 pass -> 66.666..
        let summary = RosterSummary::from_roster(&roster(&[[50, 50, 50], [60, 60, 60], [0, 0, 0]]));
        assert_eq!(summary.pass_rate, Some(66.7));
    }
}
