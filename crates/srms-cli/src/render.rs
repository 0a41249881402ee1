//! Plain-text rendering of records, tables and dashboard figures.

use srms_core::utils::{format_date, format_percentage, format_total, truncate_string};
use srms_core::{Roster, RosterSummary, StudentRecord};

/// Name column width in the roster table.
const NAME_WIDTH: usize = 20;

/// Width of the longest bar in the grade distribution chart.
const BAR_WIDTH: usize = 30;

/// Kind of status message, mirrors success / warning / error banners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Warning,
    Error,
}

pub fn message(kind: MessageKind, text: &str) {
    match kind {
        MessageKind::Success => println!("[ok] {}", text),
        MessageKind::Warning => println!("[warn] {}", text),
        MessageKind::Error => eprintln!("[error] {}", text),
    }
}

pub fn student_card(student: &StudentRecord) -> String {
    let mut lines = vec![
        "Student Details".to_string(),
        format!("  {:<14}{}", "Roll Number:", student.roll_no),
        format!("  {:<14}{}", "Name:", student.name),
    ];
    for (subject, mark) in student.subject_marks() {
        lines.push(format!("  {:<14}{}", format!("{}:", subject), mark));
    }
    lines.push(format!("  {:<14}{}", "Total Marks:", format_total(student.total)));
    lines.push(format!("  {:<14}{}", "Percentage:", format_percentage(student.percentage)));
    lines.push(format!("  {:<14}{}", "Grade:", student.grade));
    lines.push(format!("  {:<14}{}", "Added:", format_date(student.date_added)));
    lines.join("\n")
}

pub fn roster_table(roster: &Roster) -> String {
    if roster.is_empty() {
        return "No students found".to_string();
    }

    let mut out = format!(
        "{:>6}  {:<width$}  {:>4}  {:>4}  {:>4}  {:>5}  {:>8}  {:<5}\n",
        "Roll",
        "Name",
        "Math",
        "Sci",
        "Eng",
        "Total",
        "Percent",
        "Grade",
        width = NAME_WIDTH
    );
    for s in roster {
        out.push_str(&format!(
            "{:>6}  {:<width$}  {:>4}  {:>4}  {:>4}  {:>5}  {:>8}  {:<5}\n",
            s.roll_no,
            truncate_string(&s.name, NAME_WIDTH),
            s.subject1,
            s.subject2,
            s.subject3,
            s.total,
            format_percentage(s.percentage),
            s.grade.label(),
            width = NAME_WIDTH
        ));
    }
    out
}

pub fn dashboard(summary: &RosterSummary, recent: &[&StudentRecord], cache_age: &str) -> String {
    let mut out = format!(
        "Total Students:   {}\nTop Performers:   {}\nAverage:          {}\nFailed:           {}\nLast saved:       {}\n",
        summary.total_students,
        summary.top_performers,
        format_percentage(summary.average_percentage),
        summary.failed,
        cache_age,
    );

    out.push_str("\nRecent Activity\n");
    if recent.is_empty() {
        out.push_str("  No recent activity\n");
    }
    for s in recent {
        out.push_str(&format!("  {} (Roll: {})  {}\n", s.name, s.roll_no, s.grade));
    }
    out
}

pub fn analytics(summary: &RosterSummary) -> String {
    let or_dash = |v: Option<f64>| v.map(format_percentage).unwrap_or_else(|| "-".to_string());

    let mut out = format!(
        "Highest Score:    {}\nLowest Score:     {}\nPass Rate:        {}\n\nGrade Distribution\n",
        or_dash(summary.highest_percentage),
        or_dash(summary.lowest_percentage),
        or_dash(summary.pass_rate),
    );

    if summary.total_students == 0 {
        out.push_str("  No data available\n");
        return out;
    }

    let max = summary.max_grade_count();
    for (grade, count) in &summary.grade_distribution {
        let len = if max > 0 { count * BAR_WIDTH / max } else { 0 };
        out.push_str(&format!("  {:<3}|{:<bar$}| {}\n", grade.label(), "#".repeat(len), count, bar = BAR_WIDTH));
    }
    out
}
