use chrono::NaiveDate;

/// Highest possible total across the three subjects.
const MAX_TOTAL: u16 = 300;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Percentage without trailing zeros: `95%`, `83.33%`, `0.5%`.
pub fn format_percentage(percentage: f64) -> String {
    format!("{}%", percentage)
}

/// Total marks out of the maximum, e.g. `250/300`.
pub fn format_total(total: u16) -> String {
    format!("{}/{}", total, MAX_TOTAL)
}

/// Format a record date, `-` when unknown
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%b %d, %Y").to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Ñandú Ñandú", 6), "Ñan...");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(95.0), "95%");
        assert_eq!(format_percentage(83.33), "83.33%");
        assert_eq!(format_percentage(0.0), "0%");
    }

    #[test]
    fn test_format_total() {
        assert_eq!(format_total(250), "250/300");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2024, 3, 7)), "Mar 07, 2024");
        assert_eq!(format_date(None), "-");
    }
}
