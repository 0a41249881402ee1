//! Utility functions for string formatting.

pub mod format;

pub use format::{format_date, format_percentage, format_total, truncate_string};
