//! Sample-date parsing and ISO week extraction.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Configuration for date format handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateFormatConfig {
    /// List of date format strings to try when parsing dates
    pub date_formats: Vec<String>,
    /// Enable heuristic format detection
    pub enable_format_detection: bool,
}

impl Default for DateFormatConfig {
    fn default() -> Self {
        Self {
            date_formats: vec![
                "%Y-%m-%d".to_string(), // ISO format: 2024-01-15
                "%d/%m/%Y".to_string(), // French lab exports: 15/01/2024
                "%d-%m-%Y".to_string(), // 15-01-2024
                "%d.%m.%Y".to_string(), // 15.01.2024
                "%Y/%m/%d".to_string(), // 2024/01/15
                "%Y%m%d".to_string(),   // Compact: 20240115
                "%d %b %Y".to_string(), // 15 Jan 2024
            ],
            enable_format_detection: true,
        }
    }
}

/// Parse a date string with multiple format attempts
///
/// A trailing time of day (`2024-01-15 08:30:00`, `2024-01-15T08:30`) is
/// ignored. Returns `None` when no format matches.
#[must_use]
pub fn parse_date_string(s: &str, config: &DateFormatConfig) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let date_part = s.split(['T', ' ']).next().unwrap_or(s);

    for format in &config.date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
        if date_part != s {
            if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
                return Some(date);
            }
        }
    }

    if config.enable_format_detection {
        if let Some(detected_format) = detect_date_format(date_part) {
            if let Ok(date) = NaiveDate::parse_from_str(date_part, detected_format) {
                return Some(date);
            }
        }
    }

    None
}

/// Try to detect the date format based on string patterns
#[must_use]
pub fn detect_date_format(s: &str) -> Option<&'static str> {
    // YYYY-MM-DD
    if s.len() == 10 && s.chars().nth(4) == Some('-') && s.chars().nth(7) == Some('-') {
        return Some("%Y-%m-%d");
    }

    if s.contains('/') {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() == 3 {
            if parts[0].len() == 4 {
                return Some("%Y/%m/%d");
            } else if parts[2].len() == 4 {
                // Day-first unless the first part cannot be a day
                return Some("%d/%m/%Y");
            } else if parts[2].len() == 2 {
                return Some("%d/%m/%y");
            }
        }
    }

    if s.contains('.') {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() == 3 && parts[2].len() == 4 {
            return Some("%d.%m.%Y");
        }
    }

    if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
        return Some("%Y%m%d");
    }

    None
}

/// ISO 8601 calendar week (1-53) of a date
#[must_use]
pub fn iso_week_of(date: NaiveDate) -> u32 {
    date.iso_week().week()
}
