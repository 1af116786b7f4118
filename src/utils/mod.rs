//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;

use chrono::NaiveDate;

use self::error::ParseError;

/// Date format used by the booking API
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO 8601 calendar date (`YYYY-MM-DD`)
pub fn parse_date(value: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|source| {
        ParseError::InvalidDate {
            value: value.to_string(),
            source,
        }
    })
}

/// Format a calendar date as `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Join numeric identifiers with a separator (`[1, 2, 3]` -> `"1-2-3"`)
pub fn join_ids(ids: &[u64], separator: &str) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}
