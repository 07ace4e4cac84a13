//! Date formatting for records and rendered prompts
//!
//! Every date in the system — property values in task records, substituted
//! placeholder text — uses the same `DD-MM-YYYY` form.

use chrono::NaiveDate;
use thiserror::Error;

/// The one date format used across records and rendering.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// A date string did not match [`DATE_FORMAT`]
#[derive(Debug, Error)]
#[error("invalid date '{input}': expected DD-MM-YYYY")]
pub struct DateParseError {
    /// The string that failed to parse
    pub input: String,
}

/// Format a date as `DD-MM-YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a `DD-MM-YYYY` string back into a date.
pub fn parse_date(input: &str) -> Result<NaiveDate, DateParseError> {
    NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|_| DateParseError {
        input: input.to_string(),
    })
}
