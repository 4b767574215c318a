use chrono::NaiveDate;

use crate::error::{Result, TallyError};

/// Fixed format used for the ledger CSV.
pub const STORAGE_DATE_FORMAT: &str = "%d/%m/%y";

/// Formats accepted during import, tried in priority order. Bank exports
/// disagree on date conventions, so this is a priority list, not a set.
pub const INPUT_DATE_FORMATS: &[&str] = &[
    "%m/%d/%y", // 01/15/23
    "%m/%d/%Y", // 01/15/2023
    "%Y-%m-%d", // 2023-01-15
    "%d/%m/%y", // 15/01/23
    "%d/%m/%Y", // 15/01/2023
];

/// Try each format in order; first success wins.
pub fn parse_date_multi(raw: &str, formats: &[&str]) -> Result<NaiveDate> {
    let raw = raw.trim();
    for format in formats {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    Err(TallyError::DateFormat(raw.to_string()))
}

pub fn parse_input_date(raw: &str) -> Result<NaiveDate> {
    parse_date_multi(raw, INPUT_DATE_FORMATS)
}

pub fn parse_storage_date(raw: &str) -> Result<NaiveDate> {
    parse_date_multi(raw, &[STORAGE_DATE_FORMAT])
}

pub fn format_storage_date(date: NaiveDate) -> String {
    date.format(STORAGE_DATE_FORMAT).to_string()
}
