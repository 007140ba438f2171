use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// Caller-facing date format (`MM/DD/YYYY`).
pub const INPUT_DATE_FORMAT: &str = "%m/%d/%Y";

const LAST_SECOND_OF_DAY: i64 = 24 * 3600 - 1;

/// Closed `[00:00:00, 23:59:59]` interval over one calendar day.
///
/// Timestamps are naive: the store keeps local wall-clock values, so no timezone conversion
/// happens here. A sub-second timestamp after 23:59:59 falls outside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateWindow {
    pub fn for_date(date: NaiveDate) -> Self {
        let start = date.and_time(NaiveTime::MIN);
        let end = start + Duration::seconds(LAST_SECOND_OF_DAY);
        Self { date, start, end }
    }

    /// Parses `input` exactly as given. Surrounding whitespace is rejected, not trimmed.
    pub fn parse(input: &str) -> Result<Self, DateFormatError> {
        let reject = |detail: String| DateFormatError {
            input: input.to_string(),
            detail,
        };

        // chrono skips leading spaces before numeric fields, so check explicitly.
        if input.trim() != input {
            return Err(reject("surrounding whitespace".to_string()));
        }

        let date = NaiveDate::parse_from_str(input, INPUT_DATE_FORMAT)
            .map_err(|err| reject(err.to_string()))?;
        Ok(Self::for_date(date))
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts <= self.end
    }
}

#[derive(Debug, Clone)]
pub struct DateFormatError {
    pub input: String,
    pub detail: String,
}

impl fmt::Display for DateFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid date {:?} (expected MM/DD/YYYY): {}",
            self.input, self.detail
        )
    }
}

impl std::error::Error for DateFormatError {}
