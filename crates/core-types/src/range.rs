use crate::error::CoreError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp layouts found in the `"Txn Date"` column, tried in order.
const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// An inclusive calendar date range supplied by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidInput(
                "date range".to_string(),
                format!("start date {start} is after end date {end}"),
            ));
        }
        Ok(Self { start, end })
    }

    /// Builds a range from raw request parameters.
    ///
    /// `start_name` and `end_name` are the parameter names used in error
    /// messages, since the endpoints disagree on them (`start` vs `start_date`).
    pub fn parse(
        start: Option<&str>,
        end: Option<&str>,
        start_name: &str,
        end_name: &str,
    ) -> Result<Self, CoreError> {
        let start = parse_date(start, start_name)?;
        let end = parse_date(end, end_name)?;
        Self::new(start, end)
    }

    /// The lower bound as bound into SQL, compared against `"Txn Date"` text.
    pub fn start_bound(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    /// The exclusive upper bound as bound into SQL: the day after `end`.
    ///
    /// Compared with `<`, this admits every time of day on `end` whether the
    /// column separates date and time with a space or a `T`.
    pub fn end_bound(&self) -> String {
        self.end.succ_opt().unwrap_or(self.end).format(DATE_FORMAT).to_string()
    }
}

fn parse_date(raw: Option<&str>, name: &str) -> Result<NaiveDate, CoreError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::MissingParameter(name.to_string()))?;
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
        CoreError::InvalidInput(name.to_string(), format!("'{raw}' is not a YYYY-MM-DD date"))
    })
}

/// Parses a `"Txn Date"` value. Date-only values resolve to midnight.
pub fn parse_txn_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
