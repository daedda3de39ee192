//! Export period resolution

use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Date format used by the transaction API and in blob names
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Export period as sent to the transaction API
///
/// Values supplied by a caller are kept verbatim. Ordering and format are
/// not checked here; the API rejects what it cannot parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: String,
    end: String,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Single-day range for the day before `today`
    pub fn yesterday(today: NaiveDate) -> Self {
        let day = (today - Duration::days(1)).format(DATE_FORMAT).to_string();
        Self::new(day.clone(), day)
    }

    /// Resolve the range for a request
    ///
    /// Both bounds are used only when both are present and non-empty.
    /// Otherwise both default to yesterday, never a mismatched pair.
    pub fn resolve(start: Option<&str>, end: Option<&str>, today: NaiveDate) -> Self {
        match (start, end) {
            (Some(s), Some(e)) if !s.is_empty() && !e.is_empty() => Self::new(s, e),
            _ => Self::yesterday(today),
        }
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }
}
